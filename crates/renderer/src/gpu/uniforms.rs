use bytemuck::{Pod, Zeroable};

use crate::scene::FrameUniforms;

/// std140 image of the `WireUniforms` block declared in `compile.rs`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct WireUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub time: f32,
    pub _padding: [f32; 3],
}

impl WireUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn from_frame(frame: &FrameUniforms) -> Self {
        let [r, g, b] = frame.color;
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            model: frame.model.to_cols_array_2d(),
            color: [r, g, b, 1.0],
            time: frame.time,
            _padding: [0.0; 3],
        }
    }
}
