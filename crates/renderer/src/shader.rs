use glam::Vec3;

use crate::types::Rgb;

/// Uniform state of the wireframe shader.
///
/// Only `time` changes once the program exists; the base color is fixed at
/// initialisation. [`ShaderProgram::shade`] evaluates the same coloring rule
/// as the fragment stage in `compile.rs`, which keeps the rule testable
/// without a GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderProgram {
    color: Rgb,
    time: f32,
}

impl ShaderProgram {
    pub fn new(color: Rgb) -> Self {
        Self { color, time: 0.0 }
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Color and opacity for a fragment whose interpolated model position is `position`.
    pub fn shade(&self, position: Vec3) -> [f32; 4] {
        let opacity = 0.2 + 0.3 * (position.x * 0.02 + self.time).sin();
        let scale = 0.8 + 0.2 * (position.z * 0.01 + self.time * 0.5).sin();
        [
            self.color.r * scale,
            self.color.g * scale,
            self.color.b * scale,
            opacity,
        ]
    }
}
