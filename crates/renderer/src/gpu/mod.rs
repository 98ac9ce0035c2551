//! wgpu backend for the wireframe scene.
//!
//! - `context` owns instance/device/surface wiring, picks the surface format
//!   and MSAA sample count, and reconfigures the swapchain on resize.
//! - `pipeline` compiles the GLSL stages into a line-list pipeline with
//!   additive blending.
//! - `uniforms` mirrors the shader's uniform block.
//! - `state` glues everything together as `GpuState`, the `RenderBackend`
//!   used by the window host.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub use state::GpuState;
