//! Animated wireframe wave background.
//!
//! A lattice of points is joined into a line mesh whose heights follow a
//! travelling sine wave. A perspective camera eases toward the pointer and the
//! fragment stage modulates color and opacity over time. The flow is:
//!
//! ```text
//!   CLI / wavegrid
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ Mount ──▶ AnimationDriver::run_frame
//!                           │                 │                │
//!                           │ pointer/resize  ▼                ▼
//!                           └──────────▶ InputController    animation::step ──▶ RenderBackend
//! ```
//!
//! The engine (`grid`, `animation`, `scene`, `input`, `mount`) only talks to
//! the GPU through [`scene::RenderBackend`]; [`GpuState`] is the wgpu
//! implementation used by the window host, and tests drive the same code with
//! a recording backend.

pub mod animation;
pub mod camera;
mod compile;
mod gpu;
pub mod grid;
pub mod input;
pub mod mesh;
pub mod mount;
pub mod runtime;
pub mod scene;
pub mod shader;
pub mod types;
mod window;

pub use animation::{step, AnimationDriver, AnimationState};
pub use gpu::GpuState;
pub use grid::{GridSpec, GridTopology};
pub use input::{InputController, PointerEvent, PointerState, ViewportSize, ViewportState};
pub use mount::Mount;
pub use runtime::{FrameRequestId, FrameScheduler, ManualFrameScheduler, PacedFrameScheduler};
pub use scene::{NoOp, RenderBackend, ResizeOutcome, Scene, SceneError, StepOutcome};
pub use types::{
    AdapterProfile, Antialiasing, CameraParams, MeshPlacement, RendererConfig, Rgb, SceneParams,
    WaveParams,
};
pub use window::Renderer;
