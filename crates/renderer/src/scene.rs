use std::fmt;

use glam::Mat4;
use tracing::{debug, info, warn};

use crate::camera::{model_matrix, Projection};
use crate::grid::{self, GridTopology};
use crate::input::ViewportSize;
use crate::mesh::PositionBuffer;
use crate::shader::ShaderProgram;
use crate::types::SceneParams;

/// Per-frame values handed to the backend for one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view_proj: Mat4,
    pub model: Mat4,
    pub color: [f32; 3],
    pub time: f32,
}

/// Drawing surface and GPU resources behind a [`Scene`].
///
/// The engine never talks to wgpu directly; `gpu::GpuState` implements this
/// for real windows and tests plug in a recording backend.
pub trait RenderBackend {
    type Error: fmt::Debug + fmt::Display;

    /// Resizes the drawing surface. Only called with drawable sizes.
    fn resize(&mut self, size: ViewportSize);

    /// Replaces the vertex buffer contents with `positions` (`x, y, z` triples).
    fn upload_positions(&mut self, positions: &[f32]);

    /// Draws the full line list once with the given uniforms.
    fn draw(&mut self, frame: &FrameUniforms) -> Result<(), Self::Error>;
}

/// What a backend factory gets to work with while the scene is being built.
#[derive(Debug)]
pub struct SceneSetup<'a> {
    pub viewport: ViewportSize,
    pub topology: &'a GridTopology,
    pub params: &'a SceneParams,
}

/// Failures that prevent a scene from being mounted at all.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("no drawing surface to attach the scene to")]
    MissingSurface,
    #[error("grid of {amount_x}x{amount_y} points cannot be built")]
    UnbuildableGrid { amount_x: u32, amount_y: u32 },
    #[error("failed to initialise scene resources: {0:#}")]
    ResourceInitialization(anyhow::Error),
}

/// Calls that were dropped instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NoOp {
    #[error("viewport {width}x{height} has no drawable area")]
    InvalidViewport { width: u32, height: u32 },
    #[error("scene has already been torn down")]
    StaleHandle,
    #[error("frame request was cancelled or superseded")]
    CancelledFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    Applied,
    Ignored(NoOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Rendered,
    Skipped(NoOp),
}

/// Resources that exist only between `initialize` and `teardown`.
///
/// Field order is drop order: the backend (surface, device, buffers) goes
/// first, then the CPU-side geometry and shader state.
pub(crate) struct Live<B> {
    pub backend: B,
    pub positions: PositionBuffer,
    pub program: ShaderProgram,
    pub projection: Projection,
    pub viewport: ViewportSize,
    pub model: Mat4,
}

/// Owner of the mesh, shader program, projection and drawing backend.
pub struct Scene<B: RenderBackend> {
    params: SceneParams,
    edge_count: usize,
    live: Option<Live<B>>,
}

impl<B: RenderBackend> Scene<B> {
    /// Builds the grid and shader state, then asks `create_backend` for a surface.
    ///
    /// Nothing is retained when the backend cannot be created.
    pub fn initialize<F>(
        viewport: ViewportSize,
        params: SceneParams,
        create_backend: F,
    ) -> Result<Self, SceneError>
    where
        F: FnOnce(&SceneSetup<'_>) -> anyhow::Result<B>,
    {
        if !params.grid.is_buildable() {
            return Err(SceneError::UnbuildableGrid {
                amount_x: params.grid.amount_x,
                amount_y: params.grid.amount_y,
            });
        }
        let topology = grid::build(&params.grid);
        let backend = create_backend(&SceneSetup {
            viewport,
            topology: &topology,
            params: &params,
        })
        .map_err(SceneError::ResourceInitialization)?;

        let edge_count = topology.edge_count();
        let live = Live {
            backend,
            positions: PositionBuffer::new(topology.positions),
            program: ShaderProgram::new(params.color),
            projection: Projection::new(&params.camera, viewport.width, viewport.height),
            viewport,
            model: model_matrix(&params.mesh),
        };
        info!(
            points = live.positions.point_count(),
            edges = edge_count,
            width = viewport.width,
            height = viewport.height,
            "scene initialised"
        );

        Ok(Self {
            params,
            edge_count,
            live: Some(live),
        })
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.live.as_ref().map(|live| &live.projection)
    }

    pub fn viewport(&self) -> Option<ViewportSize> {
        self.live.as_ref().map(|live| live.viewport)
    }

    pub fn positions(&self) -> Option<&PositionBuffer> {
        self.live.as_ref().map(|live| &live.positions)
    }

    pub fn program(&self) -> Option<&ShaderProgram> {
        self.live.as_ref().map(|live| &live.program)
    }

    pub fn backend(&self) -> Option<&B> {
        self.live.as_ref().map(|live| &live.backend)
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.live.as_mut().map(|live| &mut live.backend)
    }

    pub(crate) fn parts_mut(&mut self) -> Option<(&SceneParams, &mut Live<B>)> {
        let live = self.live.as_mut()?;
        Some((&self.params, live))
    }

    /// Recomputes the projection aspect and resizes the surface.
    pub fn resize(&mut self, size: ViewportSize) -> ResizeOutcome {
        let Some(live) = self.live.as_mut() else {
            debug!("resize after teardown ignored");
            return ResizeOutcome::Ignored(NoOp::StaleHandle);
        };
        if !size.is_drawable() {
            return ResizeOutcome::Ignored(NoOp::InvalidViewport {
                width: size.width,
                height: size.height,
            });
        }

        live.projection.set_viewport(size.width, size.height);
        live.backend.resize(size);
        live.viewport = size;
        ResizeOutcome::Applied
    }

    /// Releases the backend and all geometry. Returns `false` when already torn down.
    pub fn teardown(&mut self) -> bool {
        match self.live.take() {
            Some(live) => {
                drop(live);
                info!("scene torn down");
                true
            }
            None => {
                warn!("scene teardown requested twice; ignoring");
                false
            }
        }
    }
}

impl<B: RenderBackend> fmt::Debug for Scene<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("grid", &self.params.grid)
            .field("edge_count", &self.edge_count)
            .field("live", &self.live.is_some())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::testing::{recording_scene, RecordingBackend};
    use super::*;
    use crate::grid::GridSpec;

    #[test]
    fn initialize_builds_the_default_grid() {
        let (scene, log) = recording_scene();
        assert!(scene.is_live());
        assert_eq!(scene.positions().map(|p| p.point_count()), Some(1600));
        assert_eq!(scene.edge_count(), 2 * 39 * 39);
        assert_eq!(log.borrow().index_count, 4 * 39 * 39);
        assert_eq!(scene.program().map(|p| p.time()), Some(0.0));
        let aspect = scene.projection().map(|p| p.aspect);
        assert_eq!(aspect, Some(1600.0 / 900.0));
    }

    #[test]
    fn failed_backend_leaves_nothing_behind() {
        let result = Scene::<RecordingBackend>::initialize(
            ViewportSize::new(800, 600, 1.0),
            SceneParams {
                grid: GridSpec {
                    amount_x: 4,
                    amount_y: 4,
                    separation: 10.0,
                },
                ..SceneParams::default()
            },
            |_| Err(anyhow!("no adapter")),
        );
        let err = result.expect_err("backend failure must surface");
        assert!(matches!(err, SceneError::ResourceInitialization(_)));
        assert!(err.to_string().contains("no adapter"));
    }

    #[test]
    fn oversized_grid_is_rejected_before_the_backend() {
        let mut backend_requested = false;
        let result = Scene::<RecordingBackend>::initialize(
            ViewportSize::new(800, 600, 1.0),
            SceneParams {
                grid: GridSpec {
                    amount_x: 100_000,
                    amount_y: 100_000,
                    separation: 70.0,
                },
                ..SceneParams::default()
            },
            |_| {
                backend_requested = true;
                Err(anyhow!("unreachable"))
            },
        );
        assert!(matches!(
            result,
            Err(SceneError::UnbuildableGrid {
                amount_x: 100_000,
                amount_y: 100_000
            })
        ));
        assert!(!backend_requested);
    }

    #[test]
    fn resize_updates_projection_and_surface() {
        let (mut scene, log) = recording_scene();
        let outcome = scene.resize(ViewportSize::new(1000, 1000, 1.0));
        assert_eq!(outcome, ResizeOutcome::Applied);
        assert_eq!(scene.projection().map(|p| p.aspect), Some(1.0));
        assert_eq!(scene.viewport().map(|v| v.width), Some(1000));
        assert_eq!(log.borrow().resizes, vec![(1000, 1000)]);
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let (mut scene, log) = recording_scene();
        let outcome = scene.resize(ViewportSize::new(0, 720, 1.0));
        assert_eq!(
            outcome,
            ResizeOutcome::Ignored(NoOp::InvalidViewport {
                width: 0,
                height: 720
            })
        );
        assert_eq!(scene.viewport().map(|v| v.width), Some(1600));
        assert!(log.borrow().resizes.is_empty());
    }

    #[test]
    fn teardown_is_idempotent() {
        let (mut scene, log) = recording_scene();
        assert!(scene.teardown());
        assert!(log.borrow().dropped);
        assert!(!scene.teardown());
        assert!(!scene.is_live());
        assert_eq!(
            scene.resize(ViewportSize::new(640, 480, 1.0)),
            ResizeOutcome::Ignored(NoOp::StaleHandle)
        );
        assert!(log.borrow().resizes.is_empty());
    }
}
