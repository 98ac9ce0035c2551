use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{error, info, trace, warn};
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{Event, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::input::{PointerEvent, ViewportSize};
use crate::mount::Mount;
use crate::runtime::{FramePoll, PacedFrameScheduler};
use crate::scene::{Scene, StepOutcome};
use crate::types::RendererConfig;

const SOFTWARE_FPS_CAP: f32 = 15.0;

/// Tracks which touch point plays the role of the primary pointer.
///
/// The first finger down becomes primary until it lifts; other fingers are
/// reported as secondary and ignored by the input controller.
#[derive(Debug, Default)]
pub(crate) struct TouchTracker {
    primary: Option<u64>,
}

impl TouchTracker {
    pub(crate) fn classify(&mut self, id: u64, phase: TouchPhase) -> bool {
        match phase {
            TouchPhase::Started => {
                if self.primary.is_none() {
                    self.primary = Some(id);
                }
                self.primary == Some(id)
            }
            TouchPhase::Moved => self.primary == Some(id),
            TouchPhase::Ended | TouchPhase::Cancelled => {
                let was_primary = self.primary == Some(id);
                if was_primary {
                    self.primary = None;
                }
                was_primary
            }
        }
    }
}

/// Frame cap to apply, given what the user asked for and the adapter in use.
pub(crate) fn effective_fps_cap(requested: Option<f32>, is_software: bool) -> Option<f32> {
    match requested {
        Some(fps) => Some(fps),
        None if is_software => Some(SOFTWARE_FPS_CAP),
        None => None,
    }
}

/// Window-side state: the mounted scene plus the winit bits that feed it.
///
/// `mount` is declared before `window` so the GPU surface is released before
/// the window that backs it.
struct WindowHost {
    mount: Mount<GpuState, PacedFrameScheduler>,
    touch: TouchTracker,
    scale_factor: f64,
    window: Arc<Window>,
}

impl WindowHost {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        let viewport = ViewportSize::new(size.width, size.height, scale_factor);

        let scene = Scene::on_surface(
            Some(window.as_ref()),
            viewport,
            config.scene.clone(),
            config.antialiasing,
        )
        .map_err(|err| anyhow!("failed to initialise window renderer: {err}"))?;

        let profile = scene
            .backend()
            .map(|gpu| gpu.adapter_profile().clone())
            .ok_or_else(|| anyhow!("scene lost its GPU backend during start-up"))?;
        // A zero cap from the config means "uncapped".
        let requested = config.target_fps.filter(|fps| *fps > 0.0);
        let target_fps = effective_fps_cap(requested, profile.is_software());
        if requested.is_none() {
            if let Some(cap) = target_fps {
                warn!(
                    adapter = %profile.name,
                    backend = ?profile.backend,
                    cap,
                    "software rasterizer detected; capping to {} FPS (override with --fps)",
                    cap
                );
            }
        }
        info!(
            adapter = %profile.name,
            backend = ?profile.backend,
            fps_cap = ?target_fps,
            "window renderer ready"
        );

        let mount = Mount::attach(scene, viewport, PacedFrameScheduler::new(target_fps));
        window.request_redraw();

        Ok(Self {
            mount,
            touch: TouchTracker::default(),
            scale_factor,
            window,
        })
    }

    fn viewport(&self) -> ViewportSize {
        let size = self.window.inner_size();
        ViewportSize::new(size.width, size.height, self.scale_factor)
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>, is_primary: bool) {
        self.mount.handle_pointer_move(PointerEvent::from_physical(
            position.x,
            position.y,
            self.scale_factor,
            is_primary,
        ));
    }

    fn touched(&mut self, touch: Touch) {
        let is_primary = self.touch.classify(touch.id, touch.phase);
        if matches!(touch.phase, TouchPhase::Started | TouchPhase::Moved) {
            self.pointer_moved(touch.location, is_primary);
        }
    }

    fn render(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let now = Instant::now();
        let FramePoll::Due(id) = self.mount.scheduler().poll(now) else {
            trace!("redraw requested before the next frame is due");
            return;
        };

        match self.mount.on_frame(id) {
            Ok(StepOutcome::Rendered) => self.mount.scheduler_mut().mark_rendered(now),
            Ok(StepOutcome::Skipped(reason)) => trace!(%reason, "frame skipped"),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(gpu) = self.mount.backend_mut() {
                    gpu.reconfigure();
                }
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; exiting");
                self.mount.unmount();
                elwt.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
            }
            Err(other) => {
                warn!("surface error: {other:?}; retrying next frame");
            }
        }
    }

    fn handle(&mut self, event: Event<()>, elwt: &EventLoopWindowTarget<()>) {
        match event {
            Event::WindowEvent { window_id, event } if window_id == self.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        self.mount.unmount();
                        elwt.exit();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        self.pointer_moved(position, true);
                    }
                    WindowEvent::Touch(touch) => self.touched(touch),
                    WindowEvent::Resized(size) => {
                        self.mount.handle_resize(ViewportSize::new(
                            size.width,
                            size.height,
                            self.scale_factor,
                        ));
                        self.window.request_redraw();
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        self.scale_factor = scale_factor;
                        let viewport = self.viewport();
                        self.mount.handle_resize(viewport);
                    }
                    WindowEvent::RedrawRequested => self.render(elwt),
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                match self.mount.scheduler().poll(now) {
                    FramePoll::Due(_) => {
                        trace!("scheduler: issuing redraw now");
                        self.window.request_redraw();
                        elwt.set_control_flow(ControlFlow::Wait);
                    }
                    FramePoll::WaitUntil(deadline) => {
                        let ms = deadline.saturating_duration_since(now).as_millis();
                        trace!(deadline_ms = ms, "scheduler: waiting until next frame");
                        elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                    }
                    FramePoll::Idle => {
                        trace!("scheduler: idle (no redraw requested)");
                        elwt.set_control_flow(ControlFlow::Wait);
                    }
                }
            }
            Event::LoopExiting => {
                self.mount.unmount();
            }
            _ => {}
        }
    }
}

/// Entry point that opens a window and runs the scene until it closes.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Blocks on the winit event loop until the window is closed.
    pub fn run(self) -> Result<()> {
        let event_loop =
            EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
        let (width, height) = self.config.window_size;
        let window = WindowBuilder::new()
            .with_title("wavegrid")
            .with_inner_size(LogicalSize::new(width, height))
            .build(&event_loop)
            .map_err(|err| anyhow!("failed to create window: {err}"))?;
        let window = Arc::new(window);

        let mut host = WindowHost::new(window, &self.config)?;
        event_loop
            .run(move |event, elwt| host.handle(event, elwt))
            .map_err(|err| anyhow!("window event loop error: {err}"))
    }
}
