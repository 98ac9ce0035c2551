//! Per-frame animation loop.
//!
//! [`step`] is the whole frame: chase the pointer with the camera, advance
//! the clocks, rewrite every lattice height and draw. [`AnimationDriver`]
//! wraps it in the self-rescheduling loop and owns the mutable counters.

use glam::Vec3;
use tracing::trace;

use crate::camera::CameraState;
use crate::input::PointerState;
use crate::runtime::{FrameRequestId, FrameScheduler};
use crate::scene::{FrameUniforms, NoOp, RenderBackend, Scene, StepOutcome};
use crate::types::{CameraParams, WaveParams};

/// Clocks advanced by every step. Both start at zero and only grow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationState {
    /// Shader clock.
    pub time: f64,
    /// Wave phase drift.
    pub phase: f64,
}

/// Height of lattice point `(ix, iy)` at wave phase `phase`.
pub fn wave_height(ix: u32, iy: u32, phase: f64, wave: &WaveParams) -> f32 {
    let along_x = ((ix as f64 + phase) * wave.frequency_x).sin() * wave.amplitude;
    let along_y = ((iy as f64 + phase) * wave.frequency_y).sin() * wave.amplitude;
    (along_x + along_y) as f32
}

/// Runs one frame against `scene`.
///
/// A torn-down scene turns the step into a no-op and leaves every state
/// untouched. Otherwise all state advances before the draw is issued, and
/// `phase` advances even when the backend reports a draw failure, so the
/// next step never repeats a frame.
pub fn step<B: RenderBackend>(
    scene: &mut Scene<B>,
    animation: &mut AnimationState,
    camera: &mut CameraState,
    pointer: &PointerState,
) -> Result<StepOutcome, B::Error> {
    let Some((params, live)) = scene.parts_mut() else {
        trace!("step after teardown skipped");
        return Ok(StepOutcome::Skipped(NoOp::StaleHandle));
    };

    camera.follow_x(pointer.x as f32, params.camera.smoothing);
    camera.look_at(Vec3::ZERO);

    animation.time += params.wave.time_step;
    live.program.set_time(animation.time as f32);

    let grid = &params.grid;
    for ix in 0..grid.amount_x {
        for iy in 0..grid.amount_y {
            let y = wave_height(ix, iy, animation.phase, &params.wave);
            live.positions.set_y(grid.flat_index(ix, iy) as usize, y);
        }
    }
    live.positions.mark_dirty();

    if live.positions.take_dirty() {
        live.backend.upload_positions(live.positions.as_slice());
    }
    let frame = FrameUniforms {
        view_proj: live.projection.matrix() * camera.view_matrix(),
        model: live.model,
        color: live.program.color().to_array(),
        time: live.program.time(),
    };
    let drawn = live.backend.draw(&frame);

    animation.phase += params.wave.phase_step;
    drawn.map(|()| StepOutcome::Rendered)
}

/// Self-rescheduling frame loop around [`step`].
///
/// Exactly one frame request is outstanding while the driver runs; the id is
/// checked on arrival so a frame fired after [`AnimationDriver::stop`] does
/// nothing.
#[derive(Debug)]
pub struct AnimationDriver<S: FrameScheduler> {
    scheduler: S,
    pending: Option<FrameRequestId>,
    animation: AnimationState,
    camera: CameraState,
    frames: u64,
}

impl<S: FrameScheduler> AnimationDriver<S> {
    pub fn new(scheduler: S, camera: &CameraParams) -> Self {
        Self {
            scheduler,
            pending: None,
            animation: AnimationState::default(),
            camera: CameraState::new(camera),
            frames: 0,
        }
    }

    pub fn start(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.scheduler.request_frame());
        }
    }

    /// Cancels the outstanding frame request. Returns whether one existed.
    pub fn stop(&mut self) -> bool {
        match self.pending.take() {
            Some(id) => {
                self.scheduler.cancel_frame(id);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<FrameRequestId> {
        self.pending
    }

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Handles a fired frame request: steps the scene and asks for the next frame.
    pub fn run_frame<B: RenderBackend>(
        &mut self,
        id: FrameRequestId,
        scene: &mut Scene<B>,
        pointer: &PointerState,
    ) -> Result<StepOutcome, B::Error> {
        if self.pending != Some(id) {
            trace!(frame = id.get(), "ignoring stale frame request");
            return Ok(StepOutcome::Skipped(NoOp::CancelledFrame));
        }
        self.pending = None;

        let outcome = step(scene, &mut self.animation, &mut self.camera, pointer);
        if matches!(outcome, Ok(StepOutcome::Skipped(NoOp::StaleHandle))) {
            return outcome;
        }
        self.frames += 1;
        self.pending = Some(self.scheduler.request_frame());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualFrameScheduler;
    use crate::scene::testing::{recording_scene, recording_scene_with};
    use crate::types::SceneParams;

    fn fresh_state() -> (AnimationState, CameraState) {
        (
            AnimationState::default(),
            CameraState::new(&CameraParams::default()),
        )
    }

    #[test]
    fn one_step_advances_time_and_phase() {
        let (mut scene, log) = recording_scene();
        let (mut animation, mut camera) = fresh_state();
        let outcome = step(&mut scene, &mut animation, &mut camera, &PointerState::default());
        assert_eq!(outcome, Ok(StepOutcome::Rendered));
        assert_eq!(animation.time, 0.01);
        assert_eq!(animation.phase, 0.02);
        assert_eq!(log.borrow().draws.len(), 1);
        assert_eq!(log.borrow().uploads, 1);
        assert!(!scene.positions().expect("live").is_dirty());
    }

    #[test]
    fn deltas_do_not_depend_on_prior_state() {
        let (mut scene, _log) = recording_scene();
        let (_, mut camera) = fresh_state();
        let mut animation = AnimationState {
            time: 1234.5,
            phase: 77.25,
        };
        step(&mut scene, &mut animation, &mut camera, &PointerState::default())
            .expect("recording draw");
        assert!((animation.time - 1234.51).abs() < 1e-9);
        assert!((animation.phase - 77.27).abs() < 1e-9);
    }

    #[test]
    fn heights_follow_the_wave_at_the_pre_step_phase() {
        let (mut scene, log) = recording_scene();
        let (_, mut camera) = fresh_state();
        let phase = 3.7;
        let mut animation = AnimationState { time: 0.0, phase };
        step(&mut scene, &mut animation, &mut camera, &PointerState::default())
            .expect("recording draw");

        let positions = scene.positions().expect("live");
        for (ix, iy) in [(0, 0), (5, 17), (39, 39), (12, 0)] {
            let index = (ix * 40 + iy) as usize;
            let [x, y, z] = positions.point(index).expect("in range");
            let expected = ((ix as f64 + phase) * 0.2).sin() * 50.0
                + ((iy as f64 + phase) * 0.3).sin() * 50.0;
            assert!((y as f64 - expected).abs() < 1e-4);
            assert_eq!(x, ix as f32 * 70.0 - 1400.0);
            assert_eq!(z, iy as f32 * 70.0 - 1400.0);
        }
        assert_eq!(log.borrow().last_upload, positions.as_slice());
    }

    #[test]
    fn x_and_z_survive_many_frames() {
        let (mut scene, _log) = recording_scene();
        let (mut animation, mut camera) = fresh_state();
        let before = scene.positions().expect("live").clone();
        for _ in 0..25 {
            step(&mut scene, &mut animation, &mut camera, &PointerState::default())
                .expect("recording draw");
        }
        let after = scene.positions().expect("live");
        for index in 0..before.point_count() {
            let [x0, _, z0] = before.point(index).expect("in range");
            let [x1, _, z1] = after.point(index).expect("in range");
            assert_eq!((x0, z0), (x1, z1));
        }
    }

    #[test]
    fn camera_eases_toward_the_pointer() {
        let (mut scene, _log) = recording_scene();
        let (mut animation, mut camera) = fresh_state();
        let pointer = PointerState { x: 100.0, y: 40.0 };

        step(&mut scene, &mut animation, &mut camera, &pointer).expect("recording draw");
        assert!((camera.position.x - 1.0).abs() < 1e-5);

        for _ in 1..10 {
            step(&mut scene, &mut animation, &mut camera, &pointer).expect("recording draw");
        }
        let expected = 100.0 * (1.0 - 0.99f32.powi(10));
        assert!((camera.position.x - expected).abs() < 1e-3);
        assert!((camera.position.x - 9.56).abs() < 0.01);
        assert_eq!(camera.position.y, -100.0);
        assert_eq!(camera.position.z, 1500.0);
    }

    #[test]
    fn camera_never_overshoots() {
        let (mut scene, _log) = recording_scene();
        let (mut animation, mut camera) = fresh_state();
        let pointer = PointerState { x: -250.0, y: 0.0 };
        let mut previous = camera.position.x;
        for _ in 0..500 {
            step(&mut scene, &mut animation, &mut camera, &pointer).expect("recording draw");
            assert!(camera.position.x <= previous);
            assert!(camera.position.x >= -250.0);
            previous = camera.position.x;
        }
    }

    #[test]
    fn frame_uniforms_carry_time_and_color() {
        let (mut scene, log) = recording_scene();
        let (mut animation, mut camera) = fresh_state();
        step(&mut scene, &mut animation, &mut camera, &PointerState::default())
            .expect("recording draw");
        let log = log.borrow();
        let frame = log.draws.last().expect("one draw");
        assert!((frame.time - 0.01).abs() < 1e-7);
        assert_eq!(frame.color, SceneParams::default().color.to_array());
    }

    #[test]
    fn failed_draw_still_advances_the_clocks() {
        let (mut scene, log) = recording_scene();
        log.borrow_mut().fail_draws = true;
        let (mut animation, mut camera) = fresh_state();
        let result = step(&mut scene, &mut animation, &mut camera, &PointerState::default());
        assert!(result.is_err());
        assert_eq!(animation.phase, 0.02);
        assert_eq!(animation.time, 0.01);
    }

    #[test]
    fn step_after_teardown_is_a_noop() {
        let (mut scene, log) = recording_scene();
        scene.teardown();
        let (mut animation, mut camera) = fresh_state();
        let outcome = step(&mut scene, &mut animation, &mut camera, &PointerState { x: 50.0, y: 0.0 });
        assert_eq!(outcome, Ok(StepOutcome::Skipped(NoOp::StaleHandle)));
        assert_eq!(animation, AnimationState::default());
        assert_eq!(camera.position.x, 0.0);
        assert!(log.borrow().draws.is_empty());
    }

    #[test]
    fn driver_reschedules_after_each_frame() {
        let (mut scene, log) = recording_scene();
        let mut driver = AnimationDriver::new(ManualFrameScheduler::new(), &CameraParams::default());
        driver.start();
        driver.start();
        assert_eq!(driver.scheduler().pending(), 1);

        for _ in 0..3 {
            let id = driver.scheduler_mut().fire().expect("frame requested");
            let outcome = driver.run_frame(id, &mut scene, &PointerState::default());
            assert_eq!(outcome, Ok(StepOutcome::Rendered));
        }
        assert_eq!(driver.frames(), 3);
        assert_eq!(log.borrow().draws.len(), 3);
        assert!(driver.is_running());
        assert!((driver.animation().phase - 0.06).abs() < 1e-12);
    }

    #[test]
    fn stopped_driver_ignores_late_frames() {
        let (mut scene, log) = recording_scene();
        let mut driver = AnimationDriver::new(ManualFrameScheduler::new(), &CameraParams::default());
        driver.start();
        let id = driver.pending().expect("requested");
        assert!(driver.stop());
        assert!(!driver.stop());
        assert_eq!(driver.scheduler().cancelled(), &[id]);

        let outcome = driver.run_frame(id, &mut scene, &PointerState::default());
        assert_eq!(outcome, Ok(StepOutcome::Skipped(NoOp::CancelledFrame)));
        assert!(log.borrow().draws.is_empty());
        assert!(!driver.is_running());
    }

    #[test]
    fn driver_stops_rescheduling_once_the_scene_is_gone() {
        let (mut scene, _log) = recording_scene_with(SceneParams::default());
        let mut driver = AnimationDriver::new(ManualFrameScheduler::new(), &CameraParams::default());
        driver.start();
        scene.teardown();
        let id = driver.scheduler_mut().fire().expect("frame requested");
        let outcome = driver.run_frame(id, &mut scene, &PointerState::default());
        assert_eq!(outcome, Ok(StepOutcome::Skipped(NoOp::StaleHandle)));
        assert!(!driver.is_running());
        assert_eq!(driver.scheduler().pending(), 0);
    }
}
