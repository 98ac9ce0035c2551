use tracing::{debug, info};

use crate::animation::AnimationDriver;
use crate::input::{InputController, PointerEvent, PointerState, ViewportSize};
use crate::runtime::{FrameRequestId, FrameScheduler};
use crate::scene::{NoOp, RenderBackend, ResizeOutcome, Scene, SceneError, SceneSetup, StepOutcome};
use crate::types::SceneParams;

/// Pointer and resize listeners, alive for as long as the mount is.
///
/// Dropping the guard is what detaches them; events that arrive afterwards
/// find no controller and are ignored.
#[derive(Debug)]
pub struct ListenerGuard {
    input: InputController,
}

impl ListenerGuard {
    fn attach(viewport: ViewportSize) -> Self {
        debug!("input listeners attached");
        Self {
            input: InputController::new(viewport),
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        debug!("input listeners detached");
    }
}

/// One mounted scene: resources, frame loop and input wiring.
///
/// Unmounting cancels the pending frame, detaches listeners and tears the
/// scene down, in that order. Dropping a mount unmounts it.
pub struct Mount<B: RenderBackend, S: FrameScheduler> {
    scene: Scene<B>,
    driver: AnimationDriver<S>,
    listeners: Option<ListenerGuard>,
}

impl<B: RenderBackend, S: FrameScheduler> Mount<B, S> {
    pub fn mount<F>(
        viewport: ViewportSize,
        params: SceneParams,
        scheduler: S,
        create_backend: F,
    ) -> Result<Self, SceneError>
    where
        F: FnOnce(&SceneSetup<'_>) -> anyhow::Result<B>,
    {
        let scene = Scene::initialize(viewport, params, create_backend)?;
        Ok(Self::attach(scene, viewport, scheduler))
    }

    /// Wires an already initialised scene into a frame loop.
    pub fn attach(scene: Scene<B>, viewport: ViewportSize, scheduler: S) -> Self {
        let mut driver = AnimationDriver::new(scheduler, &scene.params().camera);
        let listeners = Some(ListenerGuard::attach(viewport));
        driver.start();
        info!("scene mounted");
        Self {
            scene,
            driver,
            listeners,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.listeners.is_some()
    }

    pub fn scene(&self) -> &Scene<B> {
        &self.scene
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.scene.backend_mut()
    }

    pub fn driver(&self) -> &AnimationDriver<S> {
        &self.driver
    }

    pub fn scheduler(&self) -> &S {
        self.driver.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.driver.scheduler_mut()
    }

    pub fn pointer(&self) -> PointerState {
        self.listeners
            .as_ref()
            .map(|guard| guard.input.pointer())
            .unwrap_or_default()
    }

    pub fn handle_pointer_move(&mut self, event: PointerEvent) -> bool {
        match self.listeners.as_mut() {
            Some(guard) => guard.input.on_pointer_move(event),
            None => false,
        }
    }

    pub fn handle_resize(&mut self, size: ViewportSize) -> ResizeOutcome {
        match self.listeners.as_mut() {
            Some(guard) => guard.input.on_resize(size, &mut self.scene),
            None => ResizeOutcome::Ignored(NoOp::StaleHandle),
        }
    }

    /// Runs the frame the scheduler fired.
    pub fn on_frame(&mut self, id: FrameRequestId) -> Result<StepOutcome, B::Error> {
        let pointer = self.pointer();
        self.driver.run_frame(id, &mut self.scene, &pointer)
    }

    /// Returns `false` if the mount was already unmounted.
    pub fn unmount(&mut self) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.driver.stop();
        self.listeners = None;
        self.scene.teardown();
        info!(frames = self.driver.frames(), "scene unmounted");
        true
    }
}

impl<B: RenderBackend, S: FrameScheduler> Drop for Mount<B, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::runtime::ManualFrameScheduler;
    use crate::scene::testing::{RecordingBackend, SharedLog};

    /// Notes whether the backend was still alive when the frame got cancelled.
    struct JournalScheduler {
        inner: ManualFrameScheduler,
        log: SharedLog,
        journal: Rc<RefCell<Vec<&'static str>>>,
    }

    impl FrameScheduler for JournalScheduler {
        fn request_frame(&mut self) -> FrameRequestId {
            self.inner.request_frame()
        }

        fn cancel_frame(&mut self, id: FrameRequestId) {
            let entry = if self.log.borrow().dropped {
                "cancelled after teardown"
            } else {
                "cancelled before teardown"
            };
            self.journal.borrow_mut().push(entry);
            self.inner.cancel_frame(id);
        }
    }

    fn mounted() -> (
        Mount<RecordingBackend, JournalScheduler>,
        SharedLog,
        Rc<RefCell<Vec<&'static str>>>,
    ) {
        let log = SharedLog::default();
        let journal = Rc::new(RefCell::new(Vec::new()));
        let scheduler = JournalScheduler {
            inner: ManualFrameScheduler::new(),
            log: log.clone(),
            journal: journal.clone(),
        };
        let mount = Mount::mount(
            ViewportSize::new(1600, 900, 1.0),
            SceneParams::default(),
            scheduler,
            |setup| Ok(RecordingBackend::new(log.clone(), setup)),
        )
        .expect("recording backend never fails");
        (mount, log, journal)
    }

    fn fire(mount: &mut Mount<RecordingBackend, JournalScheduler>) -> Result<StepOutcome, String> {
        let id = mount.scheduler_mut().inner.fire().expect("frame requested");
        mount.on_frame(id)
    }

    #[test]
    fn mounted_scene_renders_scheduled_frames() {
        let (mut mount, log, _) = mounted();
        assert!(mount.is_mounted());
        assert_eq!(fire(&mut mount), Ok(StepOutcome::Rendered));
        assert_eq!(fire(&mut mount), Ok(StepOutcome::Rendered));
        assert_eq!(log.borrow().draws.len(), 2);
    }

    #[test]
    fn pointer_moves_steer_the_camera() {
        let (mut mount, _log, _) = mounted();
        assert!(mount.handle_pointer_move(PointerEvent {
            client_x: 900.0,
            client_y: 450.0,
            is_primary: true,
        }));
        assert_eq!(mount.pointer(), PointerState { x: 100.0, y: 0.0 });
        fire(&mut mount).expect("recording draw");
        assert!((mount.driver().camera().position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn resize_reaches_the_scene() {
        let (mut mount, log, _) = mounted();
        assert_eq!(
            mount.handle_resize(ViewportSize::new(800, 800, 1.0)),
            ResizeOutcome::Applied
        );
        assert_eq!(mount.scene().projection().map(|p| p.aspect), Some(1.0));
        assert_eq!(log.borrow().resizes, vec![(800, 800)]);
    }

    #[test]
    fn unmount_cancels_before_teardown() {
        let (mut mount, log, journal) = mounted();
        fire(&mut mount).expect("recording draw");
        assert!(mount.unmount());
        assert_eq!(*journal.borrow(), vec!["cancelled before teardown"]);
        assert!(log.borrow().dropped);
        assert!(!mount.driver().is_running());
        assert_eq!(mount.scheduler().inner.pending(), 0);
    }

    #[test]
    fn events_after_unmount_are_ignored() {
        let (mut mount, log, _) = mounted();
        let id = mount.driver().pending().expect("frame requested");
        mount.unmount();
        assert!(!mount.unmount());

        assert!(!mount.handle_pointer_move(PointerEvent {
            client_x: 10.0,
            client_y: 10.0,
            is_primary: true,
        }));
        assert_eq!(
            mount.handle_resize(ViewportSize::new(640, 480, 1.0)),
            ResizeOutcome::Ignored(NoOp::StaleHandle)
        );
        assert_eq!(
            mount.on_frame(id),
            Ok(StepOutcome::Skipped(NoOp::CancelledFrame))
        );
        assert!(log.borrow().draws.is_empty());
        assert!(log.borrow().resizes.is_empty());
    }

    #[test]
    fn dropping_a_mount_releases_resources() {
        let (mount, log, journal) = mounted();
        drop(mount);
        assert!(log.borrow().dropped);
        assert_eq!(journal.borrow().len(), 1);
    }
}
