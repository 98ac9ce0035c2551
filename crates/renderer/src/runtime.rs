//! Frame scheduling for the animation driver.
//!
//! The driver never loops on its own: after every frame it asks a
//! [`FrameScheduler`] for the next one and hands the returned id back when
//! the host fires it. Unmounting cancels the outstanding request, so a
//! cancelled id that still arrives is recognisably stale.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Handle for one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(u64);

impl FrameRequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// `requestFrame` / `cancelFrame` capability injected into the driver.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequestId;
    fn cancel_frame(&mut self, id: FrameRequestId);
}

/// Scheduler that only fires when told to, for headless stepping and tests.
#[derive(Debug, Default)]
pub struct ManualFrameScheduler {
    next_id: u64,
    queue: VecDeque<FrameRequestId>,
    cancelled: Vec<FrameRequestId>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops the oldest outstanding request.
    pub fn fire(&mut self) -> Option<FrameRequestId> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn cancelled(&self) -> &[FrameRequestId] {
        &self.cancelled
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.queue.push_back(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.queue.retain(|queued| *queued != id);
        self.cancelled.push(id);
    }
}

/// What the host loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePoll {
    /// A frame is wanted now; render it with this id.
    Due(FrameRequestId),
    /// A frame is wanted but the fps cap holds it until the deadline.
    WaitUntil(Instant),
    /// Nothing requested.
    Idle,
}

/// Display-cadence scheduler with an optional fps cap.
///
/// Holds at most one outstanding request. Without a cap a requested frame is
/// due immediately and the host's vsync paces the loop.
#[derive(Debug)]
pub struct PacedFrameScheduler {
    next_id: u64,
    pending: Option<FrameRequestId>,
    frame_interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl PacedFrameScheduler {
    pub fn new(target_fps: Option<f32>) -> Self {
        Self {
            next_id: 0,
            pending: None,
            frame_interval: interval_for(target_fps),
            last_frame: None,
        }
    }

    pub fn target_fps(&self) -> Option<f32> {
        self.frame_interval
            .map(|interval| 1.0 / interval.as_secs_f32())
    }

    pub fn pending(&self) -> Option<FrameRequestId> {
        self.pending
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        self.pending.is_some()
            && self
                .next_deadline()
                .map_or(true, |deadline| now >= deadline)
    }

    /// Earliest time the pending frame may run, if the cap applies.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending?;
        let interval = self.frame_interval?;
        self.last_frame.map(|last| last + interval)
    }

    pub fn poll(&self, now: Instant) -> FramePoll {
        match self.pending {
            None => FramePoll::Idle,
            Some(id) if self.ready_for_frame(now) => FramePoll::Due(id),
            Some(_) => self
                .next_deadline()
                .map_or(FramePoll::Idle, FramePoll::WaitUntil),
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }
}

impl FrameScheduler for PacedFrameScheduler {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.pending = Some(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }
}

fn interval_for(target_fps: Option<f32>) -> Option<Duration> {
    match target_fps {
        Some(fps) if fps.is_finite() && fps > 0.0 => Some(Duration::from_secs_f32(1.0 / fps)),
        _ => None,
    }
}
