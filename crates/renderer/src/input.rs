use tracing::trace;

use crate::scene::{RenderBackend, ResizeOutcome, Scene};

/// Drawable size in physical pixels plus the window's DPI scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    /// Zero-sized viewports show up transiently while windows are minimised or laid out.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn scale(&self) -> f64 {
        if self.scale_factor.is_finite() && self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        }
    }

    pub fn logical_width(&self) -> f64 {
        self.width as f64 / self.scale()
    }

    pub fn logical_height(&self) -> f64 {
        self.height as f64 / self.scale()
    }
}

/// Window half-extents in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportState {
    pub half_width: f64,
    pub half_height: f64,
}

impl ViewportState {
    pub fn from_size(size: ViewportSize) -> Self {
        Self {
            half_width: size.logical_width() / 2.0,
            half_height: size.logical_height() / 2.0,
        }
    }
}

/// A pointer position in logical window coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f64,
    pub client_y: f64,
    pub is_primary: bool,
}

impl PointerEvent {
    /// Converts a physical cursor position using the window scale factor.
    pub fn from_physical(x: f64, y: f64, scale_factor: f64, is_primary: bool) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self {
            client_x: x / scale,
            client_y: y / scale,
            is_primary,
        }
    }
}

/// Pointer offset from the window centre.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub x: f64,
    pub y: f64,
}

/// Tracks pointer and viewport state between frames.
///
/// Every handler replaces its state in one assignment, so a frame scheduled
/// between two events always sees a consistent pointer and viewport.
#[derive(Debug, Clone)]
pub struct InputController {
    pointer: PointerState,
    viewport: ViewportState,
}

impl InputController {
    pub fn new(initial: ViewportSize) -> Self {
        Self {
            pointer: PointerState::default(),
            viewport: ViewportState::from_size(initial),
        }
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// Records the pointer offset; non-primary pointers are ignored.
    pub fn on_pointer_move(&mut self, event: PointerEvent) -> bool {
        if !event.is_primary {
            return false;
        }
        self.pointer = PointerState {
            x: event.client_x - self.viewport.half_width,
            y: event.client_y - self.viewport.half_height,
        };
        true
    }

    /// Recomputes half-extents and forwards the new size to the scene.
    pub fn on_resize<B: RenderBackend>(
        &mut self,
        size: ViewportSize,
        scene: &mut Scene<B>,
    ) -> ResizeOutcome {
        if !size.is_drawable() {
            trace!(width = size.width, height = size.height, "ignoring empty viewport");
        } else {
            self.viewport = ViewportState::from_size(size);
        }
        scene.resize(size)
    }
}
