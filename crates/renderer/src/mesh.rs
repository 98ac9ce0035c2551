/// CPU mirror of the GPU vertex buffer.
///
/// The animation step rewrites `y` components in place and flags the buffer;
/// the backend uploads it on the next draw and clears the flag.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionBuffer {
    data: Vec<f32>,
    dirty: bool,
}

impl PositionBuffer {
    /// Wraps `x, y, z` triples. New buffers start dirty so the first draw uploads them.
    pub fn new(data: Vec<f32>) -> Self {
        debug_assert!(data.len() % 3 == 0, "position buffer must hold xyz triples");
        Self { data, dirty: true }
    }

    pub fn point_count(&self) -> usize {
        self.data.len() / 3
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn point(&self, index: usize) -> Option<[f32; 3]> {
        let base = index.checked_mul(3)?;
        let slot = self.data.get(base..base + 3)?;
        Some([slot[0], slot[1], slot[2]])
    }

    /// Writes the `y` component of point `index`; out-of-range writes are dropped.
    pub fn set_y(&mut self, index: usize, y: f32) -> bool {
        match self.data.get_mut(index * 3 + 1) {
            Some(slot) => {
                *slot = y;
                true
            }
            None => false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether an upload is pending and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}
