//! Lattice topology for the wireframe mesh.
//!
//! Points are laid out row-major by `ix` then `iy`, so point `(ix, iy)` lives
//! at flattened index `ix * amount_y + iy` and owns scalars
//! `[3 * index, 3 * index + 3)` of the position buffer. The animation step
//! relies on that layout to rewrite `y` components in place.

/// Lattice dimensions and spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Number of points along the X axis.
    pub amount_x: u32,
    /// Number of points along the Z axis.
    pub amount_y: u32,
    /// World-space distance between neighbouring points.
    pub separation: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            amount_x: 40,
            amount_y: 40,
            separation: 70.0,
        }
    }
}

impl GridSpec {
    /// Largest lattice whose flattened indices all fit in a `u32` index buffer.
    pub const MAX_POINTS: usize = 1 << 22;

    pub fn vertex_count(&self) -> usize {
        self.amount_x as usize * self.amount_y as usize
    }

    /// Each interior point contributes one edge along `iy` and one along `ix`.
    pub fn edge_count(&self) -> usize {
        2 * self.amount_x.saturating_sub(1) as usize * self.amount_y.saturating_sub(1) as usize
    }

    /// Whether the lattice has at least 2x2 points and at most [`Self::MAX_POINTS`].
    pub fn is_buildable(&self) -> bool {
        self.amount_x >= 2 && self.amount_y >= 2 && self.vertex_count() <= Self::MAX_POINTS
    }

    pub fn flat_index(&self, ix: u32, iy: u32) -> u32 {
        ix * self.amount_y + iy
    }

    /// Position of `(ix, iy)` before any wave displacement.
    pub fn rest_position(&self, ix: u32, iy: u32) -> [f32; 3] {
        let half_x = (self.amount_x as f32 * self.separation) / 2.0;
        let half_z = (self.amount_y as f32 * self.separation) / 2.0;
        [
            ix as f32 * self.separation - half_x,
            0.0,
            iy as f32 * self.separation - half_z,
        ]
    }
}

/// CPU-side mesh data ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTopology {
    /// `x, y, z` triples, one per lattice point.
    pub positions: Vec<f32>,
    /// Line-list indices, two per edge.
    pub indices: Vec<u32>,
}

impl GridTopology {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn edge_count(&self) -> usize {
        self.indices.len() / 2
    }
}

pub fn build(spec: &GridSpec) -> GridTopology {
    let mut positions = Vec::with_capacity(spec.vertex_count() * 3);
    let mut indices = Vec::with_capacity(spec.edge_count() * 2);

    for ix in 0..spec.amount_x {
        for iy in 0..spec.amount_y {
            positions.extend_from_slice(&spec.rest_position(ix, iy));

            if ix + 1 < spec.amount_x && iy + 1 < spec.amount_y {
                let current = spec.flat_index(ix, iy);
                indices.extend_from_slice(&[current, current + 1]);
                indices.extend_from_slice(&[current, current + spec.amount_y]);
            }
        }
    }

    GridTopology { positions, indices }
}
