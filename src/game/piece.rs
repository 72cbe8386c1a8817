//! Falling pieces: a 4×4 segment mask anchored at (sector, layer), plus the six shapes.

use super::arena::{SECTOR_COUNT, calc_new_sector};
use rand::Rng;

/// Mask width in sectors.
pub const MAX_WIDTH: usize = 4;
/// Mask height in layers.
pub const MAX_HEIGHT: usize = 4;

/// The six piece shapes. Offsets are (sector, layer-below-anchor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Single,
    Pair,
    Triple,
    Tower,
    /// Two side by side, extra segment under the first.
    CornerLeft,
    /// Two side by side, extra segment under the second.
    CornerRight,
}

impl ShapeKind {
    pub const ALL: [Self; 6] = [
        Self::Single,
        Self::Pair,
        Self::Triple,
        Self::Tower,
        Self::CornerLeft,
        Self::CornerRight,
    ];

    pub fn cells(&self) -> &'static [(usize, usize)] {
        match self {
            Self::Single => &[(0, 0)],
            Self::Pair => &[(0, 0), (1, 0)],
            Self::Triple => &[(0, 0), (1, 0), (2, 0)],
            Self::Tower => &[(0, 0), (0, 1), (0, 2), (0, 3)],
            Self::CornerLeft => &[(0, 0), (1, 0), (0, 1)],
            Self::CornerRight => &[(0, 0), (1, 0), (1, 1)],
        }
    }

    /// Writes this shape's cells into `mask`. Other cells are left untouched.
    fn fill(&self, mask: &mut [[bool; MAX_HEIGHT]; MAX_WIDTH]) {
        for &(i, k) in self.cells() {
            mask[i][k] = true;
        }
    }
}

/// 24-bit colour of a piece; settled segments keep the colour of the piece that formed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PieceColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PieceColor {
    #[cfg(test)]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            r: rng.random(),
            g: rng.random(),
            b: rng.random(),
        }
    }
}

/// A piece is a plain value: copying one never aliases the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Piece {
    mask: [[bool; MAX_HEIGHT]; MAX_WIDTH],
    sector: usize,
    layer: i32,
}

impl Piece {
    /// Empty mask at sector 0, layer 0.
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_shape(kind: ShapeKind) -> Self {
        let mut piece = Self::new();
        kind.fill(&mut piece.mask);
        piece
    }

    pub fn clear(&mut self) {
        self.mask = [[false; MAX_HEIGHT]; MAX_WIDTH];
    }

    /// Copies the mask only; `other` keeps its own position.
    pub fn copy_to(&self, other: &mut Self) {
        other.mask = self.mask;
    }

    /// Panics if `i` or `k` is outside the 4×4 mask.
    pub fn has_segment(&self, i: usize, k: usize) -> bool {
        self.mask[i][k]
    }

    /// Sector wraps around the ring; the layer is taken verbatim (may be off-grid for previews).
    pub fn move_to(&mut self, sector: i32, layer: i32) {
        self.sector = calc_new_sector(sector, 0);
        self.layer = layer;
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let kind = ShapeKind::ALL[rng.random_range(0..ShapeKind::ALL.len())];
        self.clear();
        kind.fill(&mut self.mask);
    }

    pub fn sector(&self) -> usize {
        self.sector
    }

    /// Topmost (outermost) layer the mask covers.
    pub fn layer(&self) -> i32 {
        self.layer
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.mask.iter().flatten().all(|&s| !s)
    }

    /// Occupied mask cells as local `(i, k)` offsets.
    pub fn segments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..MAX_WIDTH)
            .flat_map(|i| (0..MAX_HEIGHT).map(move |k| (i, k)))
            .filter(|&(i, k)| self.mask[i][k])
    }

    /// Absolute `(sector, layer)` of every segment at the piece's current position.
    pub fn cells(&self) -> impl Iterator<Item = (usize, i32)> + '_ {
        self.cells_offset(0, 0)
    }

    /// Absolute positions the segments would take after moving by the given deltas.
    pub fn cells_offset(
        &self,
        delta_sector: i32,
        delta_layer: i32,
    ) -> impl Iterator<Item = (usize, i32)> + '_ {
        let base = calc_new_sector(self.sector as i32, delta_sector) as i32;
        let top = self.layer.saturating_add(delta_layer);
        self.segments()
            .map(move |(i, k)| (calc_new_sector(base, i as i32), top.saturating_sub(k as i32)))
    }
}

const _: () = assert!(MAX_WIDTH <= SECTOR_COUNT);
