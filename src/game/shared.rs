//! Falling and next piece with their colours, and the seeded generator feeding them.

use super::arena::LAYER_COUNT;
use super::piece::{MAX_HEIGHT, Piece, PieceColor};
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Anchor layer of a freshly spawned falling piece (outermost layer).
pub const SPAWN_LAYER: i32 = LAYER_COUNT as i32 - 1;
/// Anchor layer of the preview piece. Never collision-checked.
pub const PREVIEW_LAYER: i32 = MAX_HEIGHT as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColoredPiece {
    pub piece: Piece,
    pub color: PieceColor,
}

#[derive(Debug, Clone)]
pub struct SharedData {
    falling: ColoredPiece,
    next: ColoredPiece,
    rng: Pcg32,
}

impl SharedData {
    pub fn new(seed: u64) -> Self {
        let mut data = Self {
            falling: ColoredPiece::default(),
            next: ColoredPiece::default(),
            rng: Pcg32::seed_from_u64(seed),
        };
        data.reset();
        data
    }

    pub fn falling(&self) -> &ColoredPiece {
        &self.falling
    }

    pub fn falling_mut(&mut self) -> &mut ColoredPiece {
        &mut self.falling
    }

    pub fn next(&self) -> &ColoredPiece {
        &self.next
    }

    /// Next becomes falling (by value), and a fresh next piece and colour are drawn.
    pub fn spawn_new_falling(&mut self) {
        self.next.piece.copy_to(&mut self.falling.piece);
        self.falling.piece.move_to(0, SPAWN_LAYER);
        self.falling.color = self.next.color;

        self.next.piece.randomize(&mut self.rng);
        self.next.piece.move_to(0, PREVIEW_LAYER);
        self.next.color = PieceColor::random(&mut self.rng);
    }

    /// Fresh random falling and next pieces, used when a new game starts.
    /// The generator keeps running, so consecutive games differ.
    pub fn reset(&mut self) {
        self.next.piece.randomize(&mut self.rng);
        self.next.piece.move_to(0, PREVIEW_LAYER);

        self.falling.piece.randomize(&mut self.rng);
        self.falling.piece.move_to(0, SPAWN_LAYER);

        self.next.color = PieceColor::random(&mut self.rng);
        self.falling.color = PieceColor::random(&mut self.rng);
    }
}
