//! Game core: polar field, pieces, scoring and the drop timer. Knows nothing about terminals.

pub mod arena;
pub mod piece;
pub mod score;
pub mod shared;
pub mod ticker;

pub use arena::{Arena, ClearKind, ClearResult, LAYER_COUNT, SECTOR_COUNT, Status, StopReason};
pub use piece::{MAX_HEIGHT, PieceColor};

use std::time::Duration;

/// Notifications for the front end, collected with [`Arena::drain_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Falling or next piece (or the score) changed; redraw the sidebar.
    DataChanged,
    /// Rings were removed. Ticks are held until the animation is finished.
    RingsCleared(ClearResult),
    LevelUp { level: u32, interval: Duration },
    GameOver { points: u32 },
}
