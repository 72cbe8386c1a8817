//! Points, level and cleared-ring counters with saturating arithmetic.

use std::time::Duration;

/// Ceiling for every counter; additions past it clamp here.
pub const SATURATION: u32 = 999_999_999;

/// Rings needed per level.
pub const RINGS_PER_LEVEL: u32 = 10;

/// Drop interval at level 0 (ms).
pub const BASE_INTERVAL_MS: u64 = 1500;
/// Each level shortens the drop interval by this much (ms).
pub const INTERVAL_STEP_MS: u64 = 100;
/// From this level on the interval stays at [`MIN_INTERVAL_MS`].
pub const FASTEST_LEVEL: u32 = 15;
pub const MIN_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scoreboard {
    points: u32,
    level: u32,
    rings: u32,
}

fn saturating_add(current: u32, n: u32) -> u32 {
    current.checked_add(n).map_or(SATURATION, |sum| sum.min(SATURATION))
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn rings(&self) -> u32 {
        self.rings
    }

    pub fn add_points(&mut self, n: u32) {
        self.points = saturating_add(self.points, n);
    }

    pub fn add_rings(&mut self, n: u32) {
        self.rings = saturating_add(self.rings, n);
    }

    /// Callers only ever raise the level.
    pub fn set_level(&mut self, level: u32) {
        debug_assert!(level >= self.level, "level must not decrease");
        self.level = level.min(SATURATION);
    }

    /// Level the current ring total entitles the player to.
    pub fn earned_level(&self) -> u32 {
        self.rings / RINGS_PER_LEVEL
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Points for clearing `rings` rings at once at `level`.
pub fn points_for(rings: usize, level: u32) -> u32 {
    let base: u32 = match rings {
        1 => 40,
        2 => 100,
        3 => 300,
        4 => 1200,
        _ => 0,
    };
    level.saturating_add(1).saturating_mul(base)
}

/// Drop interval for a level.
pub fn interval_for_level(level: u32) -> Duration {
    let ms = if level >= FASTEST_LEVEL {
        MIN_INTERVAL_MS
    } else {
        BASE_INTERVAL_MS - u64::from(level) * INTERVAL_STEP_MS
    };
    Duration::from_millis(ms)
}
