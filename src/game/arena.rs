//! Playfield: the sector × layer grid, collision, committing landed pieces,
//! ring clearing with compaction, and the running/paused/stopped state machine.
//!
//! Layer 0 is the hub. It is always occupied and never cleared or shifted.
//! Sectors wrap around: there are no side walls.

use super::GameEvent;
use super::piece::{MAX_HEIGHT, Piece, PieceColor};
use super::score::{Scoreboard, interval_for_level, points_for};
use super::shared::{ColoredPiece, SharedData};
use super::ticker::Ticker;
use std::fmt;
use std::time::{Duration, Instant};

/// Angular divisions of the field.
pub const SECTOR_COUNT: usize = 8;
/// Radial depth of the field, hub included.
pub const LAYER_COUNT: usize = 18;

/// `sector + delta`, wrapped into `0..SECTOR_COUNT` for any inputs.
pub fn calc_new_sector(sector: i32, delta: i32) -> usize {
    (i64::from(sector) + i64::from(delta)).rem_euclid(SECTOR_COUNT as i64) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GameOver,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Paused,
    /// Terminal.
    Stopped(StopReason),
}

/// How the UI should animate a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearKind {
    None,
    Partial,
    /// All four scanned rings at once.
    Grand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearResult {
    pub kind: ClearKind,
    /// Indexed by offset below the landing layer (0 = landing layer).
    pub lines_full: [bool; MAX_HEIGHT],
    pub count: usize,
    pub landing_layer: i32,
    /// Lowest layer that was scanned.
    pub scan_stop: i32,
    pub points: u32,
    pub level_up: Option<u32>,
}

impl ClearResult {
    /// Layers (before compaction) that were full, outermost first.
    pub fn cleared_layers(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines_full
            .iter()
            .enumerate()
            .filter(|(_, full)| **full)
            .map(|(offset, _)| (self.landing_layer - offset as i32) as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or held for an animation.
    Idle,
    /// The falling piece moved one layer inward.
    Dropped,
    /// The piece settled; `spawned` is false when the next piece had no room (game over).
    Landed { clear: ClearResult, spawned: bool },
}

type Grid<T> = [[T; LAYER_COUNT]; SECTOR_COUNT];

#[derive(Debug, Clone)]
pub struct Arena {
    occupied: Grid<bool>,
    /// Colour of each settled segment; meaningful only where `occupied`.
    colors: Grid<PieceColor>,
    shared: SharedData,
    score: Scoreboard,
    status: Status,
    ticker: Ticker,
    events: Vec<GameEvent>,
    seed: u64,
}

fn empty_grid() -> (Grid<bool>, Grid<PieceColor>) {
    let mut occupied = [[false; LAYER_COUNT]; SECTOR_COUNT];
    for column in &mut occupied {
        column[0] = true;
    }
    (occupied, [[PieceColor::default(); LAYER_COUNT]; SECTOR_COUNT])
}

impl Arena {
    pub fn new(seed: u64, now: Instant) -> Self {
        let (occupied, colors) = empty_grid();
        log::info!("new arena, seed {seed}");
        Self {
            occupied,
            colors,
            shared: SharedData::new(seed),
            score: Scoreboard::new(),
            status: Status::Running,
            ticker: Ticker::new(interval_for_level(0), now),
            events: Vec::new(),
            seed,
        }
    }

    /// Stops the current game and starts a fresh one on the same piece generator.
    pub fn new_game(&mut self, now: Instant) {
        self.stop();
        let (occupied, colors) = empty_grid();
        self.occupied = occupied;
        self.colors = colors;
        self.shared.reset();
        self.score.reset();
        self.status = Status::Running;
        self.ticker = Ticker::new(interval_for_level(0), now);
        self.events.clear();
        self.events.push(GameEvent::DataChanged);
        log::info!("new game started");
    }

    // --- queries ---

    /// Panics if the position is outside the grid.
    pub fn has_segment(&self, sector: usize, layer: usize) -> bool {
        self.occupied[sector][layer]
    }

    /// Colour of a settled segment; `None` for empty cells and the hub.
    pub fn segment_color(&self, sector: usize, layer: usize) -> Option<PieceColor> {
        (layer > 0 && self.has_segment(sector, layer)).then(|| self.colors[sector][layer])
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_paused(&self) -> bool {
        self.status == Status::Paused
    }

    /// True while ticks are held for a clear animation.
    pub fn is_animating(&self) -> bool {
        self.ticker.is_held()
    }

    pub fn falling(&self) -> &ColoredPiece {
        self.shared.falling()
    }

    pub fn next(&self) -> &ColoredPiece {
        self.shared.next()
    }

    pub fn score(&self) -> &Scoreboard {
        &self.score
    }

    pub fn interval(&self) -> Duration {
        self.ticker.interval()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Events raised since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_ring_full(&self, layer: usize) -> bool {
        self.occupied.iter().all(|column| column[layer])
    }

    // --- movement and collision ---

    /// Cells above the top layer count as blocked; cells below the hub are ignored.
    pub fn collides_with(&self, piece: &Piece, delta_sector: i32, delta_layer: i32) -> bool {
        piece
            .cells_offset(delta_sector, delta_layer)
            .any(|(sector, layer)| {
                layer >= LAYER_COUNT as i32 || (layer >= 0 && self.occupied[sector][layer as usize])
            })
    }

    /// Moves the falling piece if the target is free. Refused while paused, stopped
    /// or held for an animation.
    pub fn try_move(&mut self, delta_sector: i32, delta_layer: i32) -> bool {
        if self.status != Status::Running || self.ticker.is_held() {
            return false;
        }
        let piece = self.shared.falling().piece;
        if self.collides_with(&piece, delta_sector, delta_layer) {
            return false;
        }
        let sector = calc_new_sector(piece.sector() as i32, delta_sector);
        self.shared
            .falling_mut()
            .piece
            .move_to(sector as i32, piece.layer().saturating_add(delta_layer));
        true
    }

    /// Writes the piece into the grid. Segments at or below the hub are dropped.
    pub fn commit_piece(&mut self, piece: &Piece, color: PieceColor) {
        for (sector, layer) in piece.cells() {
            if layer > 0 {
                let layer = layer as usize;
                self.occupied[sector][layer] = true;
                self.colors[sector][layer] = color;
            }
        }
    }

    // --- ring clearing ---

    /// Scans the layers the just-landed piece could touch, removes full rings,
    /// compacts everything above them, scores, and levels up.
    ///
    /// When anything was cleared the drop timer is held until
    /// [`Arena::finish_clear_animation`] is called.
    pub fn detect_and_clear_full_rings(&mut self) -> ClearResult {
        let landing = self.shared.falling().piece.layer();
        let start = landing.min(LAYER_COUNT as i32 - 1);
        let stop = (landing - MAX_HEIGHT as i32 + 1).max(1);

        let mut lines_full = [false; MAX_HEIGHT];
        let mut count = 0usize;
        for layer in (stop..=start).rev() {
            if self.is_ring_full(layer as usize) {
                lines_full[(landing - layer) as usize] = true;
                count += 1;
            }
        }

        let kind = match count {
            0 => ClearKind::None,
            MAX_HEIGHT => ClearKind::Grand,
            _ => ClearKind::Partial,
        };
        let mut result = ClearResult {
            kind,
            lines_full,
            count,
            landing_layer: landing,
            scan_stop: stop,
            points: 0,
            level_up: None,
        };
        if count == 0 {
            return result;
        }

        self.ticker.hold();
        self.collapse(stop, landing, &lines_full, count);

        result.points = points_for(count, self.score.level());
        self.score.add_points(result.points);
        self.score.add_rings(count as u32);

        let next_level = self.score.earned_level();
        if next_level > self.score.level() {
            self.score.set_level(next_level);
            let interval = interval_for_level(next_level);
            self.ticker.set_interval(interval);
            result.level_up = Some(next_level);
            log::info!("level {next_level}, drop interval {} ms", interval.as_millis());
            self.events.push(GameEvent::LevelUp {
                level: next_level,
                interval,
            });
        }

        self.shared.falling_mut().piece.clear();

        log::info!(
            "cleared {count} ring(s) at layer {landing} ({kind:?}), +{} points",
            result.points
        );
        log::debug!("grid after clear:\n{}", self);
        self.events.push(GameEvent::RingsCleared(result));
        result
    }

    /// Drops every non-full layer from `stop` upward by the number of full rings
    /// beneath it, then empties the vacated top layers.
    fn collapse(&mut self, stop: i32, landing: i32, lines_full: &[bool; MAX_HEIGHT], count: usize) {
        let is_full = |layer: usize| {
            let offset = landing - layer as i32;
            (0..MAX_HEIGHT as i32).contains(&offset) && lines_full[offset as usize]
        };

        let mut shift = 0usize;
        for layer in stop as usize..LAYER_COUNT {
            if is_full(layer) {
                shift += 1;
            } else if shift > 0 {
                for sector in 0..SECTOR_COUNT {
                    self.occupied[sector][layer - shift] = self.occupied[sector][layer];
                    self.colors[sector][layer - shift] = self.colors[sector][layer];
                }
            }
        }

        for layer in LAYER_COUNT - count..LAYER_COUNT {
            for sector in 0..SECTOR_COUNT {
                self.occupied[sector][layer] = false;
                self.colors[sector][layer] = PieceColor::default();
            }
        }
    }

    /// Resumes the drop timer after the UI finished (or skipped) a clear animation.
    pub fn finish_clear_animation(&mut self, now: Instant) {
        self.ticker.release(now);
    }

    // --- lifecycle ---

    /// Rotates next into falling. Ends the game if the new piece has no room.
    pub fn spawn_next(&mut self) -> bool {
        self.shared.spawn_new_falling();
        self.events.push(GameEvent::DataChanged);

        let piece = self.shared.falling().piece;
        if self.collides_with(&piece, 0, 0) {
            self.status = Status::Stopped(StopReason::GameOver);
            self.ticker.halt();
            log::info!(
                "game over: {} points, level {}, {} rings",
                self.score.points(),
                self.score.level(),
                self.score.rings()
            );
            self.events.push(GameEvent::GameOver {
                points: self.score.points(),
            });
            return false;
        }
        true
    }

    /// Aborts the game. No-op once stopped.
    pub fn stop(&mut self) {
        if let Status::Stopped(_) = self.status {
            return;
        }
        self.status = Status::Stopped(StopReason::Aborted);
        self.shared.falling_mut().piece.clear();
        self.ticker.halt();
        log::info!("game stopped");
    }

    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        let next = match (self.status, paused) {
            (Status::Running, true) => Status::Paused,
            (Status::Paused, false) => Status::Running,
            _ => return,
        };
        self.status = next;
        self.ticker.set_paused(paused, now);
        log::debug!("paused: {paused}");
    }

    /// Returns whether the game is paused afterwards.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        let paused = !self.is_paused();
        self.set_paused(paused, now);
        self.is_paused()
    }

    /// One drop step: move inward, or settle, clear and spawn the next piece.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != Status::Running || self.ticker.is_held() {
            return TickOutcome::Idle;
        }
        if self.try_move(0, -1) {
            return TickOutcome::Dropped;
        }

        let falling = *self.shared.falling();
        self.commit_piece(&falling.piece, falling.color);
        let clear = self.detect_and_clear_full_rings();
        let spawned = self.spawn_next();
        TickOutcome::Landed { clear, spawned }
    }

    /// Runs [`Arena::tick`] if the drop timer is due.
    pub fn poll_tick(&mut self, now: Instant) -> Option<TickOutcome> {
        self.ticker.poll(now).then(|| self.tick())
    }

    /// Time until the next drop, if the timer is running.
    pub fn until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.ticker.remaining(now)
    }
}

/// Grid dump, outermost layer first, one `1`/`0` per sector.
impl fmt::Display for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for layer in (0..LAYER_COUNT).rev() {
            for sector in 0..SECTOR_COUNT {
                let c = if self.occupied[sector][layer] { '1' } else { '0' };
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::piece::ShapeKind;
    use crate::game::shared::SPAWN_LAYER;
    use proptest::prelude::*;

    fn arena() -> Arena {
        Arena::new(7, Instant::now())
    }

    fn fill_ring(a: &mut Arena, layer: usize) {
        for column in &mut a.occupied {
            column[layer] = true;
        }
    }

    fn ring(a: &Arena, layer: usize) -> [bool; SECTOR_COUNT] {
        std::array::from_fn(|sector| a.occupied[sector][layer])
    }

    fn place_falling(a: &mut Arena, kind: ShapeKind, sector: i32, layer: i32) {
        let falling = a.shared.falling_mut();
        falling.piece = Piece::with_shape(kind);
        falling.piece.move_to(sector, layer);
    }

    #[test]
    fn test_hub_occupied_rest_empty() {
        let a = arena();
        for sector in 0..SECTOR_COUNT {
            assert!(a.has_segment(sector, 0));
            for layer in 1..LAYER_COUNT {
                assert!(!a.has_segment(sector, layer));
            }
        }
        assert_eq!(a.status(), Status::Running);
    }

    #[test]
    fn test_calc_new_sector_examples() {
        assert_eq!(calc_new_sector(0, -1), SECTOR_COUNT - 1);
        assert_eq!(calc_new_sector(7, 1), 0);
        assert_eq!(calc_new_sector(3, -27), 0);
        assert_eq!(calc_new_sector(i32::MIN, i32::MIN), 0);
    }

    #[test]
    fn test_collision_against_hub() {
        let a = arena();
        let mut p = Piece::with_shape(ShapeKind::Single);
        p.move_to(2, 1);
        assert!(!a.collides_with(&p, 0, 0));
        assert!(a.collides_with(&p, 0, -1));
        // below the hub is never checked
        assert!(!a.collides_with(&p, 0, -5));
    }

    #[test]
    fn test_collision_above_top_layer_is_blocked() {
        let a = arena();
        let mut p = Piece::with_shape(ShapeKind::Single);
        p.move_to(0, SPAWN_LAYER);
        assert!(!a.collides_with(&p, 0, 0));
        assert!(a.collides_with(&p, 0, 1));
    }

    #[test]
    fn test_extreme_deltas_do_not_overflow() {
        let mut a = arena();
        let mut p = Piece::with_shape(ShapeKind::Single);
        p.move_to(1, 5);
        assert!(a.collides_with(&p, 0, i32::MAX));
        assert!(!a.collides_with(&p, i32::MAX, 0));
        assert!(!a.collides_with(&p, i32::MIN, i32::MIN));

        place_falling(&mut a, ShapeKind::Single, 1, 5);
        assert!(!a.try_move(0, i32::MAX));
        assert!(a.try_move(i32::MAX, 0));
        assert_eq!(a.falling().piece.sector(), calc_new_sector(1, i32::MAX));
        assert_eq!(a.falling().piece.layer(), 5);
    }

    #[test]
    fn test_try_move_wraps_around() {
        let mut a = arena();
        place_falling(&mut a, ShapeKind::Pair, 0, 10);
        assert!(a.try_move(-1, 0));
        assert_eq!(a.falling().piece.sector(), SECTOR_COUNT - 1);
        for _ in 0..SECTOR_COUNT {
            assert!(a.try_move(1, 0));
        }
        assert_eq!(a.falling().piece.sector(), SECTOR_COUNT - 1);
    }

    #[test]
    fn test_try_move_blocked_leaves_piece() {
        let mut a = arena();
        place_falling(&mut a, ShapeKind::Single, 3, 5);
        a.occupied[4][5] = true;
        assert!(!a.try_move(1, 0));
        assert_eq!((a.falling().piece.sector(), a.falling().piece.layer()), (3, 5));
        assert!(a.try_move(0, -1));
        assert_eq!(a.falling().piece.layer(), 4);
    }

    #[test]
    fn test_try_move_refused_while_paused() {
        let mut a = arena();
        let now = Instant::now();
        a.toggle_pause(now);
        assert!(!a.try_move(1, 0));
        a.toggle_pause(now);
        assert!(a.try_move(1, 0));
    }

    #[test]
    fn test_commit_skips_hub_and_below() {
        let mut a = arena();
        let mut tower = Piece::with_shape(ShapeKind::Tower);
        tower.move_to(6, 2);
        a.commit_piece(&tower, PieceColor::new(1, 2, 3));
        assert!(a.has_segment(6, 2));
        assert!(a.has_segment(6, 1));
        assert_eq!(a.segment_color(6, 2), Some(PieceColor::new(1, 2, 3)));
        assert_eq!(a.segment_color(6, 0), None);
        assert!(!a.has_segment(5, 1));
    }

    #[test]
    fn test_three_full_rings_collapse() {
        let mut a = arena();
        a.occupied[2][1] = true;
        a.occupied[5][2] = true;
        for layer in 3..=5 {
            fill_ring(&mut a, layer);
        }
        for sector in 0..4 {
            a.occupied[sector][6] = true;
        }
        a.occupied[5][7] = true;
        a.occupied[2][8] = true;
        a.colors[2][8] = PieceColor::new(9, 9, 9);
        a.occupied[1][17] = true;
        place_falling(&mut a, ShapeKind::Tower, 0, 6);

        let before: Vec<_> = (0..LAYER_COUNT).map(|l| ring(&a, l)).collect();
        let result = a.detect_and_clear_full_rings();

        assert_eq!(result.kind, ClearKind::Partial);
        assert_eq!(result.count, 3);
        assert_eq!(result.lines_full, [false, true, true, true]);
        assert_eq!(result.cleared_layers().collect::<Vec<_>>(), vec![5, 4, 3]);
        assert_eq!(result.points, 300);

        // below the cleared rings: untouched
        assert_eq!(ring(&a, 1), before[1]);
        assert_eq!(ring(&a, 2), before[2]);
        // everything above moved down by three
        for layer in 3..LAYER_COUNT - 3 {
            assert_eq!(ring(&a, layer), before[layer + 3], "layer {layer}");
        }
        assert_eq!(a.segment_color(2, 5), Some(PieceColor::new(9, 9, 9)));
        for layer in LAYER_COUNT - 3..LAYER_COUNT {
            assert_eq!(ring(&a, layer), [false; SECTOR_COUNT]);
        }
        assert!(a.falling().piece.is_empty());
        assert!(a.is_animating());
    }

    #[test]
    fn test_scan_window_clamped_at_hub() {
        let mut a = arena();
        fill_ring(&mut a, 1);
        a.occupied[3][2] = true;
        a.occupied[4][3] = true;
        place_falling(&mut a, ShapeKind::CornerLeft, 0, 2);

        let result = a.detect_and_clear_full_rings();

        assert_eq!(result.scan_stop, 1);
        assert_eq!(result.count, 1);
        assert_eq!(result.lines_full, [false, true, false, false]);
        assert!(a.has_segment(3, 1));
        assert!(a.has_segment(4, 2));
        assert_eq!(ring(&a, 3), [false; SECTOR_COUNT]);
        assert_eq!(ring(&a, 0), [true; SECTOR_COUNT]);
    }

    #[test]
    fn test_full_ring_outside_window_is_ignored() {
        let mut a = arena();
        fill_ring(&mut a, 1);
        place_falling(&mut a, ShapeKind::Single, 0, 9);
        let result = a.detect_and_clear_full_rings();
        assert_eq!(result.kind, ClearKind::None);
        assert_eq!(ring(&a, 1), [true; SECTOR_COUNT]);
    }

    #[test]
    fn test_grand_clear_at_level_two() {
        let mut a = arena();
        a.score.add_rings(20);
        a.score.set_level(2);
        for layer in 1..=4 {
            fill_ring(&mut a, layer);
        }
        a.occupied[7][5] = true;
        place_falling(&mut a, ShapeKind::Tower, 0, 4);

        let result = a.detect_and_clear_full_rings();

        assert_eq!(result.kind, ClearKind::Grand);
        assert_eq!(result.points, 3600);
        assert_eq!(a.score().points(), 3600);
        assert_eq!(a.score().rings(), 24);
        assert!(a.has_segment(7, 1));
        for layer in 2..LAYER_COUNT {
            assert_eq!(ring(&a, layer), [false; SECTOR_COUNT]);
        }
    }

    #[test]
    fn test_single_ring_level_zero_scores_forty() {
        let mut a = arena();
        fill_ring(&mut a, 1);
        place_falling(&mut a, ShapeKind::Single, 0, 1);
        let result = a.detect_and_clear_full_rings();
        assert_eq!(result.points, 40);
        assert_eq!(a.score().rings(), 1);
    }

    #[test]
    fn test_second_clear_is_noop() {
        let mut a = arena();
        for layer in 1..=2 {
            fill_ring(&mut a, layer);
        }
        a.occupied[0][3] = true;
        place_falling(&mut a, ShapeKind::Pair, 0, 3);
        let first = a.detect_and_clear_full_rings();
        assert_eq!(first.count, 2);
        let grid_after = a.occupied;
        let score_after = *a.score();

        let second = a.detect_and_clear_full_rings();
        assert_eq!(second.kind, ClearKind::None);
        assert_eq!(second.count, 0);
        assert_eq!(a.occupied, grid_after);
        assert_eq!(*a.score(), score_after);
    }

    #[test]
    fn test_level_up_after_ten_rings() {
        let mut a = arena();
        let now = Instant::now();
        for round in 0..3 {
            for layer in 1..=4 {
                fill_ring(&mut a, layer);
            }
            place_falling(&mut a, ShapeKind::Tower, 0, 4);
            let result = a.detect_and_clear_full_rings();
            a.finish_clear_animation(now);
            if round < 2 {
                assert_eq!(result.level_up, None);
            } else {
                assert_eq!(result.level_up, Some(1));
            }
        }
        assert_eq!(a.score().rings(), 12);
        assert_eq!(a.score().level(), 1);
        assert_eq!(a.interval(), Duration::from_millis(1400));
        let events = a.drain_events();
        assert!(events.contains(&GameEvent::LevelUp {
            level: 1,
            interval: Duration::from_millis(1400)
        }));
    }

    #[test]
    fn test_fast_levels_clamp_interval() {
        let mut a = arena();
        a.score.add_rings(149);
        a.score.set_level(14);
        fill_ring(&mut a, 1);
        place_falling(&mut a, ShapeKind::Single, 0, 1);
        let result = a.detect_and_clear_full_rings();
        assert_eq!(result.level_up, Some(15));
        assert_eq!(a.interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_spawn_on_empty_field_is_fine() {
        let mut a = arena();
        for _ in 0..30 {
            assert!(a.spawn_next());
        }
        assert_eq!(a.status(), Status::Running);
    }

    #[test]
    fn test_spawn_into_occupied_top_ends_game() {
        let mut a = arena();
        a.occupied[0][LAYER_COUNT - 1] = true;
        assert!(!a.spawn_next());
        assert_eq!(a.status(), Status::Stopped(StopReason::GameOver));
        assert!(!a.try_move(1, 0));
        assert_eq!(a.tick(), TickOutcome::Idle);
        let events = a.drain_events();
        assert_eq!(events.last(), Some(&GameEvent::GameOver { points: 0 }));
    }

    #[test]
    fn test_tick_drops_then_lands_on_hub() {
        let mut a = arena();
        place_falling(&mut a, ShapeKind::Triple, 2, SPAWN_LAYER);
        let mut drops = 0;
        let outcome = loop {
            match a.tick() {
                TickOutcome::Dropped => drops += 1,
                other => break other,
            }
        };
        assert_eq!(drops, SPAWN_LAYER - 1);
        match outcome {
            TickOutcome::Landed { clear, spawned } => {
                assert_eq!(clear.kind, ClearKind::None);
                assert!(spawned);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(a.has_segment(2, 1) && a.has_segment(3, 1) && a.has_segment(4, 1));
        assert_eq!(a.falling().piece.layer(), SPAWN_LAYER);
        assert!(a.drain_events().contains(&GameEvent::DataChanged));
    }

    #[test]
    fn test_clear_holds_ticks_until_animation_done() {
        let mut a = arena();
        for sector in 1..SECTOR_COUNT {
            a.occupied[sector][1] = true;
        }
        place_falling(&mut a, ShapeKind::Single, 0, 1);
        let outcome = a.tick();
        assert!(matches!(outcome, TickOutcome::Landed { clear, .. } if clear.count == 1));
        assert!(a.is_animating());
        assert_eq!(a.tick(), TickOutcome::Idle);
        assert!(!a.try_move(1, 0));
        a.finish_clear_animation(Instant::now());
        assert_eq!(a.tick(), TickOutcome::Dropped);
    }

    #[test]
    fn test_unpause_during_animation_defers_resume() {
        let mut a = arena();
        let now = Instant::now();
        a.ticker.hold();
        a.toggle_pause(now);
        a.toggle_pause(now);
        assert_eq!(a.status(), Status::Running);
        assert!(a.until_next_tick(now).is_none());
        a.finish_clear_animation(now);
        assert!(a.until_next_tick(now).is_some());
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut a = arena();
        let now = Instant::now();
        a.stop();
        assert_eq!(a.status(), Status::Stopped(StopReason::Aborted));
        assert!(a.falling().piece.is_empty());
        a.toggle_pause(now);
        assert_eq!(a.status(), Status::Stopped(StopReason::Aborted));
        assert_eq!(a.poll_tick(now + Duration::from_secs(60)), None);
    }

    #[test]
    fn test_new_game_resets_everything() {
        let mut a = arena();
        let now = Instant::now();
        fill_ring(&mut a, 1);
        place_falling(&mut a, ShapeKind::Single, 0, 1);
        a.detect_and_clear_full_rings();
        a.occupied[3][9] = true;
        a.new_game(now);
        assert_eq!(a.status(), Status::Running);
        assert_eq!(*a.score(), Scoreboard::default());
        assert!(!a.has_segment(3, 9));
        assert!(!a.is_animating());
        assert_eq!(a.interval(), Duration::from_millis(1500));
        assert_eq!(a.drain_events(), vec![GameEvent::DataChanged]);
    }

    #[test]
    fn test_poll_tick_respects_interval() {
        let t0 = Instant::now();
        let mut a = Arena::new(3, t0);
        assert_eq!(a.poll_tick(t0 + Duration::from_millis(1000)), None);
        assert_eq!(
            a.poll_tick(t0 + Duration::from_millis(1500)),
            Some(TickOutcome::Dropped)
        );
    }

    #[test]
    fn test_display_dump() {
        let a = arena();
        let dump = a.to_string();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), LAYER_COUNT);
        assert_eq!(lines[LAYER_COUNT - 1].trim(), "1 1 1 1 1 1 1 1");
        assert_eq!(lines[0].trim(), "0 0 0 0 0 0 0 0");
    }

    proptest! {
        #[test]
        fn prop_calc_new_sector_in_range(s in any::<i32>(), d in any::<i32>()) {
            prop_assert!(calc_new_sector(s, d) < SECTOR_COUNT);
        }

        #[test]
        fn prop_collides_iff_overlap(
            bits in prop::collection::vec(any::<bool>(), SECTOR_COUNT * LAYER_COUNT),
            shape in 0..ShapeKind::ALL.len(),
            sector in 0..SECTOR_COUNT as i32,
            layer in 0..LAYER_COUNT as i32,
            ds in any::<i32>(),
            dl in any::<i32>(),
        ) {
            let mut a = arena();
            for (idx, bit) in bits.iter().enumerate() {
                let (s, l) = (idx / LAYER_COUNT, idx % LAYER_COUNT);
                if l > 0 {
                    a.occupied[s][l] = *bit;
                }
            }
            let kind = ShapeKind::ALL[shape];
            let mut p = Piece::with_shape(kind);
            p.move_to(sector, layer);

            let expected = kind.cells().iter().any(|&(i, k)| {
                let s = (i64::from(sector) + i64::from(ds) + i as i64)
                    .rem_euclid(SECTOR_COUNT as i64) as usize;
                let l = i64::from(layer) + i64::from(dl) - k as i64;
                l >= LAYER_COUNT as i64 || (l >= 0 && a.occupied[s][l as usize])
            });
            prop_assert_eq!(a.collides_with(&p, ds, dl), expected);
        }

        #[test]
        fn prop_commit_then_query(
            shape in 0..ShapeKind::ALL.len(),
            sector in -30i32..30,
            layer in 0..LAYER_COUNT as i32,
        ) {
            let mut a = arena();
            let mut p = Piece::with_shape(ShapeKind::ALL[shape]);
            p.move_to(sector, layer);
            a.commit_piece(&p, PieceColor::new(10, 20, 30));
            for (s, l) in p.cells() {
                if l > 0 {
                    prop_assert!(a.has_segment(s, l as usize));
                    prop_assert_eq!(a.segment_color(s, l as usize), Some(PieceColor::new(10, 20, 30)));
                }
            }
            prop_assert_eq!(ring(&a, 0), [true; SECTOR_COUNT]);
            prop_assert_eq!(a.segment_color(0, 0), None);
        }
    }
}
