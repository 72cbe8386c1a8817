//! Polar projection: which (sector, layer) a terminal pixel belongs to.
//!
//! Pixels are half-block cells (one column wide, half a row tall), so they are
//! close to square. Angles run clockwise from 12 o'clock; sector 0 starts there.

use crate::game::{LAYER_COUNT, SECTOR_COUNT};
use clap::ValueEnum;
use std::f32::consts::{PI, TAU};

/// Shape of the drawn segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DisplayMode {
    /// Annular sectors: the field is a disk.
    #[default]
    Ring,
    /// Chord-bounded segments: the field is an octagon.
    #[value(alias = "trapezoid")]
    Trapez,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ring => Self::Trapez,
            Self::Trapez => Self::Ring,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ring => "ring",
            Self::Trapez => "trapez",
        }
    }
}

const SECTOR_ANGLE: f32 = TAU / SECTOR_COUNT as f32;

/// Sector and layer of a point `(dx, dy)` relative to the centre (y grows downward),
/// for segments `segment_width` pixels deep. Layer 0 is the hub. `None` outside the field.
pub fn locate(mode: DisplayMode, dx: f32, dy: f32, segment_width: f32) -> Option<(usize, usize)> {
    let phi = dx.atan2(-dy).rem_euclid(TAU);
    let sector = ((phi / SECTOR_ANGLE) as usize).min(SECTOR_COUNT - 1);
    let r = dx.hypot(dy);

    let depth = match mode {
        DisplayMode::Ring => r / segment_width,
        DisplayMode::Trapez => {
            let bisector = (sector as f32 + 0.5) * SECTOR_ANGLE;
            let along = r * (phi - bisector).cos();
            along / (segment_width * (PI / SECTOR_COUNT as f32).cos())
        }
    };
    let layer = depth as usize;
    (layer < LAYER_COUNT).then_some((sector, layer))
}

/// Playfield pixel grid fitted into a terminal area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub mode: DisplayMode,
    /// Pixels per layer.
    pub segment: u16,
}

impl Projection {
    /// Largest whole segment width whose field fits `cols` × `rows` terminal cells (at least 1).
    pub fn fit(mode: DisplayMode, cols: u16, rows: u16) -> Self {
        let pixels = cols.min(rows.saturating_mul(2));
        let segment = (pixels / (2 * LAYER_COUNT as u16)).max(1);
        Self { mode, segment }
    }

    /// Field width and height in pixels.
    pub fn diameter(&self) -> u16 {
        2 * LAYER_COUNT as u16 * self.segment
    }

    /// Field size in terminal cells (columns, rows).
    pub fn cell_size(&self) -> (u16, u16) {
        let d = self.diameter();
        (d, d / 2)
    }

    /// Segment under pixel `(px, py)`, sampled at the pixel centre.
    pub fn locate_pixel(&self, px: u16, py: u16) -> Option<(usize, usize)> {
        let half = self.diameter() as f32 / 2.0;
        let dx = px as f32 + 0.5 - half;
        let dy = py as f32 + 0.5 - half;
        locate(self.mode, dx, dy, self.segment as f32)
    }
}
