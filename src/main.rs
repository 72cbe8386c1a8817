//! Ringtris: falling-block puzzle on a polar field in the terminal.

mod app;
mod game;
mod geometry;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use geometry::DisplayMode;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Highest accepted `--frame-rate`.
const MAX_FRAME_RATE: f64 = 240.0;

/// Options derived from the CLI, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub seed: u64,
    pub display: DisplayMode,
    pub animate: bool,
    /// Redraw / input poll period.
    pub frame_interval: Duration,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("frame rate must be greater than 0 and at most 240, got {0}")]
    InvalidFrameRate(f64),
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let rate = args.frame_rate;
        if !(rate > 0.0 && rate <= MAX_FRAME_RATE) {
            return Err(ConfigError::InvalidFrameRate(rate));
        }
        Ok(Self {
            seed: args.seed.unwrap_or_else(|| rand::rng().random()),
            display: args.display,
            animate: !args.no_animation,
            frame_interval: Duration::from_secs_f64(1.0 / rate),
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::from_args(&args)?;
    init_logging(args.log_file.as_deref())?;

    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_else(|e| {
        log::warn!("falling back to default theme: {e}");
        theme::Theme::default()
    });
    log::info!(
        "starting: seed {}, display {}, animation {}",
        config.seed,
        config.display.label(),
        config.animate
    );

    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// The terminal is in raw alternate-screen mode, so logs only go to a file.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Falling-block puzzle on a ring of sectors in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "ringtris",
    version,
    about = "Tetris on a ring: pieces fall from the rim toward the hub. Complete full rings to score.",
    long_about = "Ringtris is a terminal puzzle game played on a polar field of 8 sectors and 18 layers.\n\n\
        Pieces appear at the outer rim and fall inward one layer per tick. Move them around \
        the ring (sectors wrap) and drop them onto the hub. A layer that is occupied in every \
        sector is a full ring: it is removed and everything outside it falls inward.\n\n\
        CONTROLS:\n  Left/h      Counter-clockwise   Right/l    Clockwise\n  Down/j      Drop one layer      P          Pause\n  V           Ring/trapez view    N          New game\n  ? / F1      Help                Q / Esc    Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Seed for the piece and colour generator. Random if not set.
    #[arg(short, long, value_name = "N")]
    pub seed: Option<u64>,

    /// Segment shape: ring (round field) or trapez (octagonal field). Toggle in game with V.
    #[arg(short, long, default_value = "ring")]
    pub display: DisplayMode,

    /// Disable ring-clear animation (instant clear).
    #[arg(long)]
    pub no_animation: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write log output to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
