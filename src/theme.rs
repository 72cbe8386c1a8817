//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.
//!
//! Piece colours are random per piece and not themable; the theme covers the
//! field background, hub, grid shading and the sidebar text.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Playfield background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (points, level, rings).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Hints and secondary text.
    pub inactive_fg: Color,
    /// Layer 0 disk.
    pub hub: Color,
    /// Checkerboard shade for empty segments.
    pub grid: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("cannot read theme file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark values, as in btop's onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
            hub: Color::Rgb(0x61, 0xAF, 0xEF),
            grid: Color::Rgb(0x2B, 0x2F, 0x38),
        }
    }

    /// Load a btop-style theme file. `None` means the built-in One Dark theme.
    /// Keys missing from the file keep their One Dark value.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        Ok(Self::from_map(&map))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str], fallback: Color| {
            keys.iter()
                .find_map(|key| map.get(*key).and_then(|v| parse_hex(v).ok()))
                .unwrap_or(fallback)
        };
        let d = Self::onedark_default();
        Self {
            bg: get(&["meter_bg", "main_bg"], d.bg),
            div_line: get(&["div_line"], d.div_line),
            main_fg: get(&["main_fg"], d.main_fg),
            title: get(&["title"], d.title),
            inactive_fg: get(&["inactive_fg"], d.inactive_fg),
            hub: get(&["cpu_box", "hi_fg"], d.hub),
            grid: get(&["selected_bg", "div_line"], d.grid),
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

fn hex_digits(s: &str) -> Result<u8, ThemeError> {
    u8::from_str_radix(s, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let (r, g, b) = match s.len() {
        6 => (hex_digits(&s[0..2])?, hex_digits(&s[2..4])?, hex_digits(&s[4..6])?),
        3 => (
            hex_digits(&s[0..1])? * 17,
            hex_digits(&s[1..2])? * 17,
            hex_digits(&s[2..3])? * 17,
        ),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}
