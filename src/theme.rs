//! Colours: the 2048 tile palette, UI colours, and btop-style theme files.
//!
//! A theme file holds lines like `theme[main_fg]="#FFFFFF"`. Recognised keys
//! are btop's `meter_bg`, `div_line`, `main_fg`, `title`, `inactive_fg`, plus
//! `tile_2` .. `tile_2048` for tile backgrounds.

use crate::tile::{TILE_COLOR_SLOTS, Tile};
use ratatui::style::Color;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Background/foreground for 2, 4, 8 ... 2048 (classic 2048 palette).
const TILE_COLORS: [(Color, Color); TILE_COLOR_SLOTS] = [
    (Color::Rgb(238, 228, 218), Color::Rgb(138, 129, 120)),
    (Color::Rgb(236, 224, 200), Color::Rgb(138, 129, 120)),
    (Color::Rgb(243, 177, 121), Color::Rgb(255, 255, 255)),
    (Color::Rgb(245, 150, 98), Color::Rgb(255, 255, 255)),
    (Color::Rgb(249, 123, 97), Color::Rgb(255, 255, 255)),
    (Color::Rgb(245, 100, 60), Color::Rgb(255, 255, 255)),
    (Color::Rgb(237, 207, 114), Color::Rgb(255, 255, 255)),
    (Color::Rgb(237, 203, 99), Color::Rgb(255, 255, 255)),
    (Color::Rgb(238, 201, 84), Color::Rgb(255, 255, 255)),
    (Color::Rgb(239, 196, 64), Color::Rgb(255, 255, 255)),
    (Color::Rgb(238, 194, 45), Color::Rgb(255, 255, 255)),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// (background, number) per tile colour slot.
    pub tiles: [(Color, Color); TILE_COLOR_SLOTS],
    /// Empty board cells.
    pub board_bg: Color,
    pub border: Color,
    /// Score and body text.
    pub text: Color,
    /// Titles, selections, key hints.
    pub accent: Color,
    /// Secondary text and the ghost piece.
    pub muted: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("reading theme {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a hex colour: {0:?}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            tiles: TILE_COLORS,
            board_bg: Color::Rgb(206, 195, 181),
            border: Color::Rgb(132, 122, 113),
            text: Color::Rgb(255, 255, 255),
            accent: Color::Rgb(25, 255, 228),
            muted: Color::Rgb(167, 160, 151),
        }
    }
}

impl Theme {
    /// Built-in palette when `path` is `None` or missing; otherwise the file's
    /// colours over the defaults. Unknown keys and bad values are ignored.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let Some(path) = path.filter(|p| p.exists()) else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ThemeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_theme_text(&text))
    }

    fn from_theme_text(text: &str) -> Self {
        let mut theme = Self::default();
        for (key, value) in theme_entries(text) {
            let Ok(color) = parse_hex(value) else { continue };
            match key {
                "meter_bg" => theme.board_bg = color,
                "div_line" => theme.border = color,
                "main_fg" => theme.text = color,
                "title" => theme.accent = color,
                "inactive_fg" => theme.muted = color,
                _ => {
                    if let Some(slot) = tile_slot(key) {
                        theme.tiles[slot].0 = color;
                    }
                }
            }
        }
        theme
    }

    /// (background, number) colours for `tile`.
    #[inline]
    pub fn tile_colors(&self, tile: Tile) -> (Color, Color) {
        self.tiles[tile.color_index()]
    }
}

/// `tile_64` -> colour slot of a 64 tile. Only exact powers of two in the palette.
fn tile_slot(key: &str) -> Option<usize> {
    let n: u32 = key.strip_prefix("tile_")?.parse().ok()?;
    let in_palette =
        n.is_power_of_two() && (1..=TILE_COLOR_SLOTS).contains(&(n.ilog2() as usize));
    in_palette.then(|| Tile::new(n).color_index())
}

/// `(key, value)` pairs from `theme[key]="value"` lines; quotes are optional.
fn theme_entries(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.lines().filter_map(|line| {
        let rest = line.trim().strip_prefix("theme[")?;
        let (key, value) = rest.split_once(']')?;
        let value = value.trim_start().strip_prefix('=')?.trim();
        let value = value.trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then_some((key.trim(), value))
    })
}

/// `#RRGGBB` or `#RGB` (the `#` is optional).
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let digits = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let rgb = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
    let [_, r, g, b] = match digits.len() {
        6 => rgb.to_be_bytes(),
        3 => {
            // Each short digit repeats: #abc == #aabbcc.
            let expand = |nibble: u32| (nibble & 0xF) as u8 * 17;
            [0, expand(rgb >> 8), expand(rgb >> 4), expand(rgb)]
        }
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
