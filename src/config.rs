//! Game configuration: grid size bounds, difficulty tiers and rule policies.

use crate::grid::{GridRules, RowInsertion};
use crate::piece::PieceSet;
use crate::tile::TileCap;
use clap::ValueEnum;
use std::time::Duration;
use thiserror::Error;

pub const MIN_GRID_WIDTH: u16 = 8;
pub const MAX_GRID_WIDTH: u16 = 20;
pub const MIN_GRID_HEIGHT: u16 = 16;
pub const MAX_GRID_HEIGHT: u16 = 24;
pub const DEFAULT_GRID_WIDTH: u16 = 14;
pub const DEFAULT_GRID_HEIGHT: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Time between frames: one auto-fall step and one merge pass each.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(match self {
            Self::Easy => 400,
            Self::Medium => 250,
            Self::Hard => 150,
        })
    }

    /// The landing preview is a help for the two easier tiers only.
    pub fn shows_ghost(&self) -> bool {
        !matches!(self, Self::Hard)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid width {0} outside {min}..={max}", min = MIN_GRID_WIDTH, max = MAX_GRID_WIDTH)]
    Width(u16),
    #[error("grid height {0} outside {min}..={max}", min = MIN_GRID_HEIGHT, max = MAX_GRID_HEIGHT)]
    Height(u16),
    #[error("tile cap must be a power of two of at least 4 (got {0})")]
    TileCap(u32),
}

/// Everything needed to start a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub width: u16,
    pub height: u16,
    pub difficulty: Difficulty,
    pub pieces: PieceSet,
    pub tile_cap: TileCap,
    pub row_insertion: RowInsertion,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            difficulty: Difficulty::default(),
            pieces: PieceSet::default(),
            tile_cap: TileCap::default(),
            row_insertion: RowInsertion::default(),
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_GRID_WIDTH..=MAX_GRID_WIDTH).contains(&self.width) {
            return Err(ConfigError::Width(self.width));
        }
        if !(MIN_GRID_HEIGHT..=MAX_GRID_HEIGHT).contains(&self.height) {
            return Err(ConfigError::Height(self.height));
        }
        if let TileCap::Capped(limit) = self.tile_cap {
            if limit < 4 || !limit.is_power_of_two() {
                return Err(ConfigError::TileCap(limit));
            }
        }
        Ok(())
    }

    pub fn grid_rules(&self) -> GridRules {
        GridRules {
            tile_cap: self.tile_cap,
            row_insertion: self.row_insertion,
        }
    }
}
