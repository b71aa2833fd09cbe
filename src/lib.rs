//! Tetris 2048: falling pieces of numbered tiles that merge like 2048.
//!
//! The engine (`tile`, `grid`, `piece`, `game`) has no terminal dependency;
//! `app` and `ui` put it on screen with ratatui.

pub mod app;
pub mod config;
pub mod game;
pub mod grid;
pub mod highscores;
pub mod input;
pub mod piece;
pub mod theme;
pub mod tile;
pub mod ui;

pub use config::{ConfigError, Difficulty, GameConfig};
pub use game::{FrameReport, GameState};
pub use grid::{Grid, GridError, GridRules, Position, RowInsertion};
pub use highscores::{BestScoreStore, FileStore, MemoryStore};
pub use input::{Action, InputQueue};
pub use piece::{Piece, PieceKind, PiecePolicy, PieceSet, RandomPolicy, SequencePolicy};
pub use tile::{Tile, TileCap};
