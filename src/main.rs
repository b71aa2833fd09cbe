//! Tetris 2048 in the terminal.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tetris_2048::app::{App, AppOptions};
use tetris_2048::config::{DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, Difficulty, GameConfig};
use tetris_2048::highscores::{BestScoreStore, FileStore, MemoryStore};
use tetris_2048::piece::PieceSet;
use tetris_2048::theme::Theme;
use tetris_2048::tile::{DEFAULT_TILE_CAP, TileCap};
use tetris_2048::RowInsertion;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.game_config();
    config.validate()?;
    let theme = Theme::load(args.theme.as_deref()).unwrap_or_default();
    let store: Box<dyn BestScoreStore> = if args.no_save {
        Box::new(MemoryStore::default())
    } else {
        match &args.best_score_file {
            Some(path) => Box::new(FileStore::new(path)),
            None => Box::new(FileStore::at_default_path()),
        }
    };
    let options = AppOptions {
        no_menu: args.no_menu,
        no_animation: args.no_animation,
    };
    let mut app = App::new(config, options, theme, store)?;
    app.run()?;
    Ok(())
}

/// Tetris 2048: Tetris pieces made of 2048 tiles.
#[derive(Debug, Parser)]
#[command(
    name = "tetris-2048",
    version,
    about = "Tetris with 2048 tiles in the terminal. Equal tiles stacked vertically merge; full rows clear.",
    long_about = "Tetris 2048 is a terminal puzzle game mixing Tetris and 2048.\n\n\
        Every piece is made of numbered tiles (2 or 4). When a piece lands its tiles join the \
        grid; a tile sitting on an equal tile merges into it (the lower one doubles) and you \
        score the new value. Loose tiles keep falling. A full row clears for the sum of its \
        numbers. The game ends when a piece locks above the top.\n\n\
        CONTROLS:\n  Left/Right  Move    Down       Soft drop   Space      Hard drop\n  \
        A / D       Rotate CCW / CW   P  Pause   S  Stop   Q / Esc  Quit\n\n\
        CONTROLS (vim):\n  h/l         Move    k          Rotate CW   u          Rotate CCW\n  \
        j           Soft drop\n\n\
        Use --theme to load a btop-style theme file."
)]
pub struct Args {
    /// Difficulty: easy (400 ms frames, ghost), medium (250 ms, ghost), hard (150 ms, no ghost).
    #[arg(short, long, default_value = "easy")]
    pub difficulty: Difficulty,

    /// Grid width in columns (8-20).
    #[arg(long, default_value_t = DEFAULT_GRID_WIDTH, value_name = "COLS")]
    pub width: u16,

    /// Grid height in rows (16-24).
    #[arg(long, default_value_t = DEFAULT_GRID_HEIGHT, value_name = "ROWS")]
    pub height: u16,

    /// Piece set: classic (I, O, Z) or full (all seven tetrominoes).
    #[arg(long, default_value = "classic")]
    pub pieces: PieceSet,

    /// Largest tile a merge can produce (power of two).
    #[arg(long, default_value_t = DEFAULT_TILE_CAP, value_name = "N")]
    pub tile_cap: u32,

    /// Let tiles merge past the cap without limit.
    #[arg(long, conflicts_with = "tile_cap")]
    pub no_tile_cap: bool,

    /// After a row clear, insert the empty row just below the top row instead of on top.
    #[arg(long)]
    pub legacy_row_insert: bool,

    /// Seed for pieces and tile numbers (reproducible games).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the 2048 palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Best score file. Defaults to $XDG_CONFIG_HOME/tetris-2048/best_score.
    #[arg(long, value_name = "FILE")]
    pub best_score_file: Option<PathBuf>,

    /// Do not read or write the best score file.
    #[arg(long, conflicts_with = "best_score_file")]
    pub no_save: bool,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the row-clear flash.
    #[arg(long)]
    pub no_animation: bool,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            width: self.width,
            height: self.height,
            difficulty: self.difficulty,
            pieces: self.pieces,
            tile_cap: if self.no_tile_cap {
                TileCap::Uncapped
            } else {
                TileCap::Capped(self.tile_cap)
            },
            row_insertion: if self.legacy_row_insert {
                RowInsertion::BelowTop
            } else {
                RowInsertion::Top
            },
            seed: self.seed,
        }
    }
}
