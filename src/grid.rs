//! Committed board state: lock-in, merge cascade, row clear, game over.

use crate::tile::{Tile, TileCap};
use thiserror::Error;

/// Grid coordinate: `x` is the column, `y` the row; row 0 is the bottom.
/// Rows at or above the grid height are legal for pieces still above the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Where the replacement empty row goes after a full row is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowInsertion {
    /// Above everything else; rows above the cleared one drop by one.
    #[default]
    Top,
    /// Just below the topmost row, which stays where it is (legacy behaviour).
    BelowTop,
}

/// Rule knobs fixed at grid construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridRules {
    pub tile_cap: TileCap,
    pub row_insertion: RowInsertion,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be positive (got {width}x{height})")]
    InvalidDimensions { width: usize, height: usize },
}

/// Board of `height` rows by `width` columns. `rows[0]` is the bottom row.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    rows: Vec<Vec<Option<Tile>>>,
    rules: GridRules,
    score: u32,
    game_over: bool,
}

impl Grid {
    pub fn new(width: usize, height: usize, rules: GridRules) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            rows: vec![vec![None; width]; height],
            rules,
            score: 0,
            game_over: false,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[inline]
    pub fn is_inside(&self, row: i32, col: i32) -> bool {
        row >= 0 && (row as usize) < self.height && col >= 0 && (col as usize) < self.width
    }

    /// False outside the grid, including above the top row.
    #[inline]
    pub fn is_occupied(&self, row: i32, col: i32) -> bool {
        self.is_inside(row, col) && self.rows[row as usize][col as usize].is_some()
    }

    #[inline]
    pub fn tile(&self, row: usize, col: usize) -> Option<Tile> {
        self.rows.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn tile_count(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Commit a landed piece. `tiles` rows run top-to-bottom and `anchor` is the
    /// grid position of its bottom-left cell. Tiles that land outside the grid end
    /// the game and are dropped; the rest are still stored.
    /// Returns the game-over flag.
    pub fn lock(&mut self, tiles: &[Vec<Option<Tile>>], anchor: Position) -> bool {
        if self.game_over {
            return true;
        }
        let n_rows = tiles.len() as i32;
        for (r, row) in tiles.iter().enumerate() {
            for (c, slot) in row.iter().enumerate() {
                let Some(tile) = slot else { continue };
                let x = anchor.x + c as i32;
                let y = anchor.y + (n_rows - 1 - r as i32);
                if self.is_inside(y, x) {
                    let cell = &mut self.rows[y as usize][x as usize];
                    debug_assert!(cell.is_none(), "lock overwrote tile at row {y}, col {x}");
                    *cell = Some(*tile);
                } else {
                    self.game_over = true;
                }
            }
        }
        self.game_over
    }

    /// One frame of 2048 behaviour. Equal vertical neighbours merge (lower tile
    /// doubles, everything above drops by one) until a full sweep finds nothing
    /// left to merge; then every isolated tile above the floor falls one row.
    /// Returns the points added.
    pub fn merge_and_collapse(&mut self) -> u32 {
        self.merge_and_collapse_around(&[])
    }

    /// Like [`Grid::merge_and_collapse`], but no tile moves into a `blocked`
    /// cell (the falling piece). A tile whose way down is blocked stays put.
    pub fn merge_and_collapse_around(&mut self, blocked: &[Position]) -> u32 {
        if self.game_over {
            return 0;
        }
        let mut gained = 0u32;
        loop {
            let (merges, points) = self.merge_sweep(blocked);
            gained = gained.saturating_add(points);
            if merges == 0 {
                break;
            }
        }
        self.compact_isolated(blocked);
        self.score = self.score.saturating_add(gained);
        gained
    }

    /// Single bottom-up pass over every column. Returns (merge count, points).
    fn merge_sweep(&mut self, blocked: &[Position]) -> (usize, u32) {
        let cap = self.rules.tile_cap;
        let mut merges = 0;
        let mut points = 0u32;
        for col in 0..self.width {
            for row in 0..self.height - 1 {
                let (Some(mut low), Some(high)) = (self.rows[row][col], self.rows[row + 1][col])
                else {
                    continue;
                };
                if let Some(n) = low.merge(&high, cap) {
                    self.rows[row][col] = Some(low);
                    self.rows[row + 1][col] = None;
                    self.shift_column_down(col, row + 2, blocked);
                    merges += 1;
                    points = points.saturating_add(n);
                }
            }
        }
        (merges, points)
    }

    /// Whether a tile may move down into (row, col).
    fn can_drop_into(&self, row: usize, col: usize, blocked: &[Position]) -> bool {
        self.rows[row][col].is_none()
            && !blocked.contains(&Position::new(col as i32, row as i32))
    }

    /// Move every tile in `col` at `from` and above down one row, unless the
    /// cell below it is blocked or still holds a tile that could not move.
    fn shift_column_down(&mut self, col: usize, from: usize, blocked: &[Position]) {
        for row in from..self.height {
            if self.rows[row][col].is_some() && self.can_drop_into(row - 1, col, blocked) {
                self.rows[row - 1][col] = self.rows[row][col].take();
            }
        }
    }

    fn is_isolated(&self, row: usize, col: usize) -> bool {
        let (r, c) = (row as i32, col as i32);
        [(r + 1, c), (r - 1, c), (r, c - 1), (r, c + 1)]
            .into_iter()
            .all(|(nr, nc)| !self.is_occupied(nr, nc))
    }

    /// Tiles with no neighbours drop one row; the bottom row never moves.
    fn compact_isolated(&mut self, blocked: &[Position]) {
        for col in 0..self.width {
            for row in 1..self.height {
                if self.rows[row][col].is_some()
                    && self.is_isolated(row, col)
                    && self.can_drop_into(row - 1, col, blocked)
                {
                    self.rows[row - 1][col] = self.rows[row][col].take();
                }
            }
        }
    }

    #[inline]
    fn row_is_full(&self, row: usize) -> bool {
        self.rows[row].iter().all(Option::is_some)
    }

    /// Indices (bottom = 0) of rows that are currently full.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.height).filter(|&r| self.row_is_full(r)).collect()
    }

    /// Remove full rows, scoring the sum of each row's numbers. Returns rows cleared.
    pub fn clear_full_rows(&mut self) -> usize {
        if self.game_over {
            return 0;
        }
        let mut cleared = 0;
        let mut row = 0;
        while row < self.height {
            if !self.row_is_full(row) {
                row += 1;
                continue;
            }
            let removed = self.rows.remove(row);
            let sum = removed
                .iter()
                .flatten()
                .fold(0u32, |acc, t| acc.saturating_add(t.number()));
            self.score = self.score.saturating_add(sum);
            let at = match self.rules.row_insertion {
                RowInsertion::Top => self.rows.len(),
                RowInsertion::BelowTop => self.rows.len().saturating_sub(1),
            };
            self.rows.insert(at, vec![None; self.width]);
            cleared += 1;
            // Same index again: the row above has shifted into it.
        }
        cleared
    }
}
