//! Game state: grid, current and next piece, pause/stop, one frame per tick.

use crate::config::GameConfig;
use crate::grid::{Grid, GridError, Position};
use crate::highscores::BestScoreStore;
use crate::input::Action;
use crate::piece::{Direction, Piece, PiecePolicy, Rotation};

/// What happened during one frame; the front end uses it for effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// The current piece landed and was committed.
    pub locked: bool,
    /// Grid row indices (bottom = 0) that were full when the piece locked.
    pub cleared_rows: Vec<usize>,
    /// Points from this frame's merge pass.
    pub merge_points: u32,
    pub game_over: bool,
}

/// Game state: grid, active piece, next piece, flags and the stored best score.
pub struct GameState {
    config: GameConfig,
    grid: Grid,
    current: Piece,
    next: Piece,
    policy: Box<dyn PiecePolicy>,
    paused: bool,
    stopped: bool,
    stored_best: u32,
    rows_cleared: u32,
    pieces_locked: u32,
}

impl GameState {
    pub fn new(
        config: &GameConfig,
        mut policy: Box<dyn PiecePolicy>,
        best_score: u32,
    ) -> Result<Self, GridError> {
        let grid = Grid::new(
            usize::from(config.width),
            usize::from(config.height),
            config.grid_rules(),
        )?;
        let current = Piece::generate(policy.as_mut(), &grid);
        let next = Piece::generate(policy.as_mut(), &grid);
        Ok(Self {
            config: config.clone(),
            grid,
            current,
            next,
            policy,
            paused: false,
            stopped: false,
            stored_best: best_score,
            rows_cleared: 0,
            pieces_locked: 0,
        })
    }

    /// Advance one frame: at most one input, one auto-fall attempt, one merge pass.
    pub fn frame(&mut self, input: Option<Action>) -> FrameReport {
        let mut report = FrameReport::default();
        if self.is_over() {
            report.game_over = true;
            return report;
        }
        if let Some(action) = input {
            self.apply(action);
        }
        if self.paused || self.is_over() {
            report.game_over = self.is_over();
            return report;
        }
        if !self.current.try_move(Direction::Down, &self.grid) {
            self.lock_current(&mut report);
        }
        // Loose tiles settle around the falling piece, never into it.
        let covered: Vec<Position> = self.current.cells().map(|(pos, _)| pos).collect();
        report.merge_points = self.grid.merge_and_collapse_around(&covered);
        debug_assert!(!self.current.overlaps(&self.grid));
        report.game_over = self.is_over();
        report
    }

    /// Route one action. While paused only `Pause` (resume) gets through.
    /// `Quit` and `None` are front-end concerns and leave the game alone.
    pub fn apply(&mut self, action: Action) {
        if self.is_over() {
            return;
        }
        if self.paused {
            if action == Action::Pause {
                self.paused = false;
            }
            return;
        }
        match action {
            Action::MoveLeft => {
                self.current.try_move(Direction::Left, &self.grid);
            }
            Action::MoveRight => {
                self.current.try_move(Direction::Right, &self.grid);
            }
            Action::SoftDrop => {
                self.current.try_move(Direction::Down, &self.grid);
            }
            Action::HardDrop => {
                self.current.hard_drop(&self.grid);
            }
            Action::RotateCw => {
                self.current.rotate(Rotation::Cw, &self.grid);
            }
            Action::RotateCcw => {
                self.current.rotate(Rotation::Ccw, &self.grid);
            }
            Action::Pause => self.paused = true,
            Action::Stop => self.stop(),
            Action::Quit | Action::None => {}
        }
    }

    fn lock_current(&mut self, report: &mut FrameReport) {
        let (tiles, anchor) = self.current.bounding_tiles();
        report.locked = true;
        self.pieces_locked = self.pieces_locked.saturating_add(1);
        if self.grid.lock(&tiles, anchor) {
            return;
        }
        report.cleared_rows = self.grid.full_rows();
        let cleared = self.grid.clear_full_rows();
        self.rows_cleared = self.rows_cleared.saturating_add(cleared as u32);
        let upcoming = Piece::generate(self.policy.as_mut(), &self.grid);
        self.current = std::mem::replace(&mut self.next, upcoming);
    }

    pub fn toggle_pause(&mut self) {
        if !self.is_over() {
            self.paused = !self.paused;
        }
    }

    /// End the game now, keeping the board and score as they are.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.paused = false;
    }

    /// Landing anchor of the current piece, when the difficulty shows a ghost.
    pub fn ghost(&self) -> Option<Position> {
        (self.config.difficulty.shows_ghost() && !self.is_over())
            .then(|| self.current.simulate_hard_drop(&self.grid))
    }

    /// Persist the score if it beats what `store` holds. Returns true on a new record.
    pub fn record_best(&mut self, store: &mut dyn BestScoreStore) -> anyhow::Result<bool> {
        let score = self.score();
        let stored = store.read();
        if score <= stored {
            self.stored_best = self.stored_best.max(stored);
            return Ok(false);
        }
        store.write(score)?;
        self.stored_best = score;
        Ok(true)
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.grid.score()
    }

    pub fn best_score(&self) -> u32 {
        self.stored_best.max(self.score())
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.stopped || self.grid.is_game_over()
    }

    /// Ended by the Stop control rather than by filling up.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current(&self) -> &Piece {
        &self.current
    }

    pub fn next(&self) -> &Piece {
        &self.next
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rows_cleared(&self) -> u32 {
        self.rows_cleared
    }

    pub fn pieces_locked(&self) -> u32 {
        self.pieces_locked
    }
}
