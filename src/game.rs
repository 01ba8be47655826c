//! Game state: one play session with a move budget, cursor, selection and
//! the playback of the move in progress.

use crate::board::{Board, GRID_SIZE, Pos};
use crate::cascade::{MoveError, MoveResult, attempt_move, init_board};
use crate::playback::{Frame, Phase, Playback, Timing};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

/// Moves per session.
pub const MOVES_LIMIT: u32 = 20;

/// Options that shape a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub rows: usize,
    pub cols: usize,
    pub moves: u32,
    /// Fixed seed for a reproducible session; random when `None`.
    pub seed: Option<u64>,
    pub timing: Timing,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rows: GRID_SIZE,
            cols: GRID_SIZE,
            moves: MOVES_LIMIT,
            seed: None,
            timing: Timing::default(),
        }
    }
}

/// What a click (select key) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    /// A move is playing, the session is over, or the cell is off the board.
    Ignored,
    Selected(Pos),
    Deselected,
    /// Not a neighbour of the selection; selection moves there.
    Reselected(Pos),
    /// Swap formed no match and is being reverted.
    NoMatch,
    /// Swap accepted; the cascade is playing.
    Accepted { waves: usize, score: u32 },
    Rejected(MoveError),
}

#[derive(Debug)]
pub struct GameState {
    pub board: Board,
    rng: StdRng,
    config: SessionConfig,
    pub score: u32,
    pub moves_left: u32,
    pub cursor: Pos,
    pub selected: Option<Pos>,
    /// Combo index of the wave on screen; 0 when idle.
    pub combo: u32,
    pub best_combo: u32,
    pub specials_created: u32,
    pub moves_made: u32,
    /// Score of the move being played, credited when it finishes.
    pub pending_score: u32,
    playback: Option<Playback>,
    pending: Option<MoveResult>,
}

impl GameState {
    pub fn new(config: SessionConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let board = init_board(config.rows, config.cols, &mut rng);
        Self {
            board,
            rng,
            score: 0,
            moves_left: config.moves,
            cursor: Pos::new(config.rows / 2, config.cols / 2),
            selected: None,
            combo: 0,
            best_combo: 0,
            specials_created: 0,
            moves_made: 0,
            pending_score: 0,
            playback: None,
            pending: None,
            config,
        }
    }

    /// Fresh board and move budget. A seeded session replays the same board.
    pub fn restart(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.playback.as_ref().map_or(Phase::Idle, Playback::phase)
    }

    /// True while a move plays; input is blocked.
    pub fn is_busy(&self) -> bool {
        self.phase() != Phase::Idle
    }

    pub fn is_over(&self) -> bool {
        self.moves_left == 0 && !self.is_busy()
    }

    /// Coins for the pet: the committed score. The player may cash out at any
    /// time; a move still playing is not counted yet.
    pub fn coins_earned(&self) -> u32 {
        self.score
    }

    /// Board to draw: the playback frame while a move plays.
    pub fn display_board(&self) -> &Board {
        self.playback.as_ref().map_or(&self.board, Playback::board)
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.playback.as_ref().and_then(Playback::frame)
    }

    pub fn frame_progress(&self) -> f64 {
        self.playback.as_ref().map_or(1.0, Playback::progress)
    }

    pub fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let row = self.cursor.row.saturating_add_signed(d_row);
        let col = self.cursor.col.saturating_add_signed(d_col);
        self.cursor = Pos::new(
            row.min(self.board.rows().saturating_sub(1)),
            col.min(self.board.cols().saturating_sub(1)),
        );
    }

    /// Click the cell under the cursor.
    pub fn select(&mut self) -> Click {
        self.click(self.cursor)
    }

    /// Click a cell: select, deselect, move the selection, or swap.
    pub fn click(&mut self, pos: Pos) -> Click {
        if self.is_busy() || self.moves_left == 0 || !self.board.in_bounds(pos) {
            return Click::Ignored;
        }
        let Some(first) = self.selected else {
            self.selected = Some(pos);
            return Click::Selected(pos);
        };
        if first == pos {
            self.selected = None;
            return Click::Deselected;
        }
        if !first.is_adjacent(pos) {
            self.selected = Some(pos);
            return Click::Reselected(pos);
        }

        self.selected = None;
        let result = match attempt_move(&self.board, first, pos, &mut self.rng) {
            Ok(r) => r,
            Err(e) => return Click::Rejected(e),
        };
        let click = if result.is_noop() {
            Click::NoMatch
        } else {
            self.moves_left -= 1;
            self.moves_made += 1;
            Click::Accepted {
                waves: result.waves.len(),
                score: result.total_score,
            }
        };
        self.pending_score = result.total_score;
        self.playback = Some(Playback::new(
            &self.board,
            first,
            pos,
            &result,
            self.config.timing,
        ));
        self.pending = Some(result);
        self.tick(Duration::ZERO);
        click
    }

    /// Advance the playback. Commits the move when it finishes.
    pub fn tick(&mut self, dt: Duration) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };
        let done = playback.advance(dt);
        self.combo = playback.frame().map_or(0, |f| f.combo);
        self.best_combo = self.best_combo.max(self.combo);
        if done {
            self.finish_move();
        }
    }

    fn finish_move(&mut self) {
        self.playback = None;
        self.combo = 0;
        self.pending_score = 0;
        if let Some(result) = self.pending.take() {
            let waves = result.waves.len() as u32;
            self.best_combo = self.best_combo.max(waves);
            self.specials_created += result
                .waves
                .iter()
                .map(|w| w.created.len() as u32)
                .sum::<u32>();
            self.score += result.total_score;
            self.board = result.board;
        }
        if self.moves_left == 0 {
            log::info!(
                "session over: score {} in {} moves, best combo {}",
                self.score,
                self.moves_made,
                self.best_combo
            );
        }
    }
}
