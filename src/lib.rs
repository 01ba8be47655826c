//! Sweetswap — candy match-3 engine: detection, special candies, cascades.
//!
//! The engine is pure: `cascade::attempt_move` resolves a whole move at once
//! and reports every wave. `playback` paces those waves for a front end and
//! `game` wraps a full session with its move budget.

pub mod board;
pub mod cascade;
pub mod game;
pub mod gravity;
pub mod matcher;
pub mod playback;
pub mod resolver;

pub use board::{Board, Candy, Cell, GRID_SIZE, Pos, SpecialKind};
pub use cascade::{MoveError, MoveResult, Wave, attempt_move, init_board, validate_move};
pub use game::{Click, GameState, SessionConfig};
pub use playback::{Phase, Playback, Timing};
