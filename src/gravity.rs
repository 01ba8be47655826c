//! Gravity and refill: compact columns downward, top up with fresh candy.

use crate::board::{Board, Candy, Cell, Pos};
use rand::Rng;

/// One cell's fall, for animation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub col: usize,
    /// Source row; negative for candy spawned above the board.
    pub from: isize,
    pub to: usize,
    pub spawned: bool,
}

impl Fall {
    pub fn distance(&self) -> usize {
        (self.to as isize - self.from).unsigned_abs()
    }
}

/// Let every column settle, then fill the gaps at the top with random plain
/// candy (never specials). Returns the moves made, bottom-up per column.
pub fn apply_gravity<R: Rng>(board: &mut Board, rng: &mut R) -> Vec<Fall> {
    let mut falls = Vec::new();
    for col in 0..board.cols() {
        // Next free slot, counted from the bottom.
        let mut slot = board.rows();
        for row in (0..board.rows()).rev() {
            let cell = board.at(row, col);
            if cell.is_empty() {
                continue;
            }
            slot -= 1;
            if row != slot {
                board.set(Pos::new(slot, col), cell);
                board.set(Pos::new(row, col), Cell::Empty);
                falls.push(Fall {
                    col,
                    from: row as isize,
                    to: slot,
                    spawned: false,
                });
            }
        }
        // Rows 0..slot are empty now.
        for row in (0..slot).rev() {
            board.set(Pos::new(row, col), Cell::Plain(Candy::random(rng)));
            falls.push(Fall {
                col,
                from: row as isize - slot as isize,
                to: row,
                spawned: true,
            });
        }
    }
    falls
}
