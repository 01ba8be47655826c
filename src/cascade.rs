//! Cascade driver: validate a swap, then detect → resolve → settle until the
//! board is quiet, scoring each wave with a rising combo multiplier.

use crate::board::{Board, Pos};
use crate::gravity::{Fall, apply_gravity};
use crate::matcher::{Match, find_matches};
use crate::resolver::{Created, Detonation, resolve};
use rand::Rng;
use std::collections::BTreeSet;
use thiserror::Error;

/// Waves per move before the loop gives up. Random refill can in theory keep
/// re-matching forever.
pub const MAX_WAVES: u32 = 50;

/// Why a move request was refused. The board is left untouched.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("position {0} is outside the board")]
    OutOfBounds(Pos),
    #[error("cannot swap {0} with itself")]
    SameCell(Pos),
    #[error("{0} and {1} are not neighbours")]
    NotAdjacent(Pos, Pos),
}

/// One detect → resolve → settle cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    /// 1-based, rising within a move.
    pub combo: u32,
    pub cleared: usize,
    pub score: u32,
    pub matches: Vec<Match>,
    /// Every matched cell, triggers included.
    pub matched: BTreeSet<Pos>,
    /// Every emptied cell, blasts included.
    pub cleared_cells: BTreeSet<Pos>,
    pub created: Vec<Created>,
    pub detonations: Vec<Detonation>,
    pub falls: Vec<Fall>,
    /// Board when the wave was detected.
    pub before: Board,
    /// Board after clearing, before gravity.
    pub after_clear: Board,
    /// Board after gravity and refill.
    pub after: Board,
}

/// Outcome of an accepted move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// Final board. Equal to the input when the swap matched nothing.
    pub board: Board,
    pub waves: Vec<Wave>,
    pub total_score: u32,
    /// The wave cap stopped the loop.
    pub capped: bool,
}

impl MoveResult {
    /// The swap matched nothing and was reverted.
    pub fn is_noop(&self) -> bool {
        self.waves.is_empty()
    }
}

/// Fresh, match-free board for a new session.
pub fn init_board<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Board {
    Board::random(rows, cols, rng)
}

/// `1 + (combo - 1) * 0.5`.
pub fn combo_multiplier(combo: u32) -> f64 {
    1.0 + f64::from(combo.saturating_sub(1)) * 0.5
}

/// `round(cleared * combo_multiplier(combo))`, halves rounded up, in integers.
pub fn wave_score(cleared: usize, combo: u32) -> u32 {
    let doubled = cleared as u64 * (u64::from(combo.max(1)) + 1);
    ((doubled + 1) / 2) as u32
}

pub fn validate_move(board: &Board, a: Pos, b: Pos) -> Result<(), MoveError> {
    for p in [a, b] {
        if !board.in_bounds(p) {
            return Err(MoveError::OutOfBounds(p));
        }
    }
    if a == b {
        return Err(MoveError::SameCell(a));
    }
    if !a.is_adjacent(b) {
        return Err(MoveError::NotAdjacent(a, b));
    }
    Ok(())
}

/// Try swapping `a` and `b`.
///
/// `Err` means the request itself was invalid. A valid swap that forms no
/// match returns `Ok` with no waves and the original board. Otherwise the
/// cascade runs to completion (or to `MAX_WAVES`).
pub fn attempt_move<R: Rng>(
    board: &Board,
    a: Pos,
    b: Pos,
    rng: &mut R,
) -> Result<MoveResult, MoveError> {
    validate_move(board, a, b)?;

    let mut current = board.clone();
    current.swap(a, b);
    if find_matches(&current).is_empty() {
        return Ok(MoveResult {
            board: board.clone(),
            waves: Vec::new(),
            total_score: 0,
            capped: false,
        });
    }

    let mut waves = Vec::new();
    let mut total_score = 0u32;
    let mut capped = false;
    let mut combo = 0u32;

    loop {
        let matches = find_matches(&current);
        if matches.is_empty() {
            break;
        }
        if combo >= MAX_WAVES {
            log::warn!("cascade hit {MAX_WAVES} waves, stopping early");
            capped = true;
            break;
        }
        combo += 1;

        let before = current.clone();
        let resolution = resolve(&mut current, &matches, rng);
        let after_clear = current.clone();
        let falls = apply_gravity(&mut current, rng);

        let cleared = resolution.cleared_count();
        let score = wave_score(cleared, combo);
        total_score += score;
        log::debug!(
            "wave {combo}: {} matches, {cleared} cleared, +{score}",
            matches.matches.len()
        );

        waves.push(Wave {
            combo,
            cleared,
            score,
            matches: matches.matches,
            matched: matches.matched,
            cleared_cells: resolution.cleared,
            created: resolution.created,
            detonations: resolution.detonations,
            falls,
            before,
            after_clear,
            after: current.clone(),
        });
    }

    Ok(MoveResult {
        board: current,
        waves,
        total_score,
        capped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Candy, Cell, GRID_SIZE};
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    /// Always draws the first option, so every refill is the same candy.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    #[test]
    fn test_wave_score_table() {
        assert_eq!(wave_score(3, 1), 3);
        assert_eq!(wave_score(3, 2), 5); // 4.5 rounds up
        assert_eq!(wave_score(4, 2), 6);
        assert_eq!(wave_score(5, 3), 10);
        assert_eq!(wave_score(7, 4), 18); // 17.5 rounds up
        assert_eq!(wave_score(0, 5), 0);
    }

    #[test]
    fn test_multiplier_strictly_increases() {
        let mut last = 0.0;
        for combo in 1..=MAX_WAVES {
            let m = combo_multiplier(combo);
            assert!(m > last);
            last = m;
            assert_eq!(
                wave_score(6, combo),
                (6.0 * m).round() as u32,
                "combo {combo}"
            );
        }
    }

    #[test]
    fn test_invalid_requests_are_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let board = init_board(GRID_SIZE, GRID_SIZE, &mut rng);
        let p = Pos::new(3, 3);
        assert_eq!(
            attempt_move(&board, p, Pos::new(7, 3), &mut rng),
            Err(MoveError::OutOfBounds(Pos::new(7, 3)))
        );
        assert_eq!(
            attempt_move(&board, p, p, &mut rng),
            Err(MoveError::SameCell(p))
        );
        assert_eq!(
            attempt_move(&board, p, Pos::new(4, 4), &mut rng),
            Err(MoveError::NotAdjacent(p, Pos::new(4, 4)))
        );
        assert_eq!(
            attempt_move(&board, p, Pos::new(3, 5), &mut rng),
            Err(MoveError::NotAdjacent(p, Pos::new(3, 5)))
        );
    }

    #[test]
    fn test_swap_without_match_is_reverted() {
        let board: Board = "\
            ABCDEAB
            CDEABCD
            EABCDEA
            BCDEABC
            DEABCDE
            ABCDEAB
            CDEABCD"
            .parse()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let result = attempt_move(&board, Pos::new(0, 0), Pos::new(0, 1), &mut rng).unwrap();
        assert!(result.is_noop());
        assert_eq!(result.total_score, 0);
        assert_eq!(result.board, board);
    }

    #[test]
    fn test_endless_cascade_stops_at_wave_cap() {
        let mut board: Board = "\
            ABCDEAB
            CDEABCD
            EABCDEA
            BCDEABC
            DEABCDE
            ABCDEAB
            CDEABCD"
            .parse()
            .unwrap();
        board.set(Pos::new(1, 0), Cell::Plain(Candy::Drop));
        // Column 0 lines up three A; every refill is A again.
        let result = attempt_move(&board, Pos::new(2, 0), Pos::new(2, 1), &mut ZeroRng).unwrap();
        assert!(result.capped);
        assert_eq!(result.waves.len(), MAX_WAVES as usize);
        assert_eq!(result.waves.last().map(|w| w.combo), Some(MAX_WAVES));
        assert_eq!(
            result.total_score,
            result.waves.iter().map(|w| w.score).sum::<u32>()
        );
    }

    #[test]
    fn test_random_moves_always_settle() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut board = init_board(GRID_SIZE, GRID_SIZE, &mut rng);
        let mut accepted = 0;
        for i in 0..400 {
            let a = Pos::new(i * 5 % 7, i * 3 % 6);
            let b = Pos::new(a.row, a.col + 1);
            let result = attempt_move(&board, a, b, &mut rng).unwrap();
            assert!(result.waves.len() as u32 <= MAX_WAVES);
            assert!(find_matches(&result.board).is_empty() || result.capped);
            for (n, wave) in result.waves.iter().enumerate() {
                assert_eq!(wave.combo, n as u32 + 1);
                assert!(wave.cleared >= 3);
                assert_eq!(wave.score, wave_score(wave.cleared, wave.combo));
            }
            assert_eq!(
                result.total_score,
                result.waves.iter().map(|w| w.score).sum::<u32>()
            );
            if !result.is_noop() {
                accepted += 1;
            }
            board = result.board;
        }
        assert!(accepted > 0);
    }
}
