//! Playback of a resolved move: a phase state machine paced by elapsed time.
//!
//! The engine resolves a move instantly; this turns its result into a list of
//! frames (swap, highlight, explode, fall, pause per wave) that a front end
//! steps through with `advance`.

use crate::board::{Board, Pos};
use crate::cascade::MoveResult;
use crate::gravity::Fall;
use crate::matcher::Pattern;
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Swapping,
    Highlighting,
    Exploding,
    Falling,
    Cascading,
}

/// Banner shown while a wave plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callout {
    Combo(u32),
    Boom,
    Mega,
    Rainbow,
}

impl Callout {
    pub fn text(self) -> String {
        match self {
            Self::Combo(n) => format!("{n}x COMBO!"),
            Self::Boom => "BOOM!".to_string(),
            Self::Mega => "MEGA!".to_string(),
            Self::Rainbow => "RAINBOW!".to_string(),
        }
    }
}

/// Phase durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub swap: Duration,
    pub highlight: Duration,
    pub explode: Duration,
    pub fall: Duration,
    pub cascade_pause: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            swap: Duration::from_millis(200),
            highlight: Duration::from_millis(250),
            explode: Duration::from_millis(350),
            fall: Duration::from_millis(250),
            cascade_pause: Duration::from_millis(150),
        }
    }
}

impl Timing {
    /// Every phase takes zero time.
    pub fn instant() -> Self {
        Self {
            swap: Duration::ZERO,
            highlight: Duration::ZERO,
            explode: Duration::ZERO,
            fall: Duration::ZERO,
            cascade_pause: Duration::ZERO,
        }
    }

    /// Default timing played `speed` times faster.
    pub fn scaled(speed: f64) -> Self {
        let d = Self::default();
        let speed = speed.max(0.01);
        let f = |t: Duration| Duration::from_nanos((t.as_nanos() as f64 / speed).round() as u64);
        Self {
            swap: f(d.swap),
            highlight: f(d.highlight),
            explode: f(d.explode),
            fall: f(d.fall),
            cascade_pause: f(d.cascade_pause),
        }
    }
}

/// What to draw for one step of the playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub phase: Phase,
    pub duration: Duration,
    pub board: Board,
    /// Cells the phase is about: swapped pair, matched or cleared cells.
    pub marked: BTreeSet<Pos>,
    pub falls: Vec<Fall>,
    /// 0 outside of waves.
    pub combo: u32,
    pub callout: Option<Callout>,
}

/// Callout for a wave: combo banner first, then the last notable pattern.
fn wave_callout(wave: &crate::cascade::Wave) -> Option<Callout> {
    let mut callout = (wave.combo > 1).then_some(Callout::Combo(wave.combo));
    for m in &wave.matches {
        match m.pattern {
            Pattern::Rainbow => callout = Some(Callout::Rainbow),
            Pattern::MegaBomb => callout = Some(Callout::Mega),
            Pattern::Bomb => callout = Some(Callout::Boom),
            _ => {}
        }
    }
    callout
}

#[derive(Debug, Clone)]
pub struct Playback {
    frames: Vec<Frame>,
    index: usize,
    elapsed: Duration,
    final_board: Board,
}

impl Playback {
    /// Build the frame list for a move from `origin` swapping `a` and `b`.
    pub fn new(origin: &Board, a: Pos, b: Pos, result: &MoveResult, timing: Timing) -> Self {
        let pair: BTreeSet<Pos> = [a, b].into_iter().collect();
        let mut swapped = origin.clone();
        swapped.swap(a, b);

        let mut frames = vec![Frame {
            phase: Phase::Swapping,
            duration: timing.swap,
            board: origin.clone(),
            marked: pair.clone(),
            falls: Vec::new(),
            combo: 0,
            callout: None,
        }];

        if result.is_noop() {
            // Swap back.
            frames.push(Frame {
                phase: Phase::Swapping,
                duration: timing.swap,
                board: swapped,
                marked: pair,
                falls: Vec::new(),
                combo: 0,
                callout: None,
            });
        }

        for wave in &result.waves {
            let callout = wave_callout(wave);
            let frame = |phase, duration, board: &Board, marked: &BTreeSet<Pos>| Frame {
                phase,
                duration,
                board: board.clone(),
                marked: marked.clone(),
                falls: Vec::new(),
                combo: wave.combo,
                callout,
            };
            frames.push(frame(
                Phase::Highlighting,
                timing.highlight,
                &wave.before,
                &wave.matched,
            ));
            frames.push(frame(
                Phase::Exploding,
                timing.explode,
                &wave.before,
                &wave.cleared_cells,
            ));
            let mut falling = frame(Phase::Falling, timing.fall, &wave.after, &BTreeSet::new());
            falling.falls = wave.falls.clone();
            frames.push(falling);
            frames.push(frame(
                Phase::Cascading,
                timing.cascade_pause,
                &wave.after,
                &BTreeSet::new(),
            ));
        }

        Self {
            frames,
            index: 0,
            elapsed: Duration::ZERO,
            final_board: result.board.clone(),
        }
    }

    /// Consume `dt` of wall time. Returns true once the playback is finished.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        while let Some(frame) = self.frames.get(self.index) {
            if self.elapsed < frame.duration {
                break;
            }
            self.elapsed -= frame.duration;
            self.index += 1;
        }
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.frames.len()
    }

    pub fn phase(&self) -> Phase {
        self.frame().map_or(Phase::Idle, |f| f.phase)
    }

    /// Current frame; `None` once finished.
    pub fn frame(&self) -> Option<&Frame> {
        self.frames.get(self.index)
    }

    /// 0.0..=1.0 progress through the current frame.
    pub fn progress(&self) -> f64 {
        match self.frame() {
            Some(f) if !f.duration.is_zero() => {
                (self.elapsed.as_secs_f64() / f.duration.as_secs_f64()).min(1.0)
            }
            _ => 1.0,
        }
    }

    /// Board to draw right now.
    pub fn board(&self) -> &Board {
        self.frame().map_or(&self.final_board, |f| &f.board)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::attempt_move;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const QUIET: &str = "\
        ABCDEAB
        CDEABCD
        EABCDEA
        BCDEABC
        DEABCDE
        ABCDEAB
        CDEABCD";

    #[test]
    fn test_noop_swap_plays_swap_and_swap_back() {
        let board: Board = QUIET.parse().unwrap();
        let (a, b) = (Pos::new(0, 0), Pos::new(0, 1));
        let mut rng = StdRng::seed_from_u64(1);
        let result = attempt_move(&board, a, b, &mut rng).unwrap();
        let mut pb = Playback::new(&board, a, b, &result, Timing::default());
        let phases: Vec<Phase> = pb.frames().iter().map(|f| f.phase).collect();
        assert_eq!(phases, vec![Phase::Swapping, Phase::Swapping]);

        assert!(!pb.advance(Duration::from_millis(150)));
        assert_eq!(pb.phase(), Phase::Swapping);
        assert!(pb.advance(Duration::from_millis(300)));
        assert_eq!(pb.phase(), Phase::Idle);
        assert_eq!(pb.board(), &board);
    }

    #[test]
    fn test_waves_play_in_phase_order() {
        let mut board: Board = QUIET.parse().unwrap();
        // Row 3 becomes A A B A A C D; swapping (3,1)/(3,2) lines up three A.
        for (col, ch) in "AABAACD".chars().enumerate() {
            board.set(
                Pos::new(3, col),
                crate::board::Cell::Plain(crate::board::Candy::from_letter(ch).unwrap()),
            );
        }
        let (a, b) = (Pos::new(3, 2), Pos::new(3, 1));
        let mut rng = StdRng::seed_from_u64(2);
        let result = attempt_move(&board, a, b, &mut rng).unwrap();
        let pb = Playback::new(&board, a, b, &result, Timing::default());

        let phases: Vec<Phase> = pb.frames().iter().map(|f| f.phase).collect();
        assert_eq!(phases.len(), 1 + 4 * result.waves.len());
        assert_eq!(phases[0], Phase::Swapping);
        for chunk in phases[1..].chunks(4) {
            assert_eq!(
                chunk,
                [
                    Phase::Highlighting,
                    Phase::Exploding,
                    Phase::Falling,
                    Phase::Cascading
                ]
            );
        }
        assert_eq!(pb.frames()[1].combo, 1);
        assert_eq!(pb.frames()[1].callout, None);
    }

    #[test]
    fn test_instant_timing_finishes_on_first_advance() {
        let board: Board = QUIET.parse().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let (a, b) = (Pos::new(0, 0), Pos::new(1, 0));
        let result = attempt_move(&board, a, b, &mut rng).unwrap();
        let mut pb = Playback::new(&board, a, b, &result, Timing::instant());
        assert!(pb.advance(Duration::ZERO));
        assert_eq!(pb.board(), &result.board);
    }

    #[test]
    fn test_scaled_timing() {
        let t = Timing::scaled(2.0);
        assert_eq!(t.swap, Duration::from_millis(100));
        assert_eq!(t.explode, Duration::from_millis(175));
    }

    #[test]
    fn test_callout_text() {
        assert_eq!(Callout::Combo(3).text(), "3x COMBO!");
        assert_eq!(Callout::Rainbow.text(), "RAINBOW!");
    }
}
