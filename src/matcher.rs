//! Match detection: row and column runs, L/T merges and 2×2 squares.
//!
//! Detection order is fixed: rows, then columns, then same-candy overlaps are
//! merged, then squares. When two matches contest a cell the one registered
//! first keeps it.

use crate::board::{Board, Candy, Cell, Pos, SpecialKind};
use std::collections::BTreeSet;

/// Union size at which an L/T merge becomes a mega bomb instead of a bomb.
pub const MEGA_BOMB_UNION: usize = 5;

/// A square sharing this many cells with an existing match is not a square match.
pub const SQUARE_OVERLAP_LIMIT: usize = 2;

/// Shape classification of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Run of exactly 3.
    Normal,
    /// Horizontal run of 4.
    LineH,
    /// Vertical run of 4.
    LineV,
    /// Run of 5 or more.
    Rainbow,
    /// L/T intersection or 2×2 square.
    Bomb,
    /// Large L/T intersection.
    MegaBomb,
    /// Absorbed into an earlier overlapping match; creates nothing.
    Merged,
}

impl Pattern {
    /// Special candy this pattern leaves behind at the match center.
    pub fn special(self) -> Option<SpecialKind> {
        match self {
            Self::LineH => Some(SpecialKind::RowClear),
            Self::LineV => Some(SpecialKind::ColumnClear),
            Self::Bomb => Some(SpecialKind::Bomb3x3),
            Self::MegaBomb => Some(SpecialKind::Bomb5x5),
            Self::Rainbow => Some(SpecialKind::Rainbow),
            Self::Normal | Self::Merged => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchSource {
    Row,
    Column,
    Square,
}

/// Identifies a match: where it was found and its first cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchKey {
    pub source: MatchSource,
    pub anchor: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub key: MatchKey,
    pub candy: Candy,
    pub pattern: Pattern,
    /// Plain cells forming the shape.
    pub cells: BTreeSet<Pos>,
    /// Same-candy specials directly before or after a run; cleared (and
    /// detonated) with the match but never counted toward its shape.
    pub triggers: BTreeSet<Pos>,
    /// Where a resulting special candy is placed.
    pub center: Pos,
}

impl Match {
    fn overlap(&self, other: &BTreeSet<Pos>) -> usize {
        self.cells.intersection(other).count()
    }
}

/// Result of one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    /// In registration order.
    pub matches: Vec<Match>,
    /// Every cell of every match, triggers included.
    pub matched: BTreeSet<Pos>,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    pub fn get(&self, key: MatchKey) -> Option<&Match> {
        self.matches.iter().find(|m| m.key == key)
    }

    /// Matches that were not absorbed by a merge.
    pub fn active(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.pattern != Pattern::Merged)
    }

    fn register(&mut self, m: Match) {
        self.matched.extend(m.cells.iter().copied());
        self.matched.extend(m.triggers.iter().copied());
        self.matches.push(m);
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Row,
    Column,
}

impl Axis {
    /// (outer, inner) extents: lines to scan and cells per line.
    fn extents(self, board: &Board) -> (usize, usize) {
        match self {
            Self::Row => (board.rows(), board.cols()),
            Self::Column => (board.cols(), board.rows()),
        }
    }

    fn pos(self, line: usize, i: usize) -> Pos {
        match self {
            Self::Row => Pos::new(line, i),
            Self::Column => Pos::new(i, line),
        }
    }

    fn source(self) -> MatchSource {
        match self {
            Self::Row => MatchSource::Row,
            Self::Column => MatchSource::Column,
        }
    }

    fn line_pattern(self) -> Pattern {
        match self {
            Self::Row => Pattern::LineH,
            Self::Column => Pattern::LineV,
        }
    }
}

/// Scan every line on one axis for maximal plain runs of 3 or more.
fn scan_runs(board: &Board, axis: Axis, set: &mut MatchSet) {
    let (lines, len) = axis.extents(board);
    for line in 0..lines {
        let cell = |i: usize| board.get(axis.pos(line, i)).unwrap_or(Cell::Empty);
        let mut i = 0;
        while i < len {
            let Some(candy) = cell(i).plain() else {
                i += 1;
                continue;
            };
            let mut run = 1;
            while i + run < len && cell(i + run).plain() == Some(candy) {
                run += 1;
            }
            if run >= 3 {
                let pattern = match run {
                    3 => Pattern::Normal,
                    4 => axis.line_pattern(),
                    _ => Pattern::Rainbow,
                };
                let is_trigger = |j: usize| matches!(cell(j), Cell::Special(_, c) if c == candy);
                let mut triggers = BTreeSet::new();
                if i > 0 && is_trigger(i - 1) {
                    triggers.insert(axis.pos(line, i - 1));
                }
                if i + run < len && is_trigger(i + run) {
                    triggers.insert(axis.pos(line, i + run));
                }
                set.register(Match {
                    key: MatchKey {
                        source: axis.source(),
                        anchor: axis.pos(line, i),
                    },
                    candy,
                    pattern,
                    cells: (i..i + run).map(|j| axis.pos(line, j)).collect(),
                    triggers,
                    center: axis.pos(line, i + run / 2),
                });
            }
            i += run;
        }
    }
}

/// Same-candy runs that share a cell form an L or T. The earlier match
/// absorbs the later one.
fn merge_intersections(set: &mut MatchSet) {
    let n = set.matches.len();
    for a in 0..n {
        for b in (a + 1)..n {
            let (first, second) = (&set.matches[a], &set.matches[b]);
            if first.candy != second.candy || first.overlap(&second.cells) == 0 {
                continue;
            }
            let union = first.cells.union(&second.cells).count();
            set.matches[a].pattern = if union >= MEGA_BOMB_UNION {
                Pattern::MegaBomb
            } else {
                Pattern::Bomb
            };
            set.matches[b].pattern = Pattern::Merged;
        }
    }
}

fn scan_squares(board: &Board, set: &mut MatchSet) {
    for row in 0..board.rows().saturating_sub(1) {
        for col in 0..board.cols().saturating_sub(1) {
            let Some(candy) = board.at(row, col).plain() else {
                continue;
            };
            let cells: BTreeSet<Pos> = [(0, 0), (0, 1), (1, 0), (1, 1)]
                .into_iter()
                .map(|(dr, dc)| Pos::new(row + dr, col + dc))
                .collect();
            if cells
                .iter()
                .any(|&p| board.get(p).and_then(Cell::plain) != Some(candy))
            {
                continue;
            }
            if set
                .matches
                .iter()
                .any(|m| m.overlap(&cells) >= SQUARE_OVERLAP_LIMIT)
            {
                continue;
            }
            let anchor = Pos::new(row, col);
            set.register(Match {
                key: MatchKey {
                    source: MatchSource::Square,
                    anchor,
                },
                candy,
                pattern: Pattern::Bomb,
                cells,
                triggers: BTreeSet::new(),
                center: anchor,
            });
        }
    }
}

/// Find every match on the board and classify it.
pub fn find_matches(board: &Board) -> MatchSet {
    let mut set = MatchSet::default();
    scan_runs(board, Axis::Row, &mut set);
    scan_runs(board, Axis::Column, &mut set);
    merge_intersections(&mut set);
    scan_squares(board, &mut set);
    set
}
