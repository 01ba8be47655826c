//! Special candies: placement at match centers, detonation areas, clearing.

use crate::board::{Board, Candy, Cell, Pos, SpecialKind};
use crate::matcher::MatchSet;
use rand::Rng;
use std::collections::BTreeSet;

/// A special candy that went off during a wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detonation {
    pub pos: Pos,
    pub kind: SpecialKind,
    pub candy: Candy,
    /// Cells caught in the blast.
    pub area: BTreeSet<Pos>,
    /// Candy picked by a rainbow.
    pub target: Option<Candy>,
}

/// A special candy left behind by a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Created {
    pub pos: Pos,
    pub kind: SpecialKind,
    pub candy: Candy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Cells emptied by this wave.
    pub cleared: BTreeSet<Pos>,
    pub created: Vec<Created>,
    pub detonations: Vec<Detonation>,
}

impl Resolution {
    pub fn cleared_count(&self) -> usize {
        self.cleared.len()
    }
}

/// Square area of half-width `reach` around `pos`, clipped to the board.
fn square_area(board: &Board, pos: Pos, reach: usize) -> BTreeSet<Pos> {
    let rows = pos.row.saturating_sub(reach)..=(pos.row + reach).min(board.rows() - 1);
    rows.flat_map(|row| {
        let cols = pos.col.saturating_sub(reach)..=(pos.col + reach).min(board.cols() - 1);
        cols.map(move |col| Pos::new(row, col))
    })
    .collect()
}

/// Cells affected by a special of `kind` at `pos`.
///
/// A rainbow picks one palette candy uniformly at random, unrelated to its
/// own candy, and takes every plain cell of it; the pick is returned.
pub fn blast_area<R: Rng>(
    board: &Board,
    pos: Pos,
    kind: SpecialKind,
    rng: &mut R,
) -> (BTreeSet<Pos>, Option<Candy>) {
    match kind {
        SpecialKind::RowClear => ((0..board.cols()).map(|c| Pos::new(pos.row, c)).collect(), None),
        SpecialKind::ColumnClear => {
            ((0..board.rows()).map(|r| Pos::new(r, pos.col)).collect(), None)
        }
        SpecialKind::Bomb3x3 => (square_area(board, pos, 1), None),
        SpecialKind::Bomb5x5 => (square_area(board, pos, 2), None),
        SpecialKind::Rainbow => {
            let target = Candy::random(rng);
            let area = board
                .positions()
                .filter(|&p| board.get(p) == Some(Cell::Plain(target)))
                .collect();
            (area, Some(target))
        }
    }
}

/// Apply one wave's matches to the board.
///
/// Non-merged matches drop their special at their center; the center
/// survives the wave. Pre-existing specials among the matched cells
/// detonate. Everything matched or blasted, except the new centers, is
/// emptied.
pub fn resolve<R: Rng>(board: &mut Board, matches: &MatchSet, rng: &mut R) -> Resolution {
    let mut resolution = Resolution::default();
    let mut survivors = BTreeSet::new();

    for m in matches.active() {
        let Some(kind) = m.pattern.special() else {
            continue;
        };
        board.set(m.center, Cell::Special(kind, m.candy));
        survivors.insert(m.center);
        resolution.created.retain(|c: &Created| c.pos != m.center);
        resolution.created.push(Created {
            pos: m.center,
            kind,
            candy: m.candy,
        });
    }

    let mut clear: BTreeSet<Pos> = matches.matched.difference(&survivors).copied().collect();

    for &pos in &clear {
        let Some(Cell::Special(kind, candy)) = board.get(pos) else {
            continue;
        };
        let (area, target) = blast_area(board, pos, kind, rng);
        log::debug!(
            "{} at {pos} detonated, {} cells caught",
            kind.name(),
            area.len()
        );
        resolution.detonations.push(Detonation {
            pos,
            kind,
            candy,
            area,
            target,
        });
    }

    for d in &resolution.detonations {
        clear.extend(d.area.iter().copied());
    }
    clear.retain(|p| !survivors.contains(p));

    for &pos in &clear {
        board.set(pos, Cell::Empty);
    }
    resolution.cleared = clear;
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{Pattern, find_matches};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const BASE: &str = "\
        ABCDEAB
        CDEABCD
        EABCDEA
        BCDEABC
        DEABCDE
        ABCDEAB
        CDEABCD";

    fn base() -> Board {
        BASE.parse().unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn block(rows: std::ops::RangeInclusive<usize>, cols: std::ops::RangeInclusive<usize>) -> BTreeSet<Pos> {
        rows.flat_map(|r| cols.clone().map(move |c| Pos::new(r, c)))
            .collect()
    }

    #[test]
    fn test_base_board_is_quiet() {
        assert!(find_matches(&base()).is_empty());
    }

    #[test]
    fn test_bomb_area_in_middle() {
        let b = base();
        let (area, target) = blast_area(&b, Pos::new(3, 3), SpecialKind::Bomb3x3, &mut rng());
        assert_eq!(area, block(2..=4, 2..=4));
        assert_eq!(target, None);
    }

    #[test]
    fn test_bomb_areas_clip_at_corners() {
        let b = base();
        let (area, _) = blast_area(&b, Pos::new(0, 0), SpecialKind::Bomb3x3, &mut rng());
        assert_eq!(area, block(0..=1, 0..=1));
        let (area, _) = blast_area(&b, Pos::new(6, 6), SpecialKind::Bomb5x5, &mut rng());
        assert_eq!(area, block(4..=6, 4..=6));
        let (area, _) = blast_area(&b, Pos::new(3, 3), SpecialKind::Bomb5x5, &mut rng());
        assert_eq!(area.len(), 25);
    }

    #[test]
    fn test_line_areas() {
        let b = base();
        let (row, _) = blast_area(&b, Pos::new(2, 5), SpecialKind::RowClear, &mut rng());
        assert_eq!(row, block(2..=2, 0..=6));
        let (col, _) = blast_area(&b, Pos::new(2, 5), SpecialKind::ColumnClear, &mut rng());
        assert_eq!(col, block(0..=6, 5..=5));
    }

    #[test]
    fn test_rainbow_takes_every_plain_cell_of_target() {
        let mut b = base();
        b.set(Pos::new(0, 0), Cell::Special(SpecialKind::Rainbow, Candy::Drop));
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (area, target) = blast_area(&b, Pos::new(0, 0), SpecialKind::Rainbow, &mut rng);
            let target = target.unwrap();
            let expected: BTreeSet<Pos> = b
                .positions()
                .filter(|&p| b.get(p) == Some(Cell::Plain(target)))
                .collect();
            assert_eq!(area, expected);
            assert!(!area.contains(&Pos::new(0, 0)));
        }
    }

    #[test]
    fn test_normal_match_clears_three_and_creates_nothing() {
        // Row 3 becomes A B A A A C D after swapping (3,1)/(3,2) of A A B A A C D.
        let mut b = base();
        for (col, ch) in "ABAAACD".chars().enumerate() {
            b.set(Pos::new(3, col), Cell::Plain(Candy::from_letter(ch).unwrap()));
        }
        let set = find_matches(&b);
        assert_eq!(set.matches.len(), 1);
        let res = resolve(&mut b, &set, &mut rng());
        assert_eq!(res.cleared_count(), 3);
        assert!(res.created.is_empty());
        assert_eq!(res.cleared, block(3..=3, 2..=4));
        assert!(res.cleared.iter().all(|&p| b.get(p) == Some(Cell::Empty)));
    }

    #[test]
    fn test_line_h_places_row_clear_at_center() {
        let mut b = base();
        for (col, ch) in "BCCCCDE".chars().enumerate() {
            b.set(Pos::new(3, col), Cell::Plain(Candy::from_letter(ch).unwrap()));
        }
        let set = find_matches(&b);
        assert_eq!(set.matches[0].pattern, Pattern::LineH);
        let res = resolve(&mut b, &set, &mut rng());
        assert_eq!(
            b.get(Pos::new(3, 3)),
            Some(Cell::Special(SpecialKind::RowClear, Candy::Chocolate))
        );
        assert_eq!(res.cleared_count(), 3);
        for col in [1, 2, 4] {
            assert_eq!(b.at(3, col), Cell::Empty);
        }
        assert_eq!(
            res.created,
            vec![Created {
                pos: Pos::new(3, 3),
                kind: SpecialKind::RowClear,
                candy: Candy::Chocolate
            }]
        );
    }

    #[test]
    fn test_triggered_bomb_clears_its_block() {
        // Column 3 rows 0..=2 become A, with a Drop bomb right below at (3,3).
        let mut b = base();
        for row in 0..3 {
            b.set(Pos::new(row, 3), Cell::Plain(Candy::Drop));
        }
        b.set(Pos::new(3, 3), Cell::Special(SpecialKind::Bomb3x3, Candy::Drop));
        let set = find_matches(&b);
        assert_eq!(set.matches.len(), 1);
        let res = resolve(&mut b, &set, &mut rng());
        assert_eq!(res.detonations.len(), 1);
        assert_eq!(res.detonations[0].area, block(2..=4, 2..=4));
        let mut expected = block(2..=4, 2..=4);
        expected.insert(Pos::new(0, 3));
        expected.insert(Pos::new(1, 3));
        assert_eq!(res.cleared, expected);
        assert_eq!(res.cleared_count(), 11);
    }

    #[test]
    fn test_new_special_survives_blast() {
        // Row 0 cols 0..=3 become D (LineH, center (0,2)); a Cookie row
        // clear sits at (0,4) right after the run and sweeps row 0.
        let mut b = base();
        for col in 0..4 {
            b.set(Pos::new(0, col), Cell::Plain(Candy::Cookie));
        }
        b.set(Pos::new(0, 4), Cell::Special(SpecialKind::RowClear, Candy::Cookie));
        let set = find_matches(&b);
        assert_eq!(set.matches.len(), 1);
        assert_eq!(set.matches[0].pattern, Pattern::LineH);
        let res = resolve(&mut b, &set, &mut rng());
        assert_eq!(
            b.get(Pos::new(0, 2)),
            Some(Cell::Special(SpecialKind::RowClear, Candy::Cookie))
        );
        assert_eq!(res.cleared_count(), 6);
        assert!(!res.cleared.contains(&Pos::new(0, 2)));
    }
}
