//! End-to-end moves through the public engine API.

use rand::SeedableRng;
use rand::rngs::StdRng;
use sweetswap::gravity::apply_gravity;
use sweetswap::matcher::{Pattern, find_matches};
use sweetswap::{
    Board, Candy, Cell, GRID_SIZE, GameState, MoveError, Pos, SessionConfig, SpecialKind, Timing,
    attempt_move, init_board,
};

/// Match-free 7x7 board; every test edits a few cells of it.
const QUIET: &str = "\
    ABCDEAB
    CDEABCD
    EABCDEA
    BCDEABC
    DEABCDE
    ABCDEAB
    CDEABCD";

fn quiet_with_row(row: usize, letters: &str) -> Board {
    let mut board: Board = QUIET.parse().unwrap();
    for (col, ch) in letters.chars().enumerate() {
        board.set(Pos::new(row, col), Cell::Plain(Candy::from_letter(ch).unwrap()));
    }
    board
}

#[test]
fn test_three_in_a_row_clears_three_and_leaves_no_special() {
    let board = quiet_with_row(3, "AABAACD");
    let mut rng = StdRng::seed_from_u64(10);
    let result = attempt_move(&board, Pos::new(3, 2), Pos::new(3, 1), &mut rng).unwrap();

    let first = &result.waves[0];
    assert_eq!(first.combo, 1);
    assert_eq!(first.cleared, 3);
    assert_eq!(first.score, 3);
    assert_eq!(first.matches.len(), 1);
    assert_eq!(first.matches[0].pattern, Pattern::Normal);
    assert!(first.created.is_empty());
    assert!(first.detonations.is_empty());
    let expected: Vec<Pos> = (2..5).map(|c| Pos::new(3, c)).collect();
    assert_eq!(first.cleared_cells.iter().copied().collect::<Vec<_>>(), expected);
    assert!(result.total_score >= 3);
}

#[test]
fn test_four_in_a_row_leaves_a_row_clear_in_the_middle() {
    let mut board = quiet_with_row(3, "CABAADE");
    board.set(Pos::new(2, 2), Cell::Plain(Candy::Drop));
    let mut rng = StdRng::seed_from_u64(11);
    let result = attempt_move(&board, Pos::new(2, 2), Pos::new(3, 2), &mut rng).unwrap();

    let first = &result.waves[0];
    assert_eq!(first.matches.len(), 1);
    assert_eq!(first.matches[0].pattern, Pattern::LineH);
    assert_eq!(first.cleared, 3);
    assert_eq!(first.created.len(), 1);
    assert_eq!(first.created[0].pos, Pos::new(3, 3));
    assert_eq!(first.created[0].kind, SpecialKind::RowClear);
    assert_eq!(
        first.after_clear.at(3, 3),
        Cell::Special(SpecialKind::RowClear, Candy::Drop)
    );
}

#[test]
fn test_bomb_next_to_a_run_blows_its_neighbourhood() {
    let mut board = quiet_with_row(3, "DDAAABC");
    board.set(
        Pos::new(3, 3),
        Cell::Special(SpecialKind::Bomb3x3, Candy::Cookie),
    );
    board.set(Pos::new(2, 2), Cell::Plain(Candy::Cookie));
    let mut rng = StdRng::seed_from_u64(12);
    let result = attempt_move(&board, Pos::new(2, 2), Pos::new(3, 2), &mut rng).unwrap();

    let first = &result.waves[0];
    assert_eq!(first.detonations.len(), 1);
    let blast = &first.detonations[0];
    assert_eq!(blast.kind, SpecialKind::Bomb3x3);
    assert_eq!(blast.pos, Pos::new(3, 3));
    let area: Vec<Pos> = (2..5)
        .flat_map(|r| (2..5).map(move |c| Pos::new(r, c)))
        .collect();
    assert_eq!(blast.area.iter().copied().collect::<Vec<_>>(), area);
    // Blast plus the two run cells outside it.
    assert_eq!(first.cleared, 11);
    for pos in &area {
        assert!(first.after_clear.get(*pos).unwrap().is_empty());
    }
}

#[test]
fn test_invalid_requests_leave_the_board_alone() {
    let board: Board = QUIET.parse().unwrap();
    let mut rng = StdRng::seed_from_u64(13);
    let far = Pos::new(0, 2);
    assert_eq!(
        attempt_move(&board, Pos::new(0, 0), far, &mut rng),
        Err(MoveError::NotAdjacent(Pos::new(0, 0), far))
    );
    let result = attempt_move(&board, Pos::new(0, 0), Pos::new(0, 1), &mut rng).unwrap();
    assert!(result.is_noop());
    assert_eq!(result.board, board);
}

#[test]
fn test_fresh_boards_never_start_with_a_match() {
    for seed in 0..300 {
        let mut rng = StdRng::seed_from_u64(seed);
        let board = init_board(GRID_SIZE, GRID_SIZE, &mut rng);
        assert!(find_matches(&board).is_empty(), "seed {seed}:\n{board}");
        let wide = init_board(5, 9, &mut rng);
        assert!(find_matches(&wide).is_empty(), "seed {seed}:\n{wide}");
    }
}

#[test]
fn test_gravity_keeps_every_candy_and_fills_the_board() {
    let mut board: Board = "\
        A.C.E
        .B...
        C.E.A
        ..A.B"
        .parse()
        .unwrap();
    let before = board.count(|c| !c.is_empty());
    let mut column_order = Vec::new();
    for col in 0..board.cols() {
        column_order.push(
            board
                .column(col)
                .into_iter()
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>(),
        );
    }
    let mut rng = StdRng::seed_from_u64(14);
    let falls = apply_gravity(&mut board, &mut rng);

    assert_eq!(board.count(Cell::is_empty), 0);
    let spawned = falls.iter().filter(|f| f.spawned).count();
    assert_eq!(spawned, board.rows() * board.cols() - before);
    for (col, kept) in column_order.iter().enumerate() {
        let bottom: Vec<Cell> = board.column(col)[board.rows() - kept.len()..].to_vec();
        assert_eq!(&bottom, kept, "column {col}");
    }
}

#[test]
fn test_every_wave_leaves_a_full_board() {
    let mut rng = StdRng::seed_from_u64(15);
    let mut board = init_board(GRID_SIZE, GRID_SIZE, &mut rng);
    for i in 0..200 {
        let a = Pos::new(i % GRID_SIZE, (i / GRID_SIZE) % (GRID_SIZE - 1));
        let b = Pos::new(a.row, a.col + 1);
        let result = attempt_move(&board, a, b, &mut rng).unwrap();
        for wave in &result.waves {
            assert_eq!(wave.after.count(Cell::is_empty), 0);
            assert!(wave.score >= wave.cleared as u32);
        }
        board = result.board;
    }
}

#[test]
fn test_a_whole_session_pays_out_its_score() {
    let mut state = GameState::new(SessionConfig {
        moves: 3,
        seed: Some(16),
        timing: Timing::instant(),
        ..SessionConfig::default()
    });
    let n = GRID_SIZE;
    let pairs: Vec<(Pos, Pos)> = (0..n)
        .flat_map(|r| (0..n - 1).map(move |c| (Pos::new(r, c), Pos::new(r, c + 1))))
        .chain((0..n - 1).flat_map(|r| (0..n).map(move |c| (Pos::new(r, c), Pos::new(r + 1, c)))))
        .collect();
    for &(a, b) in pairs.iter().cycle().take(10_000) {
        if state.is_over() {
            break;
        }
        state.click(a);
        state.click(b);
        state.tick(std::time::Duration::ZERO);
    }
    assert!(state.is_over());
    assert_eq!(state.moves_left, 0);
    assert_eq!(state.moves_made, 3);
    assert!(state.score >= 9);
    assert_eq!(state.coins_earned(), state.score);
}
