//! Board: candies, special candies, cells and the R×C grid they live on.

use rand::Rng;
use rand::seq::IndexedRandom;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default board size (rows and columns).
pub const GRID_SIZE: usize = 7;

/// Plain candy flavours. The palette is fixed at five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Candy {
    Drop,
    Lollipop,
    Chocolate,
    Cookie,
    Cupcake,
}

impl Candy {
    pub const ALL: [Self; 5] = [
        Self::Drop,
        Self::Lollipop,
        Self::Chocolate,
        Self::Cookie,
        Self::Cupcake,
    ];

    /// Palette index 0..5, used by the theme.
    pub fn index(self) -> u8 {
        match self {
            Self::Drop => 0,
            Self::Lollipop => 1,
            Self::Chocolate => 2,
            Self::Cookie => 3,
            Self::Cupcake => 4,
        }
    }

    /// Single-letter code used by `Board`'s text form (`A`..`E`).
    pub fn letter(self) -> char {
        (b'A' + self.index()) as char
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::Drop),
            'B' => Some(Self::Lollipop),
            'C' => Some(Self::Chocolate),
            'D' => Some(Self::Cookie),
            'E' => Some(Self::Cupcake),
            _ => None,
        }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Special candies created by large matches; they detonate instead of matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecialKind {
    RowClear,
    ColumnClear,
    Bomb3x3,
    Bomb5x5,
    Rainbow,
}

impl SpecialKind {
    pub const ALL: [Self; 5] = [
        Self::RowClear,
        Self::ColumnClear,
        Self::Bomb3x3,
        Self::Bomb5x5,
        Self::Rainbow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RowClear => "row clear",
            Self::ColumnClear => "column clear",
            Self::Bomb3x3 => "bomb",
            Self::Bomb5x5 => "mega bomb",
            Self::Rainbow => "rainbow",
        }
    }
}

/// Single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Plain(Candy),
    Special(SpecialKind, Candy),
}

impl Cell {
    /// Candy of a plain cell. Specials and empties never take part in a run.
    #[inline]
    pub fn plain(self) -> Option<Candy> {
        match self {
            Self::Plain(c) => Some(c),
            _ => None,
        }
    }

    /// Candy colour of any non-empty cell.
    #[inline]
    pub fn candy(self) -> Option<Candy> {
        match self {
            Self::Plain(c) | Self::Special(_, c) => Some(c),
            Self::Empty => None,
        }
    }

    #[inline]
    pub fn special(self) -> Option<SpecialKind> {
        match self {
            Self::Special(k, _) => Some(k),
            _ => None,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

/// Board coordinate. Ordered row-major so sets iterate top-left to bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// 4-connectivity: exactly one step up, down, left or right.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardParseError {
    #[error("board has no rows")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown cell '{0}'")]
    UnknownCell(char),
}

/// The grid. `cells` is row-major; row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Board of the given size with every cell empty.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Random board with no run of three and no 2×2 square anywhere.
    ///
    /// Cells are filled row-major; a candy is excluded when it would complete
    /// a horizontal or vertical run of 3 with the cells already placed, or a
    /// square with the up, left and up-left neighbours. At most three of the
    /// five candies are ever excluded, so a candidate always remains.
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let mut board = Self::empty(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let left = |n: usize| {
                    (col >= n).then(|| board.cells[board.idx(row, col - n)].plain())
                };
                let up = |n: usize| {
                    (row >= n).then(|| board.cells[board.idx(row - n, col)].plain())
                };
                let diag = (row >= 1 && col >= 1)
                    .then(|| board.cells[board.idx(row - 1, col - 1)].plain());

                let options: Vec<Candy> = Candy::ALL
                    .into_iter()
                    .filter(|&c| {
                        let run_h = left(1) == Some(Some(c)) && left(2) == Some(Some(c));
                        let run_v = up(1) == Some(Some(c)) && up(2) == Some(Some(c));
                        let square = left(1) == Some(Some(c))
                            && up(1) == Some(Some(c))
                            && diag == Some(Some(c));
                        !(run_h || run_v || square)
                    })
                    .collect();
                let candy = *options.choose(rng).unwrap_or(&Candy::ALL[0]);
                let i = board.idx(row, col);
                board.cells[i] = Cell::Plain(candy);
            }
        }
        board
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.cells[self.idx(pos.row, pos.col)])
    }

    /// Cell at an in-bounds position; `Empty` outside the board.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> Cell {
        self.get(Pos::new(row, col)).unwrap_or(Cell::Empty)
    }

    #[inline]
    pub fn set(&mut self, pos: Pos, cell: Cell) {
        if self.in_bounds(pos) {
            let i = self.idx(pos.row, pos.col);
            self.cells[i] = cell;
        }
    }

    /// Exchange two cells. Adjacency is the caller's job.
    pub fn swap(&mut self, a: Pos, b: Pos) {
        if self.in_bounds(a) && self.in_bounds(b) {
            let (ia, ib) = (self.idx(a.row, a.col), self.idx(b.row, b.col));
            self.cells.swap(ia, ib);
        }
    }

    /// All positions, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Pos::new(row, col)))
    }

    pub fn count(&self, pred: impl Fn(Cell) -> bool) -> usize {
        self.cells.iter().filter(|&&c| pred(c)).count()
    }

    /// Top-to-bottom cells of one column.
    pub fn column(&self, col: usize) -> Vec<Cell> {
        (0..self.rows).map(|row| self.at(row, col)).collect()
    }
}

/// Text form: one line per row, `A`..`E` for plain candies, `.` for empty.
/// Specials are written as lowercase letters of their candy.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let ch = match self.at(row, col) {
                    Cell::Empty => '.',
                    Cell::Plain(c) => c.letter(),
                    Cell::Special(_, c) => c.letter().to_ascii_lowercase(),
                };
                write!(f, "{ch}")?;
            }
            if row + 1 < self.rows {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Parses the plain-candy text form. Lines are trimmed; blank lines skipped.
impl FromStr for Board {
    type Err = BoardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let cols = lines.first().ok_or(BoardParseError::Empty)?.chars().count();
        let mut board = Self::empty(lines.len(), cols);
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(BoardParseError::Ragged {
                    row,
                    found,
                    expected: cols,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' => Cell::Empty,
                    _ => Cell::Plain(
                        Candy::from_letter(ch).ok_or(BoardParseError::UnknownCell(ch))?,
                    ),
                };
                board.set(Pos::new(row, col), cell);
            }
        }
        Ok(board)
    }
}
