use super::piece::ActivePiece;

type Row = [bool; Board::WIDTH];

const EMPTY_ROW: Row = [false; Board::WIDTH];

/// Reasons a saved grid cannot be turned back into a [`Board`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InvalidGridError {
    #[display("grid must have {} rows, got {_0}", Board::HEIGHT)]
    RowCount(#[error(not(source))] usize),
    #[display("grid row {row} must have {} cells, got {len}", Board::WIDTH)]
    RowLength { row: usize, len: usize },
    #[display("grid cell must be 0 or 1, got {_0}")]
    CellValue(#[error(not(source))] u8),
}

/// The 10×20 playfield of settled cells.
///
/// Row 0 is the top of the visible field and rows grow downward. Only
/// [`merge`](Self::merge) and [`clear_lines`](Self::clear_lines) change a
/// board; collision testing is read-only.
///
/// # Example
///
/// ```
/// use lcdtris_engine::{ActivePiece, Board, PieceKind};
///
/// let mut board = Board::new();
/// let piece = ActivePiece::at(PieceKind::I, 0, 19);
/// assert!(!board.collides(&piece));
///
/// board.merge(&piece);
/// assert!(board.collides(&piece));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: [Row; Board::HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub const WIDTH: usize = 10;
    pub const HEIGHT: usize = 20;

    /// Creates an empty board.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: [EMPTY_ROW; Self::HEIGHT],
        }
    }

    /// Whether the cell is settled. Cells outside the board are empty.
    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.rows.get(y).and_then(|row| row.get(x)).is_some_and(|&cell| cell)
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool; Board::WIDTH]> {
        self.rows.iter()
    }

    /// Checks whether the piece overlaps a wall, the floor or a settled cell.
    ///
    /// Cells above the top row never collide, so a piece may enter the field
    /// partially above the ceiling.
    #[must_use]
    pub fn collides(&self, piece: &ActivePiece) -> bool {
        piece.cells().any(|(x, y)| {
            let Ok(x) = usize::try_from(x) else {
                return true;
            };
            if x >= Self::WIDTH {
                return true;
            }
            let Ok(y) = usize::try_from(y) else {
                return false;
            };
            y >= Self::HEIGHT || self.rows[y][x]
        })
    }

    /// Locks a piece onto the board by setting its occupied cells.
    ///
    /// Cells above the ceiling are dropped.
    pub fn merge(&mut self, piece: &ActivePiece) {
        for (x, y) in piece.cells() {
            if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y))
                && x < Self::WIDTH
                && y < Self::HEIGHT
            {
                self.rows[y][x] = true;
            }
        }
    }

    /// Clears filled lines and returns the number of lines cleared.
    ///
    /// Rows are scanned bottom to top. A full row is removed, the rows above
    /// it shift down by one, and an empty row enters at the top; the same
    /// index is then checked again.
    pub fn clear_lines(&mut self) -> usize {
        let mut cleared = 0;
        let mut y = Self::HEIGHT;
        while y > 0 {
            let row = y - 1;
            if self.rows[row].iter().all(|&cell| cell) {
                self.rows[..=row].rotate_right(1);
                self.rows[0] = EMPTY_ROW;
                cleared += 1;
                continue;
            }
            y -= 1;
        }
        cleared
    }

    /// Returns the board as rows of `0`/`1` cells.
    #[must_use]
    pub fn to_grid(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|&cell| u8::from(cell)).collect())
            .collect()
    }

    /// Rebuilds a board from rows of `0`/`1` cells.
    pub fn from_grid(grid: &[Vec<u8>]) -> Result<Self, InvalidGridError> {
        if grid.len() != Self::HEIGHT {
            return Err(InvalidGridError::RowCount(grid.len()));
        }
        let mut board = Self::new();
        for (y, row) in grid.iter().enumerate() {
            if row.len() != Self::WIDTH {
                return Err(InvalidGridError::RowLength {
                    row: y,
                    len: row.len(),
                });
            }
            for (x, &value) in row.iter().enumerate() {
                board.rows[y][x] = match value {
                    0 => false,
                    1 => true,
                    other => return Err(InvalidGridError::CellValue(other)),
                };
            }
        }
        Ok(board)
    }

    /// Creates a `Board` from ASCII art representation for testing.
    /// '#' represents an occupied cell, '.' represents an empty cell.
    /// Rows are aligned to the bottom of the board, so only the interesting
    /// part of the stack needs to be drawn.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let mut board = Self::new();
        let lines: Vec<&str> = art.lines().filter(|line| !line.trim().is_empty()).collect();
        assert!(
            lines.len() <= Self::HEIGHT,
            "At most {} rows are allowed, got {}",
            Self::HEIGHT,
            lines.len()
        );

        let top = Self::HEIGHT - lines.len();
        for (i, line) in lines.iter().enumerate() {
            let chars: Vec<char> = line.chars().filter(|c| *c == '#' || *c == '.').collect();
            assert_eq!(
                chars.len(),
                Self::WIDTH,
                "Each row must have exactly {} cells, got {} at row {}",
                Self::WIDTH,
                chars.len(),
                i
            );
            for (x, &ch) in chars.iter().enumerate() {
                board.rows[top + i][x] = ch == '#';
            }
        }
        board
    }
}
