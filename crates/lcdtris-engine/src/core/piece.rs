use serde::{Deserialize, Serialize};

use super::board::Board;

/// Largest bounding box a shape may occupy, in cells per side.
pub const MAX_SHAPE_SIZE: usize = 4;

/// The seven tetromino kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// T-piece.
    T = 2,
    /// S-piece.
    S = 3,
    /// Z-piece.
    Z = 4,
    /// J-piece.
    J = 5,
    /// L-piece.
    L = 6,
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// Every kind, in catalog order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Returns the spawn orientation of this kind.
    #[must_use]
    pub const fn canonical_shape(self) -> Shape {
        CATALOG[self as usize]
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use lcdtris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::T => 'T',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
        }
    }

    /// Parses a piece kind from a single character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'T' => Some(PieceKind::T),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            _ => None,
        }
    }
}

/// Reasons a cell matrix cannot be used as a piece shape.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InvalidShapeError {
    #[display("shape must have 1 to 4 rows, got {_0}")]
    RowCount(#[error(not(source))] usize),
    #[display("shape rows must share a length of 1 to 4 cells")]
    RaggedRows,
    #[display("shape cell must be 0 or 1, got {_0}")]
    CellValue(#[error(not(source))] u8),
    #[display("shape has no occupied cells")]
    Empty,
}

/// Rectangular boolean matrix describing which cells of a piece are occupied.
///
/// Shapes are plain values: rotating one builds a new matrix and leaves the
/// original untouched, so a rejected rotation is undone by keeping the old
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    width: u8,
    height: u8,
    cells: [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    const fn from_cells(
        width: u8,
        height: u8,
        cells: [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
    ) -> Self {
        Self {
            width,
            height,
            cells,
        }
    }

    /// Builds a shape from rows of `0`/`1` cells (row 0 at the top).
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, InvalidShapeError> {
        if rows.is_empty() || rows.len() > MAX_SHAPE_SIZE {
            return Err(InvalidShapeError::RowCount(rows.len()));
        }
        let width = rows[0].len();
        if width == 0 || width > MAX_SHAPE_SIZE || rows.iter().any(|row| row.len() != width) {
            return Err(InvalidShapeError::RaggedRows);
        }

        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                cells[y][x] = match value {
                    0 => false,
                    1 => true,
                    other => return Err(InvalidShapeError::CellValue(other)),
                };
            }
        }
        if !cells.iter().flatten().any(|&cell| cell) {
            return Err(InvalidShapeError::Empty);
        }

        #[expect(clippy::cast_possible_truncation)]
        let (width, height) = (width as u8, rows.len() as u8);
        Ok(Self::from_cells(width, height, cells))
    }

    /// Number of columns in the matrix.
    #[must_use]
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    /// Number of rows in the matrix.
    #[must_use]
    pub fn height(&self) -> usize {
        usize::from(self.height)
    }

    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < self.height() && self.cells[y][x]
    }

    /// Returns the `(dx, dy)` offsets of occupied cells, row by row.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.height).flat_map(move |dy| {
            (0..self.width)
                .filter(move |&dx| self.cells[usize::from(dy)][usize::from(dx)])
                .map(move |dx| (i32::from(dx), i32::from(dy)))
        })
    }

    /// Returns the matrix as rows of `0`/`1` cells.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells[..self.height()]
            .iter()
            .map(|row| row[..self.width()].iter().map(|&c| u8::from(c)).collect())
            .collect()
    }

    /// Returns this shape turned 90° clockwise.
    ///
    /// For an `n`×`m` matrix the result is `m`×`n` with
    /// `new[x][n - 1 - y] = old[y][x]`.
    #[must_use]
    pub fn rotated_cw(&self) -> Self {
        let n = self.height();
        let m = self.width();
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in self.cells[..n].iter().enumerate() {
            for (x, &cell) in row[..m].iter().enumerate() {
                cells[x][n - 1 - y] = cell;
            }
        }
        Self::from_cells(self.height, self.width, cells)
    }
}

const CATALOG: [Shape; PieceKind::LEN] = {
    const C: bool = true;
    const E: bool = false;
    const EEEE: [bool; 4] = [E; 4];
    [
        // I-piece
        Shape::from_cells(4, 1, [[C, C, C, C], EEEE, EEEE, EEEE]),
        // O-piece
        Shape::from_cells(2, 2, [[C, C, E, E], [C, C, E, E], EEEE, EEEE]),
        // T-piece
        Shape::from_cells(3, 2, [[E, C, E, E], [C, C, C, E], EEEE, EEEE]),
        // S-piece
        Shape::from_cells(3, 2, [[E, C, C, E], [C, C, E, E], EEEE, EEEE]),
        // Z-piece
        Shape::from_cells(3, 2, [[C, C, E, E], [E, C, C, E], EEEE, EEEE]),
        // J-piece
        Shape::from_cells(3, 2, [[C, E, E, E], [C, C, C, E], EEEE, EEEE]),
        // L-piece
        Shape::from_cells(3, 2, [[E, E, C, E], [C, C, C, E], EEEE, EEEE]),
    ]
};

/// Rotation state of a piece.
///
/// - `0`: spawn orientation
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub fn rotated_right(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub fn index(self) -> u8 {
        self.0
    }

    /// Finds how many clockwise turns take `kind`'s spawn shape to `shape`.
    #[must_use]
    pub fn infer(kind: PieceKind, shape: &Shape) -> Option<Self> {
        let mut candidate = kind.canonical_shape();
        for turns in 0..4 {
            if candidate == *shape {
                return Some(Self(turns));
            }
            candidate = candidate.rotated_cw();
        }
        None
    }
}

/// The falling piece: a shape anchored at the board position of its
/// top-left corner.
///
/// Movement and rotation return new values; the controller decides whether
/// to commit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePiece {
    kind: PieceKind,
    shape: Shape,
    x: i32,
    y: i32,
    rotation: PieceRotation,
}

impl ActivePiece {
    /// Anchor used for a piece swapped in from the hold slot.
    pub const HOLD_ANCHOR: (i32, i32) = (3, 0);

    /// Creates a piece in spawn orientation, centered horizontally on row 0.
    #[must_use]
    pub fn spawn(kind: PieceKind) -> Self {
        let shape = kind.canonical_shape();
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let x = ((Board::WIDTH - shape.width()) / 2) as i32;
        Self::at(kind, x, 0)
    }

    /// Creates a piece in spawn orientation at the given anchor.
    #[must_use]
    pub fn at(kind: PieceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            shape: kind.canonical_shape(),
            x,
            y,
            rotation: PieceRotation::default(),
        }
    }

    /// Rebuilds a piece from saved parts.
    ///
    /// The rotation index is recovered when the shape is a rotation of the
    /// kind's catalog shape, and left at 0 otherwise.
    #[must_use]
    pub fn from_parts(kind: PieceKind, shape: Shape, x: i32, y: i32) -> Self {
        Self {
            kind,
            shape,
            x,
            y,
            rotation: PieceRotation::infer(kind, &shape).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    /// Board coordinates `(x, y)` of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied_cells()
            .map(move |(dx, dy)| (self.x + dx, self.y + dy))
    }

    #[must_use]
    pub fn moved(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Returns the piece turned clockwise around its current anchor.
    #[must_use]
    pub fn rotated_cw(&self) -> Self {
        Self {
            shape: self.shape.rotated_cw(),
            rotation: self.rotation.rotated_right(),
            ..*self
        }
    }
}
