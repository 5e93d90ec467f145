use serde::{Deserialize, Serialize};

use crate::core::{
    board::{Board, InvalidGridError},
    piece::{ActivePiece, InvalidShapeError, MAX_SHAPE_SIZE, PieceKind, PieceRotation, Shape},
};

use super::stats::GameStats;

/// Largest score a snapshot may carry.
pub const MAX_SAVED_SCORE: usize = 999_999_999;
/// Largest line total a snapshot may carry.
pub const MAX_SAVED_LINES: usize = 99_999;
/// Largest level a snapshot may carry.
pub const MAX_SAVED_LEVEL: usize = 9_999;

/// The falling piece as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPiece {
    pub kind: PieceKind,
    pub x: i32,
    pub y: i32,
    /// Current (possibly rotated) shape matrix of `0`/`1` cells.
    pub shape: Vec<Vec<u8>>,
}

/// Minimal game state needed to resume play.
///
/// Timing and pause state are not stored; a restored game resumes
/// in whatever state the session is already in.
///
/// # Wire format
///
/// ```json
/// {
///   "grid": [[0, 0, 1, ...], ...],
///   "cur": { "kind": "T", "x": 3, "y": 0, "shape": [[0, 1, 0], [1, 1, 1]] },
///   "hold": "I",
///   "bag": ["S", "Z", "O"],
///   "score": 1200,
///   "lines": 4,
///   "level": 1
/// }
/// ```
///
/// `grid`, `score`, `lines` and `level` are required. `cur` and `hold` may
/// be `null`, and `cur`, `hold` and `bag` may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSnapshot {
    pub grid: Vec<Vec<u8>>,
    #[serde(default)]
    pub cur: Option<SavedPiece>,
    #[serde(default)]
    pub hold: Option<PieceKind>,
    #[serde(default)]
    pub bag: Vec<PieceKind>,
    pub score: usize,
    pub lines: usize,
    pub level: usize,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SnapshotError {
    #[display("malformed snapshot: {_0}")]
    Malformed(serde_json::Error),
    #[display("invalid snapshot grid: {_0}")]
    Grid(InvalidGridError),
    #[display("invalid snapshot piece shape: {_0}")]
    Shape(InvalidShapeError),
    #[display("snapshot piece shape is not a rotation of {}", _0.as_char())]
    ShapeMismatch(#[error(not(source))] PieceKind),
    #[display("snapshot piece does not fit the board")]
    PieceCollision,
    #[display("snapshot piece at ({x}, {y}) is outside the field")]
    PieceOutOfBounds { x: i32, y: i32 },
    #[display("snapshot level must be at least 1")]
    InvalidLevel,
    #[display("snapshot score, lines or level is out of range")]
    InvalidStats,
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err)
    }
}

impl From<InvalidGridError> for SnapshotError {
    fn from(err: InvalidGridError) -> Self {
        Self::Grid(err)
    }
}

impl From<InvalidShapeError> for SnapshotError {
    fn from(err: InvalidShapeError) -> Self {
        Self::Shape(err)
    }
}

/// Validated contents of a snapshot, ready to be swapped into a session.
#[derive(Debug, Clone)]
pub(crate) struct RestoredGame {
    pub(crate) board: Board,
    pub(crate) falling_piece: Option<ActivePiece>,
    pub(crate) held: Option<PieceKind>,
    pub(crate) bag: Vec<PieceKind>,
    pub(crate) stats: GameStats,
}

impl SavedPiece {
    #[must_use]
    pub fn from_piece(piece: &ActivePiece) -> Self {
        Self {
            kind: piece.kind(),
            x: piece.x(),
            y: piece.y(),
            shape: piece.shape().to_rows(),
        }
    }

    /// Whether the anchor lies where a piece can legally be: inside the
    /// columns, or at most one shape size above the ceiling or left of the
    /// wall.
    fn is_in_field(&self) -> bool {
        const MARGIN: i32 = MAX_SHAPE_SIZE as i32;
        const WIDTH: i32 = Board::WIDTH as i32;
        const HEIGHT: i32 = Board::HEIGHT as i32;
        (-MARGIN..WIDTH).contains(&self.x) && (-MARGIN..HEIGHT).contains(&self.y)
    }

    pub fn to_piece(&self) -> Result<ActivePiece, SnapshotError> {
        if !self.is_in_field() {
            return Err(SnapshotError::PieceOutOfBounds {
                x: self.x,
                y: self.y,
            });
        }
        let shape = Shape::from_rows(&self.shape)?;
        if PieceRotation::infer(self.kind, &shape).is_none() {
            return Err(SnapshotError::ShapeMismatch(self.kind));
        }
        Ok(ActivePiece::from_parts(self.kind, shape, self.x, self.y))
    }
}

impl SavedSnapshot {
    /// Parses a snapshot from its JSON blob. Content is validated later, on
    /// restore.
    pub fn from_blob(blob: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(blob)?)
    }

    pub fn to_blob(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks every field and converts the snapshot into engine values.
    ///
    /// Nothing is applied here, so a failure leaves the caller's state
    /// intact.
    pub(crate) fn validate(&self) -> Result<RestoredGame, SnapshotError> {
        if self.level == 0 {
            return Err(SnapshotError::InvalidLevel);
        }
        if self.score > MAX_SAVED_SCORE
            || self.lines > MAX_SAVED_LINES
            || self.level > MAX_SAVED_LEVEL
        {
            return Err(SnapshotError::InvalidStats);
        }
        let board = Board::from_grid(&self.grid)?;
        let falling_piece = self.cur.as_ref().map(SavedPiece::to_piece).transpose()?;
        if let Some(piece) = &falling_piece
            && board.collides(piece)
        {
            return Err(SnapshotError::PieceCollision);
        }
        Ok(RestoredGame {
            board,
            falling_piece,
            held: self.hold,
            bag: self.bag.clone(),
            stats: GameStats::restored(self.score, self.lines, self.level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_grid() -> Vec<Vec<u8>> {
        vec![vec![0; Board::WIDTH]; Board::HEIGHT]
    }

    #[test]
    fn test_parses_minimal_blob() {
        let grid = serde_json::to_string(&empty_grid()).unwrap();
        let blob = format!(r#"{{"grid":{grid},"score":10,"lines":1,"level":1}}"#);
        let snapshot = SavedSnapshot::from_blob(&blob).unwrap();
        assert_eq!(snapshot.cur, None);
        assert_eq!(snapshot.hold, None);
        assert!(snapshot.bag.is_empty());
        assert_eq!(snapshot.score, 10);
    }

    #[test]
    fn test_parses_null_piece_and_hold() {
        let grid = serde_json::to_string(&empty_grid()).unwrap();
        let blob = format!(
            r#"{{"grid":{grid},"cur":null,"hold":null,"bag":["I","T"],"score":0,"lines":0,"level":2}}"#
        );
        let snapshot = SavedSnapshot::from_blob(&blob).unwrap();
        assert_eq!(snapshot.bag, vec![PieceKind::I, PieceKind::T]);
        assert_eq!(snapshot.level, 2);
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let grid = serde_json::to_string(&empty_grid()).unwrap();
        let blob = format!(r#"{{"grid":{grid},"score":0,"lines":0}}"#);
        assert!(matches!(
            SavedSnapshot::from_blob(&blob),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(matches!(
            SavedSnapshot::from_blob("not json"),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn test_blob_uses_wire_names() {
        let snapshot = SavedSnapshot {
            grid: empty_grid(),
            cur: Some(SavedPiece::from_piece(&ActivePiece::spawn(PieceKind::T))),
            hold: Some(PieceKind::I),
            bag: vec![PieceKind::S],
            score: 1,
            lines: 2,
            level: 3,
        };
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_blob().unwrap()).unwrap();
        assert_eq!(value["cur"]["kind"], "T");
        assert_eq!(value["cur"]["x"], 3);
        assert_eq!(value["cur"]["shape"], serde_json::json!([[0, 1, 0], [1, 1, 1]]));
        assert_eq!(value["hold"], "I");
        assert_eq!(value["bag"], serde_json::json!(["S"]));
        assert_eq!(value["level"], 3);
    }

    #[test]
    fn test_validate_rejects_bad_content() {
        let base = SavedSnapshot {
            grid: empty_grid(),
            cur: None,
            hold: None,
            bag: vec![],
            score: 0,
            lines: 0,
            level: 1,
        };
        assert!(base.validate().is_ok());

        let snapshot = SavedSnapshot { level: 0, ..base.clone() };
        assert!(matches!(snapshot.validate(), Err(SnapshotError::InvalidLevel)));

        let snapshot = SavedSnapshot {
            grid: vec![vec![0; 10]; 3],
            ..base.clone()
        };
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Grid(_))));

        let snapshot = SavedSnapshot {
            cur: Some(SavedPiece {
                kind: PieceKind::O,
                x: 0,
                y: 0,
                shape: vec![vec![1, 1, 1]],
            }),
            ..base.clone()
        };
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::ShapeMismatch(PieceKind::O))
        ));

        let snapshot = SavedSnapshot {
            cur: Some(SavedPiece {
                kind: PieceKind::I,
                x: 8,
                y: 0,
                shape: vec![vec![1, 1, 1, 1]],
            }),
            ..base
        };
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::PieceCollision)
        ));
    }

    #[test]
    fn test_validate_rejects_piece_far_outside_field() {
        let base = SavedSnapshot {
            grid: empty_grid(),
            cur: None,
            hold: None,
            bag: vec![],
            score: 0,
            lines: 0,
            level: 1,
        };
        let with_o_at = |x, y| SavedSnapshot {
            cur: Some(SavedPiece {
                kind: PieceKind::O,
                x,
                y,
                shape: vec![vec![1, 1], vec![1, 1]],
            }),
            ..base.clone()
        };

        // Partly above the ceiling is a legal position.
        assert!(with_o_at(4, -1).validate().is_ok());
        assert!(with_o_at(4, -4).validate().is_ok());

        let outside = [
            (4, -5),
            (4, -200_000_000),
            (4, 20),
            (-5, 0),
            (10, 0),
            (i32::MAX, 0),
        ];
        for (x, y) in outside {
            assert!(
                matches!(
                    with_o_at(x, y).validate(),
                    Err(SnapshotError::PieceOutOfBounds { .. })
                ),
                "({x}, {y})"
            );
        }
    }

    #[test]
    fn test_validate_rejects_oversized_stats() {
        let base = SavedSnapshot {
            grid: empty_grid(),
            cur: None,
            hold: None,
            bag: vec![],
            score: MAX_SAVED_SCORE,
            lines: MAX_SAVED_LINES,
            level: MAX_SAVED_LEVEL,
        };
        assert!(base.validate().is_ok());

        for snapshot in [
            SavedSnapshot {
                score: usize::MAX,
                ..base.clone()
            },
            SavedSnapshot {
                lines: MAX_SAVED_LINES + 1,
                ..base.clone()
            },
            SavedSnapshot {
                level: usize::MAX / 4,
                ..base
            },
        ] {
            assert!(matches!(snapshot.validate(), Err(SnapshotError::InvalidStats)));
        }
    }

    #[test]
    fn test_validate_keeps_rotation() {
        let piece = ActivePiece::at(PieceKind::L, 2, 4).rotated_cw().rotated_cw();
        let saved = SavedPiece::from_piece(&piece);
        let restored = saved.to_piece().unwrap();
        assert_eq!(restored, piece);
        assert_eq!(restored.rotation().index(), 2);
    }
}
