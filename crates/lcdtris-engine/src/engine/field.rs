use crate::{
    HoldError, PieceCollisionError,
    core::{
        board::Board,
        piece::{ActivePiece, PieceKind},
    },
};

use super::bag::{PieceBag, PieceSeed};

/// Column offsets tried, in order, when a rotation collides in place.
///
/// `+1` first, then `-1` (two columns back from the first attempt). This is
/// a minimal wall kick, not a rotation-system kick table.
const KICK_OFFSETS: [i32; 3] = [0, 1, -1];

/// Outcome of locking the falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockResult {
    /// Rows removed by the lock (0-4).
    pub cleared_lines: usize,
    /// The next piece collided as soon as it spawned.
    pub topped_out: bool,
}

/// Outcome of a successful hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum HoldResult {
    /// The slot was empty; the current piece went in and the next piece spawned.
    Stored { topped_out: bool },
    /// The current piece and the held piece traded places.
    Swapped,
}

/// Board, falling piece, upcoming queue and hold slot of one game.
///
/// Every operation either commits a non-colliding state or leaves the field
/// untouched and reports an error; a falling piece never overlaps the stack,
/// except for the spawned piece that tops out the game.
#[derive(Debug, Clone)]
pub struct GameField {
    seed: PieceSeed,
    board: Board,
    falling_piece: ActivePiece,
    bag: PieceBag,
    held: Option<PieceKind>,
    can_hold: bool,
}

impl Default for GameField {
    fn default() -> Self {
        Self::new()
    }
}

impl GameField {
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let mut bag = PieceBag::with_seed(seed);
        let falling_piece = ActivePiece::spawn(bag.next());
        Self {
            seed,
            board: Board::new(),
            falling_piece,
            bag,
            held: None,
            can_hold: true,
        }
    }

    /// Assembles a field from restored parts. The caller guarantees that
    /// `falling_piece` does not collide with `board`.
    pub(crate) fn from_parts(
        seed: PieceSeed,
        board: Board,
        falling_piece: ActivePiece,
        bag: PieceBag,
        held: Option<PieceKind>,
    ) -> Self {
        Self {
            seed,
            board,
            falling_piece,
            bag,
            held,
            can_hold: true,
        }
    }

    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.seed
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn falling_piece(&self) -> &ActivePiece {
        &self.falling_piece
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.held
    }

    /// Whether hold is still available for the current piece.
    #[must_use]
    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.peek()
    }

    pub fn set_falling_piece(&mut self, piece: ActivePiece) -> Result<(), PieceCollisionError> {
        if self.board.collides(&piece) {
            return Err(PieceCollisionError);
        }
        self.falling_piece = piece;
        Ok(())
    }

    /// Draws the next kind from the bag and spawns it centered on row 0.
    ///
    /// Re-enables hold. The piece is placed even when it collides, and the
    /// collision is reported so the caller can end the game.
    pub fn spawn_next(&mut self) -> Result<(), PieceCollisionError> {
        let piece = ActivePiece::spawn(self.bag.next());
        self.falling_piece = piece;
        self.can_hold = true;
        if self.board.collides(&piece) {
            return Err(PieceCollisionError);
        }
        Ok(())
    }

    pub fn move_horizontal(&mut self, dx: i32) -> Result<(), PieceCollisionError> {
        self.set_falling_piece(self.falling_piece.moved(dx, 0))
    }

    pub fn step_down(&mut self) -> Result<(), PieceCollisionError> {
        self.set_falling_piece(self.falling_piece.moved(0, 1))
    }

    /// Number of rows the falling piece can still descend.
    #[must_use]
    pub fn drop_distance(&self) -> usize {
        let mut distance = 0;
        let mut piece = self.falling_piece.moved(0, 1);
        while !self.board.collides(&piece) {
            distance += 1;
            piece = piece.moved(0, 1);
        }
        distance
    }

    /// Where the falling piece would land after a hard drop.
    #[must_use]
    pub fn drop_preview(&self) -> ActivePiece {
        let mut dropped = self.falling_piece;
        while !self.board.collides(&dropped.moved(0, 1)) {
            dropped = dropped.moved(0, 1);
        }
        dropped
    }

    /// Rotates the falling piece clockwise, trying each kick offset in turn.
    ///
    /// On failure the piece keeps its previous shape and anchor.
    pub fn rotate(&mut self) -> Result<(), PieceCollisionError> {
        let rotated = self.falling_piece.rotated_cw();
        KICK_OFFSETS
            .iter()
            .map(|&dx| rotated.moved(dx, 0))
            .find(|piece| !self.board.collides(piece))
            .map(|piece| self.falling_piece = piece)
            .ok_or(PieceCollisionError)
    }

    /// Moves the falling piece into the hold slot.
    ///
    /// With an empty slot the next piece spawns as usual. With an occupied
    /// slot the held kind comes back at [`ActivePiece::HOLD_ANCHOR`] in
    /// spawn orientation. Either way hold stays disabled until the next
    /// piece spawns from the bag.
    pub fn hold(&mut self) -> Result<HoldResult, HoldError> {
        if !self.can_hold {
            return Err(HoldError::HoldAlreadyUsed);
        }

        let current = self.falling_piece.kind();
        let result = if let Some(held) = self.held {
            let (x, y) = ActivePiece::HOLD_ANCHOR;
            self.set_falling_piece(ActivePiece::at(held, x, y))
                .map_err(HoldError::PieceCollision)?;
            self.held = Some(current);
            HoldResult::Swapped
        } else {
            self.held = Some(current);
            let topped_out = self.spawn_next().is_err();
            HoldResult::Stored { topped_out }
        };
        self.can_hold = false;
        Ok(result)
    }

    /// Merges the falling piece into the board, clears full rows and spawns
    /// the next piece.
    pub fn lock(&mut self) -> LockResult {
        self.board.merge(&self.falling_piece);
        let cleared_lines = self.board.clear_lines();
        let topped_out = self.spawn_next().is_err();
        LockResult {
            cleared_lines,
            topped_out,
        }
    }

    /// Kinds waiting in the bag, in draw order.
    pub(crate) fn bag_queue(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.peek()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(board: Board, piece: ActivePiece) -> GameField {
        let seed = PieceSeed::from_bytes([5; 16]);
        let mut field = GameField::with_seed(seed);
        field.board = board;
        field.falling_piece = piece;
        field
    }

    #[test]
    fn test_first_piece_spawns_centered() {
        let field = GameField::with_seed(PieceSeed::from_bytes([1; 16]));
        let piece = field.falling_piece();
        assert_eq!(piece.y(), 0);
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let expected_x = ((Board::WIDTH - piece.shape().width()) / 2) as i32;
        assert_eq!(piece.x(), expected_x);
        assert!(field.can_hold());
    }

    #[test]
    fn test_move_is_rejected_at_wall() {
        let mut field = field_with(Board::new(), ActivePiece::at(PieceKind::O, 0, 5));
        assert!(field.move_horizontal(-1).is_err());
        assert_eq!(field.falling_piece().x(), 0);
        assert!(field.move_horizontal(1).is_ok());
        assert_eq!(field.falling_piece().x(), 1);
    }

    #[test]
    fn test_move_is_rejected_by_stack() {
        let board = Board::from_ascii(
            "
            ...#......
            ",
        );
        let mut field = field_with(board, ActivePiece::at(PieceKind::O, 1, 18));
        assert!(field.move_horizontal(1).is_err());
        assert_eq!(field.falling_piece().x(), 1);
    }

    #[test]
    fn test_rotate_in_open_space() {
        let mut field = field_with(Board::new(), ActivePiece::at(PieceKind::T, 4, 5));
        assert!(field.rotate().is_ok());
        let piece = field.falling_piece();
        assert_eq!((piece.x(), piece.y()), (4, 5));
        assert_eq!(piece.shape(), &PieceKind::T.canonical_shape().rotated_cw());
    }

    #[test]
    fn test_rotate_kicks_right() {
        // J pointing left; the cell at its anchor blocks the in-place rotation.
        let board = {
            let mut grid = vec![vec![0; Board::WIDTH]; Board::HEIGHT];
            grid[10][3] = 1;
            Board::from_grid(&grid).unwrap()
        };
        let piece = ActivePiece::at(PieceKind::J, 3, 10)
            .rotated_cw()
            .rotated_cw()
            .rotated_cw();
        let mut field = field_with(board, piece);
        assert!(field.rotate().is_ok());
        let piece = field.falling_piece();
        assert_eq!(piece.x(), 4);
        assert_eq!(piece.shape(), &PieceKind::J.canonical_shape());
    }

    #[test]
    fn test_rotate_kicks_left_at_wall() {
        let piece = ActivePiece::at(PieceKind::T, 8, 5).rotated_cw();
        let mut field = field_with(Board::new(), piece);
        assert!(field.rotate().is_ok());
        assert_eq!(field.falling_piece().x(), 7);
    }

    #[test]
    fn test_rotate_reverts_when_every_kick_collides() {
        let piece = ActivePiece::at(PieceKind::I, 9, 5).rotated_cw();
        let mut field = field_with(Board::new(), piece);
        assert!(field.rotate().is_err());
        assert_eq!(field.falling_piece(), &piece);
    }

    #[test]
    fn test_drop_distance_and_preview() {
        let board = Board::from_ascii(
            "
            ##########
            ##########
            ",
        );
        let field = field_with(board, ActivePiece::at(PieceKind::O, 4, 0));
        assert_eq!(field.drop_distance(), 16);
        assert_eq!(field.drop_preview().y(), 16);
    }

    #[test]
    fn test_lock_clears_and_spawns() {
        let board = Board::from_ascii(
            "
            ####..####
            ####..####
            ",
        );
        let mut field = field_with(board, ActivePiece::at(PieceKind::O, 4, 18));
        let result = field.lock();
        assert_eq!(
            result,
            LockResult {
                cleared_lines: 2,
                topped_out: false
            }
        );
        assert!(field.board().rows().flatten().all(|&cell| !cell));
        assert_eq!(field.falling_piece().y(), 0);
    }

    #[test]
    fn test_lock_reports_top_out() {
        // A column blocks every spawn position.
        let mut grid = vec![vec![0; Board::WIDTH]; Board::HEIGHT];
        for row in &mut grid[..18] {
            row[3..7].fill(1);
        }
        let board = Board::from_grid(&grid).unwrap();
        let mut field = field_with(board, ActivePiece::at(PieceKind::I, 0, 19));
        assert!(field.lock().topped_out);
    }

    #[test]
    fn test_hold_stores_then_swaps() {
        let mut field = GameField::with_seed(PieceSeed::from_bytes([2; 16]));
        let first = field.falling_piece().kind();
        let second = field.next_pieces().next().unwrap();

        assert_eq!(field.hold().unwrap(), HoldResult::Stored { topped_out: false });
        assert_eq!(field.held_piece(), Some(first));
        assert_eq!(field.falling_piece().kind(), second);
        assert!(!field.can_hold());
        assert!(matches!(field.hold(), Err(HoldError::HoldAlreadyUsed)));

        field.lock();
        assert!(field.can_hold());
        let third = field.falling_piece().kind();

        assert_eq!(field.hold().unwrap(), HoldResult::Swapped);
        assert_eq!(field.held_piece(), Some(third));
        let piece = field.falling_piece();
        assert_eq!(piece.kind(), first);
        assert_eq!((piece.x(), piece.y()), ActivePiece::HOLD_ANCHOR);
        assert_eq!(piece.rotation().index(), 0);
        assert!(!field.can_hold());
    }

    #[test]
    fn test_hold_swap_rejected_on_collision() {
        let mut field = GameField::with_seed(PieceSeed::from_bytes([4; 16]));
        field.held = Some(PieceKind::I);
        let mut grid = vec![vec![0; Board::WIDTH]; Board::HEIGHT];
        grid[0][4] = 1;
        field.board = Board::from_grid(&grid).unwrap();
        field.falling_piece = ActivePiece::at(PieceKind::O, 0, 5);

        assert!(matches!(field.hold(), Err(HoldError::PieceCollision(_))));
        assert_eq!(field.held_piece(), Some(PieceKind::I));
        assert_eq!(field.falling_piece().kind(), PieceKind::O);
        assert!(field.can_hold());
    }
}
