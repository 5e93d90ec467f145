use std::time::Duration;

use arrayvec::ArrayVec;

use crate::core::{
    board::Board,
    piece::{ActivePiece, PieceKind},
};

use super::{session::SessionState, stats::GameStats};

/// Largest number of upcoming pieces a view carries.
pub const MAX_PREVIEW: usize = 7;

/// Everything a renderer needs to redraw one frame.
#[derive(Debug, Clone)]
pub struct RenderView<'a> {
    pub board: &'a Board,
    pub falling_piece: &'a ActivePiece,
    /// Landing position of the falling piece.
    pub drop_preview: ActivePiece,
    pub next_pieces: ArrayVec<PieceKind, MAX_PREVIEW>,
    pub held_piece: Option<PieceKind>,
    pub can_hold: bool,
    pub stats: &'a GameStats,
    pub state: SessionState,
    /// Free play left for a guest; `None` once authenticated.
    pub free_play_remaining: Option<Duration>,
}
