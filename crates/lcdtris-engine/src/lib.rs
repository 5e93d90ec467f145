//! Falling-block puzzle engine: piece catalog, 7-bag randomizer, board,
//! falling-piece controller, scoring, the session state machine and the
//! bridge to an external save store.
//!
//! Rendering and input devices live outside this crate; a host feeds
//! [`Action`]s and frame callbacks into a [`GameLoop`] and draws the
//! [`RenderView`] it gets back.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// A move, rotation or spawn would overlap a wall, the floor or the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("piece collides with the board")]
pub struct PieceCollisionError;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum HoldError {
    #[display("held piece collides with the board")]
    PieceCollision(PieceCollisionError),
    #[display("hold already used for this piece")]
    HoldAlreadyUsed,
}
