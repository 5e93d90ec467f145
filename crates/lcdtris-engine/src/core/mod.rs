//! Static game data: the piece catalog and the playfield grid.

pub use self::{board::*, piece::*};

pub(crate) mod board;
pub(crate) mod piece;
