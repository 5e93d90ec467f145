//! Game engine logic and state management.
//!
//! This module builds the game on top of the core data structures:
//!
//! - [`PieceBag`] - 7-bag piece generation
//! - [`GameField`] - Board, falling piece, upcoming queue and hold slot
//! - [`GameStats`] - Score, lines, level and line-clear histogram
//! - [`GameSession`] - Session state machine (loading, running, paused,
//!   gate-blocked, over), gravity timing and player actions
//! - [`GameLoop`] - Frame scheduling, restarts and the link to the
//!   [`PersistenceBridge`]
//! - [`SavedSnapshot`] - Resumable game state exchanged with a
//!   [`SaveStore`]
//!
//! # Game Flow
//!
//! 1. Create a [`GameLoop`] (with a bridge for a signed-in player)
//! 2. Call [`GameLoop::start`] once the loading screen is done
//! 3. On every host frame, run the pending frame; gravity moves the piece
//!    down once per drop interval
//! 4. Route player input through [`GameLoop::handle_action`]
//! 5. A locked piece clears lines, updates the score and spawns the next
//!    piece; a spawn collision ends the game
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//!
//! use lcdtris_engine::{Action, GameLoop, SessionConfig};
//!
//! let mut game = GameLoop::new(SessionConfig::default(), None);
//! let start = Instant::now();
//! game.start(start);
//!
//! game.handle_action(Action::Rotate, start);
//! game.handle_action(Action::HardDrop, start);
//!
//! let frame = game.pending_frame().unwrap();
//! game.run_frame(frame, start + Duration::from_millis(16));
//! assert_eq!(game.session().stats().completed_pieces(), 1);
//! ```

pub use self::{
    achievement::*, bag::*, config::*, field::*, game_loop::*, persistence::*, session::*,
    snapshot::*, stats::*, view::*,
};

mod achievement;
mod bag;
mod config;
mod field;
mod game_loop;
mod persistence;
mod session;
mod snapshot;
mod stats;
mod view;
