use std::time::{Duration, Instant};

use log::info;

use crate::core::piece::ActivePiece;

use super::{
    achievement::Achievement,
    bag::{PieceBag, PieceSeed},
    config::SessionConfig,
    field::{GameField, HoldResult, LockResult},
    snapshot::{SavedPiece, SavedSnapshot, SnapshotError},
    stats::GameStats,
    view::{MAX_PREVIEW, RenderView},
};

/// Lifecycle of a session.
///
/// ```text
/// Loading ──start──▶ Running ◀──pause/resume, blur/focus──▶ Paused
///                     │   │
///      guest deadline │   │ spawn collision
///                     ▼   ▼
///            GateBlocked   Over
/// ```
///
/// `GateBlocked` only leaves through authentication and `Over` only through
/// a restart (a new session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant, derive_more::Display)]
pub enum SessionState {
    Loading,
    Running,
    Paused,
    GateBlocked,
    Over,
}

/// What one scheduled tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum TickOutcome {
    /// The session is loading or paused; nothing moved.
    Inactive,
    /// The drop interval has not elapsed yet.
    Waiting,
    /// Gravity moved the piece down one row.
    Fell,
    /// Gravity could not move the piece, so it locked.
    Locked { cleared_lines: usize },
    GateBlocked,
    GameOver,
}

/// Logical player inputs, shared by keyboard and pointer bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    Rotate,
    Hold,
    TogglePause,
    Restart,
}

/// One play session: the field, its statistics and the state machine that
/// decides when gravity and input apply.
///
/// Time is passed in explicitly, so the session never reads a clock.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    field: GameField,
    stats: GameStats,
    state: SessionState,
    authenticated: bool,
    started_at: Option<Instant>,
    last_gravity: Option<Instant>,
    drop_interval: Duration,
    achievements: Vec<Achievement>,
}

impl GameSession {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    #[must_use]
    pub fn with_seed(config: SessionConfig, seed: PieceSeed) -> Self {
        let stats = GameStats::new(config.start_level);
        let drop_interval = config.drop_interval(stats.level());
        Self {
            field: GameField::with_seed(seed),
            stats,
            state: SessionState::Loading,
            authenticated: false,
            started_at: None,
            last_gravity: None,
            drop_interval,
            achievements: vec![],
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn field(&self) -> &GameField {
        &self.field
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Current gravity interval.
    #[must_use]
    pub fn drop_interval(&self) -> Duration {
        self.drop_interval
    }

    /// Leaves `Loading` and starts the gravity and free-play clocks.
    ///
    /// Returns `false` if the session had already started.
    pub fn start(&mut self, now: Instant) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        self.state = SessionState::Running;
        self.started_at = Some(now);
        self.last_gravity = Some(now);
        info!(
            "session started at level {} ({})",
            self.stats.level(),
            if self.authenticated { "authenticated" } else { "guest" }
        );
        true
    }

    /// Free play left for a guest, or `None` when authenticated.
    #[must_use]
    pub fn free_play_remaining(&self, now: Instant) -> Option<Duration> {
        if self.authenticated {
            return None;
        }
        let remaining = match self.started_at {
            Some(started_at) => {
                (started_at + self.config.free_play).saturating_duration_since(now)
            }
            None => self.config.free_play,
        };
        Some(remaining)
    }

    fn free_play_expired(&self, now: Instant) -> bool {
        !self.authenticated
            && self
                .started_at
                .is_some_and(|started_at| now > started_at + self.config.free_play)
    }

    /// Advances the session to `now`: checks the guest deadline, then applies
    /// at most one gravity step.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        match self.state {
            SessionState::Running => {}
            SessionState::Loading | SessionState::Paused => return TickOutcome::Inactive,
            SessionState::GateBlocked => return TickOutcome::GateBlocked,
            SessionState::Over => return TickOutcome::GameOver,
        }

        if self.free_play_expired(now) {
            self.state = SessionState::GateBlocked;
            info!("free play expired; session blocked until sign-in");
            return TickOutcome::GateBlocked;
        }

        let last_gravity = *self.last_gravity.get_or_insert(now);
        if now.saturating_duration_since(last_gravity) < self.drop_interval {
            return TickOutcome::Waiting;
        }
        self.last_gravity = Some(now);

        if self.field.step_down().is_ok() {
            return TickOutcome::Fell;
        }
        self.lock_piece()
    }

    /// Switches between `Running` and `Paused`; other states are unaffected.
    pub fn toggle_pause(&mut self, now: Instant) {
        match self.state {
            SessionState::Running => self.state = SessionState::Paused,
            SessionState::Paused => self.resume(now),
            SessionState::Loading | SessionState::GateBlocked | SessionState::Over => {}
        }
    }

    /// The host lost foreground focus. Returns `true` if this paused the game.
    pub fn focus_lost(&mut self) -> bool {
        if self.state.is_running() {
            self.state = SessionState::Paused;
            return true;
        }
        false
    }

    /// The host regained foreground focus.
    pub fn focus_gained(&mut self, now: Instant) {
        if self.state.is_paused() {
            self.resume(now);
        }
    }

    fn resume(&mut self, now: Instant) {
        self.state = SessionState::Running;
        // Time spent paused does not count towards the next gravity step.
        self.last_gravity = Some(now);
    }

    /// Updates the authentication flag. Authenticating lifts the free-play
    /// gate.
    pub fn set_authenticated(&mut self, authenticated: bool, now: Instant) {
        self.authenticated = authenticated;
        if authenticated && self.state.is_gate_blocked() {
            info!("signed in; free-play gate lifted");
            self.resume(now);
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.state.is_running() && self.field.move_horizontal(-1).is_ok()
    }

    pub fn move_right(&mut self) -> bool {
        self.state.is_running() && self.field.move_horizontal(1).is_ok()
    }

    pub fn rotate(&mut self) -> bool {
        self.state.is_running() && self.field.rotate().is_ok()
    }

    /// Moves the piece down one row for a point, or locks it if it is
    /// resting. Returns `true` if a lock happened.
    pub fn soft_drop(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        if self.field.step_down().is_ok() {
            self.stats.record_soft_drop(1);
            return false;
        }
        self.lock_piece();
        true
    }

    /// Drops the piece to its landing row and locks it. Returns the number
    /// of rows travelled, or `None` when not running.
    pub fn hard_drop(&mut self) -> Option<usize> {
        if !self.state.is_running() {
            return None;
        }
        let distance = self.field.drop_distance();
        let landed = self.field.drop_preview();
        // The landing position never collides.
        _ = self.field.set_falling_piece(landed);
        let achievement = self.stats.record_hard_drop(distance);
        self.push_achievements(achievement);
        self.lock_piece();
        Some(distance)
    }

    pub fn hold(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        match self.field.hold() {
            Ok(HoldResult::Stored { topped_out: true }) => {
                self.game_over();
                true
            }
            Ok(_) => true,
            Err(_) => false,
        }
    }

    /// Applies a player action. `Restart` is left to the owner of the
    /// session, since it replaces the session entirely.
    ///
    /// Returns `true` if the action changed anything.
    pub fn apply(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::MoveLeft => self.move_left(),
            Action::MoveRight => self.move_right(),
            Action::SoftDrop => {
                let before = (self.field.falling_piece().y(), self.stats.completed_pieces());
                self.soft_drop();
                before != (self.field.falling_piece().y(), self.stats.completed_pieces())
            }
            Action::HardDrop => self.hard_drop().is_some(),
            Action::Rotate => self.rotate(),
            Action::Hold => self.hold(),
            Action::TogglePause => {
                let before = self.state;
                self.toggle_pause(now);
                before != self.state
            }
            Action::Restart => false,
        }
    }

    fn lock_piece(&mut self) -> TickOutcome {
        let LockResult {
            cleared_lines,
            topped_out,
        } = self.field.lock();
        let achievements = self.stats.complete_piece_drop(cleared_lines);
        self.push_achievements(achievements);
        self.drop_interval = self.config.drop_interval(self.stats.level());
        if topped_out {
            self.game_over();
            return TickOutcome::GameOver;
        }
        TickOutcome::Locked { cleared_lines }
    }

    fn game_over(&mut self) {
        self.state = SessionState::Over;
        info!(
            "game over: score {}, lines {}, level {}",
            self.stats.score(),
            self.stats.lines(),
            self.stats.level()
        );
    }

    fn push_achievements(&mut self, achievements: impl IntoIterator<Item = Achievement>) {
        if self.authenticated {
            self.achievements.extend(achievements);
        }
    }

    /// Achievements unlocked since the last call. Guests never collect any.
    pub fn take_achievements(&mut self) -> Vec<Achievement> {
        std::mem::take(&mut self.achievements)
    }

    /// Captures the resumable part of the game.
    #[must_use]
    pub fn snapshot(&self) -> SavedSnapshot {
        SavedSnapshot {
            grid: self.field.board().to_grid(),
            cur: Some(SavedPiece::from_piece(self.field.falling_piece())),
            hold: self.field.held_piece(),
            bag: self.field.bag_queue().collect(),
            score: self.stats.score(),
            lines: self.stats.lines(),
            level: self.stats.level(),
        }
    }

    /// Replaces the game with a saved one in a single swap.
    ///
    /// The snapshot is validated completely first; on error the session is
    /// left exactly as it was. A snapshot without a current piece spawns the
    /// next piece from its bag. Timing and lifecycle state are kept.
    pub fn restore(&mut self, snapshot: &SavedSnapshot) -> Result<(), SnapshotError> {
        let restored = snapshot.validate()?;
        let seed: PieceSeed = rand::random();
        let mut bag = PieceBag::from_queue(seed, restored.bag);
        let falling_piece = match restored.falling_piece {
            Some(piece) => piece,
            None => {
                let piece = ActivePiece::spawn(bag.next());
                if restored.board.collides(&piece) {
                    return Err(SnapshotError::PieceCollision);
                }
                piece
            }
        };

        self.field = GameField::from_parts(seed, restored.board, falling_piece, bag, restored.held);
        self.stats = restored.stats;
        self.drop_interval = self.config.drop_interval(self.stats.level());
        info!(
            "restored saved game: score {}, lines {}, level {}",
            self.stats.score(),
            self.stats.lines(),
            self.stats.level()
        );
        Ok(())
    }

    #[must_use]
    pub fn view(&self, now: Instant) -> RenderView<'_> {
        RenderView {
            board: self.field.board(),
            falling_piece: self.field.falling_piece(),
            drop_preview: self.field.drop_preview(),
            next_pieces: self
                .field
                .next_pieces()
                .take(self.config.preview_len.min(MAX_PREVIEW))
                .collect(),
            held_piece: self.field.held_piece(),
            can_hold: self.field.can_hold(),
            stats: &self.stats,
            state: self.state,
            free_play_remaining: self.free_play_remaining(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Board, PieceKind};

    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn started(authenticated: bool) -> (GameSession, Instant) {
        let mut session =
            GameSession::with_seed(SessionConfig::default(), PieceSeed::from_bytes([3; 16]));
        let now = Instant::now();
        session.set_authenticated(authenticated, now);
        assert!(session.start(now));
        (session, now)
    }

    fn grid_from_ascii(art: &str) -> Vec<Vec<u8>> {
        Board::from_ascii(art).to_grid()
    }

    fn restore_with(session: &mut GameSession, grid: Vec<Vec<u8>>, piece: &ActivePiece) {
        let snapshot = SavedSnapshot {
            grid,
            cur: Some(SavedPiece::from_piece(piece)),
            hold: None,
            bag: vec![PieceKind::T, PieceKind::O],
            score: 0,
            lines: 0,
            level: 1,
        };
        session.restore(&snapshot).unwrap();
    }

    #[test]
    fn test_loading_until_started() {
        let mut session = GameSession::new(SessionConfig::default());
        let now = Instant::now();
        assert!(session.state().is_loading());
        assert_eq!(session.tick(now + Duration::from_secs(5)), TickOutcome::Inactive);
        assert!(!session.move_left());
        assert!(session.start(now));
        assert!(!session.start(now));
        assert!(session.state().is_running());
    }

    #[test]
    fn test_gravity_waits_for_interval() {
        let (mut session, start) = started(true);
        let y = session.field().falling_piece().y();
        assert_eq!(session.tick(start + 899 * MS), TickOutcome::Waiting);
        assert_eq!(session.tick(start + 900 * MS), TickOutcome::Fell);
        assert_eq!(session.field().falling_piece().y(), y + 1);
        assert_eq!(session.tick(start + 1000 * MS), TickOutcome::Waiting);
        assert_eq!(session.tick(start + 1800 * MS), TickOutcome::Fell);
        assert_eq!(session.stats().score(), 0);
    }

    #[test]
    fn test_pause_skips_gravity_and_input() {
        let (mut session, start) = started(true);
        session.toggle_pause(start + 100 * MS);
        assert!(session.state().is_paused());
        assert_eq!(session.tick(start + 5000 * MS), TickOutcome::Inactive);
        assert!(!session.rotate());
        assert_eq!(session.hard_drop(), None);

        session.toggle_pause(start + 6000 * MS);
        assert!(session.state().is_running());
        assert_eq!(session.tick(start + 6100 * MS), TickOutcome::Waiting);
        assert_eq!(session.tick(start + 6900 * MS), TickOutcome::Fell);
    }

    #[test]
    fn test_focus_pauses_and_resumes() {
        let (mut session, start) = started(false);
        assert!(session.focus_lost());
        assert!(session.state().is_paused());
        assert!(!session.focus_lost());
        session.focus_gained(start + 10 * MS);
        assert!(session.state().is_running());
    }

    #[test]
    fn test_guest_is_gate_blocked_after_free_play() {
        let (mut session, start) = started(false);
        let deadline = start + session.config().free_play;
        assert_eq!(session.free_play_remaining(start), Some(session.config().free_play));
        assert_ne!(session.tick(deadline), TickOutcome::GateBlocked);

        assert_eq!(session.tick(deadline + MS), TickOutcome::GateBlocked);
        assert!(session.state().is_gate_blocked());
        assert_eq!(session.free_play_remaining(deadline + MS), Some(Duration::ZERO));
        assert_eq!(session.tick(deadline + 10 * MS), TickOutcome::GateBlocked);
        assert!(!session.move_right());
        session.toggle_pause(deadline + 10 * MS);
        assert!(session.state().is_gate_blocked());
        session.focus_gained(deadline + 10 * MS);
        assert!(session.state().is_gate_blocked());

        session.set_authenticated(true, deadline + 20 * MS);
        assert!(session.state().is_running());
        assert_eq!(session.free_play_remaining(deadline), None);
        assert_ne!(session.tick(deadline + 30 * MS), TickOutcome::GateBlocked);
    }

    #[test]
    fn test_authenticated_session_is_never_gated() {
        let (mut session, start) = started(true);
        let later = start + session.config().free_play * 3;
        assert_ne!(session.tick(later), TickOutcome::GateBlocked);
    }

    #[test]
    fn test_hard_drop_awards_two_points_per_cell() {
        let (mut session, _) = started(true);
        restore_with(
            &mut session,
            Board::new().to_grid(),
            &ActivePiece::at(PieceKind::O, 4, 0),
        );
        assert_eq!(session.hard_drop(), Some(18));
        assert_eq!(session.stats().score(), 36);
        assert_eq!(session.stats().completed_pieces(), 1);
        assert_eq!(session.take_achievements(), vec![Achievement::SpeedDemon]);
        assert!(session.take_achievements().is_empty());
    }

    #[test]
    fn test_hard_drop_from_rest_locks_without_bonus() {
        let (mut session, _) = started(true);
        restore_with(
            &mut session,
            Board::new().to_grid(),
            &ActivePiece::at(PieceKind::O, 0, 18),
        );
        assert_eq!(session.hard_drop(), Some(0));
        assert_eq!(session.stats().score(), 0);
        assert_eq!(session.stats().completed_pieces(), 1);
        assert!(session.field().board().is_occupied(0, 18));
        assert!(session.field().board().is_occupied(1, 19));
        assert_eq!(session.field().falling_piece().kind(), PieceKind::T);
        assert_eq!(session.field().falling_piece().y(), 0);
        assert!(session.take_achievements().is_empty());
    }

    #[test]
    fn test_tetris_by_hard_drop() {
        let (mut session, _) = started(true);
        let grid = grid_from_ascii(
            "
            .#########
            .#########
            .#########
            .#########
            ",
        );
        let vertical_i = ActivePiece::at(PieceKind::I, 0, 0).rotated_cw();
        restore_with(&mut session, grid, &vertical_i);

        assert_eq!(session.hard_drop(), Some(16));
        assert_eq!(session.stats().score(), 32 + 1200);
        assert_eq!(session.stats().lines(), 4);
        assert_eq!(session.stats().line_cleared_counter()[4], 1);
        assert!(session.field().board().rows().flatten().all(|&cell| !cell));
        assert_eq!(
            session.take_achievements(),
            vec![Achievement::SpeedDemon, Achievement::Tetris]
        );
    }

    #[test]
    fn test_guest_collects_no_achievements() {
        let (mut session, _) = started(false);
        session.hard_drop();
        assert!(session.take_achievements().is_empty());
    }

    #[test]
    fn test_soft_drop_scores_and_locks() {
        let (mut session, _) = started(true);
        restore_with(
            &mut session,
            Board::new().to_grid(),
            &ActivePiece::at(PieceKind::O, 4, 17),
        );
        assert!(!session.soft_drop());
        assert_eq!(session.stats().score(), 1);
        assert!(session.soft_drop());
        assert_eq!(session.stats().score(), 1);
        assert_eq!(session.stats().completed_pieces(), 1);
    }

    #[test]
    fn test_gravity_locks_resting_piece() {
        let (mut session, start) = started(true);
        restore_with(
            &mut session,
            Board::new().to_grid(),
            &ActivePiece::at(PieceKind::O, 4, 18),
        );
        assert_eq!(
            session.tick(start + 900 * MS),
            TickOutcome::Locked { cleared_lines: 0 }
        );
        assert_eq!(session.stats().score(), 0);
    }

    #[test]
    fn test_spawn_collision_ends_game() {
        let (mut session, start) = started(true);
        let mut grid = vec![vec![0; Board::WIDTH]; Board::HEIGHT];
        for row in &mut grid {
            row[3..=6].fill(1);
        }
        restore_with(&mut session, grid, &ActivePiece::at(PieceKind::O, 0, 18));

        assert_eq!(session.hard_drop(), Some(0));
        assert!(session.state().is_over());
        assert_eq!(session.tick(start + Duration::from_secs(10)), TickOutcome::GameOver);
        assert!(!session.move_left());
        assert!(!session.apply(Action::TogglePause, start));
        assert!(session.state().is_over());
    }

    #[test]
    fn test_invalid_restore_keeps_state() {
        let (mut session, _) = started(true);
        session.hard_drop();
        let before = session.snapshot();

        let mut broken = before.clone();
        broken.grid.pop();
        assert!(session.restore(&broken).is_err());
        assert_eq!(session.snapshot(), before);

        let broken = SavedSnapshot { level: 0, ..before.clone() };
        assert!(session.restore(&broken).is_err());
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_snapshot_restores_into_new_session() {
        let (mut session, start) = started(true);
        session.hard_drop();
        session.hold();
        session.rotate();
        let snapshot = session.snapshot();

        let mut other = GameSession::new(SessionConfig::default());
        other.start(start);
        other.restore(&snapshot).unwrap();
        assert_eq!(other.snapshot(), snapshot);
        assert_eq!(other.stats().score(), session.stats().score());
        assert!(other.field().can_hold());
    }

    #[test]
    fn test_restore_without_piece_spawns_from_bag() {
        let (mut session, _) = started(true);
        let snapshot = SavedSnapshot {
            grid: Board::new().to_grid(),
            cur: None,
            hold: Some(PieceKind::I),
            bag: vec![PieceKind::Z, PieceKind::S],
            score: 500,
            lines: 42,
            level: 5,
        };
        session.restore(&snapshot).unwrap();
        assert_eq!(session.field().falling_piece().kind(), PieceKind::Z);
        assert_eq!(session.field().next_pieces().next(), Some(PieceKind::S));
        assert_eq!(session.field().held_piece(), Some(PieceKind::I));
        assert_eq!(session.drop_interval(), Duration::from_millis(700));
    }

    #[test]
    fn test_view_exposes_render_state() {
        let (session, start) = started(false);
        let view = session.view(start);
        assert_eq!(view.next_pieces.len(), 5);
        assert_eq!(view.state, SessionState::Running);
        assert_eq!(view.free_play_remaining, Some(Duration::from_secs(300)));
        assert_eq!(view.drop_preview.kind(), view.falling_piece.kind());
        assert!(view.drop_preview.y() >= view.falling_piece.y());
    }
}
