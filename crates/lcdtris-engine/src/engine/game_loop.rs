use std::time::Instant;

use log::{info, warn};

use super::{
    bag::PieceSeed,
    config::SessionConfig,
    persistence::{BridgeEvent, PersistenceBridge},
    session::{Action, GameSession, SessionState, TickOutcome},
    snapshot::SavedSnapshot,
};

/// Handle for a scheduled frame.
///
/// Frames belong to an epoch; a restart starts a new epoch, so a frame
/// scheduled before it can no longer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameId {
    epoch: u64,
    seq: u64,
}

/// Result of [`GameLoop::run_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum FrameOutcome {
    /// The frame was not the pending one (cancelled by a restart, or
    /// already run). Nothing happened.
    Cancelled,
    /// The tick ran and the next frame is scheduled.
    Continue(TickOutcome),
    /// The tick ran and the loop stopped scheduling frames (game over or
    /// gate blocked).
    Halted(TickOutcome),
}

/// Drives a [`GameSession`] from host frame callbacks and connects it to the
/// persistence bridge.
///
/// The host asks for [`pending_frame`](Self::pending_frame) and calls
/// [`run_frame`](Self::run_frame) with it on its next callback. Each frame
/// drains collaborator completions, runs one session tick and schedules the
/// next frame unless the session reached a halting state.
#[derive(Debug)]
pub struct GameLoop {
    config: SessionConfig,
    session: GameSession,
    bridge: Option<PersistenceBridge>,
    epoch: u64,
    next_seq: u64,
    pending: Option<FrameId>,
    last_autosave: Option<Instant>,
}

impl GameLoop {
    /// Creates a loop for a guest (`bridge` is `None`) or an authenticated
    /// player.
    #[must_use]
    pub fn new(config: SessionConfig, bridge: Option<PersistenceBridge>) -> Self {
        Self::with_session(GameSession::new(config.clone()), config, bridge)
    }

    #[must_use]
    pub fn with_seed(
        config: SessionConfig,
        seed: PieceSeed,
        bridge: Option<PersistenceBridge>,
    ) -> Self {
        Self::with_session(GameSession::with_seed(config.clone(), seed), config, bridge)
    }

    fn with_session(
        mut session: GameSession,
        config: SessionConfig,
        bridge: Option<PersistenceBridge>,
    ) -> Self {
        // Sessions start in `Loading`, so the timestamp is never read.
        session.set_authenticated(bridge.is_some(), Instant::now());
        let mut this = Self {
            config,
            session,
            bridge,
            epoch: 0,
            next_seq: 0,
            pending: None,
            last_autosave: None,
        };
        this.request_frame();
        this
    }

    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    #[must_use]
    pub fn bridge(&self) -> Option<&PersistenceBridge> {
        self.bridge.as_ref()
    }

    #[must_use]
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending
    }

    fn request_frame(&mut self) -> FrameId {
        let id = FrameId {
            epoch: self.epoch,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending = Some(id);
        id
    }

    /// Ends the loading phase and asks the store for a saved game.
    pub fn start(&mut self, now: Instant) {
        if !self.session.start(now) {
            return;
        }
        self.last_autosave = Some(now);
        if let Some(bridge) = &mut self.bridge {
            bridge.request_load();
        }
    }

    /// Runs the frame `id` if it is still the pending one.
    pub fn run_frame(&mut self, id: FrameId, now: Instant) -> FrameOutcome {
        if self.pending != Some(id) {
            return FrameOutcome::Cancelled;
        }
        self.pending = None;

        self.poll_collaborators(now);
        let outcome = self.session.tick(now);
        self.flush_achievements();

        match self.session.state() {
            SessionState::Over | SessionState::GateBlocked => FrameOutcome::Halted(outcome),
            SessionState::Loading | SessionState::Running | SessionState::Paused => {
                self.request_frame();
                FrameOutcome::Continue(outcome)
            }
        }
    }

    /// Applies completions from the store and fires the autosave timer.
    pub fn poll_collaborators(&mut self, now: Instant) {
        let Some(bridge) = &mut self.bridge else {
            return;
        };
        for event in bridge.poll() {
            match event {
                BridgeEvent::Loaded(Some(blob)) => self.apply_loaded(&blob),
                BridgeEvent::Loaded(None) => info!("no saved game; starting fresh"),
                BridgeEvent::Saved | BridgeEvent::SaveFailed | BridgeEvent::LoadFailed => {}
            }
        }

        let autosave_due = self.last_autosave.is_some_and(|last| {
            now.saturating_duration_since(last) >= self.config.autosave_interval
        });
        if autosave_due && (self.session.state().is_running() || self.session.state().is_paused())
        {
            self.last_autosave = Some(now);
            self.save();
        }
    }

    fn apply_loaded(&mut self, blob: &str) {
        let restored =
            SavedSnapshot::from_blob(blob).and_then(|snapshot| self.session.restore(&snapshot));
        if let Err(err) = restored {
            warn!("ignoring saved game: {err}");
        }
    }

    /// Whether the current game is worth saving. A topped-out game is not:
    /// its piece overlaps the stack, so the save could never be restored.
    fn is_resumable(&self) -> bool {
        let state = self.session.state();
        !state.is_loading() && !state.is_over()
    }

    /// Queues a save of the current game. Does nothing for guests, before
    /// the game starts, after it is over, or while another save is in flight.
    pub fn save(&mut self) -> bool {
        if !self.is_resumable() {
            return false;
        }
        let Some(bridge) = &mut self.bridge else {
            return false;
        };
        match self.session.snapshot().to_blob() {
            Ok(blob) => bridge.request_save(blob),
            Err(err) => {
                warn!("could not encode game: {err}");
                false
            }
        }
    }

    fn flush_achievements(&mut self) {
        let achievements = self.session.take_achievements();
        if let Some(bridge) = &mut self.bridge {
            for achievement in achievements {
                bridge.notify_achievement(achievement);
            }
        }
    }

    /// Routes a player action. When the game is over, both `Restart` and
    /// `TogglePause` start a new game; `Restart` is ignored otherwise.
    pub fn handle_action(&mut self, action: Action, now: Instant) {
        let over = self.session.state().is_over();
        match action {
            Action::Restart | Action::TogglePause if over => self.restart(now),
            Action::Restart => {}
            _ if over => {}
            _ => {
                self.session.apply(action, now);
                if action == Action::TogglePause && self.session.state().is_paused() {
                    self.save();
                }
            }
        }
        self.flush_achievements();
    }

    /// The host window lost focus: pause and save.
    pub fn focus_lost(&mut self) {
        self.session.focus_lost();
        self.save();
    }

    pub fn focus_gained(&mut self, now: Instant) {
        self.session.focus_gained(now);
    }

    /// Signs the player in mid-session, lifting the free-play gate.
    pub fn authenticate(&mut self, bridge: PersistenceBridge, now: Instant) {
        info!("signed in as {}", bridge.principal());
        self.bridge = Some(bridge);
        self.last_autosave = Some(now);
        let was_blocked = self.session.state().is_gate_blocked();
        self.session.set_authenticated(true, now);
        if was_blocked && self.pending.is_none() {
            self.request_frame();
        }
    }

    /// Discards the current session and any pending frame, then starts a
    /// fresh game immediately.
    pub fn restart(&mut self, now: Instant) {
        let authenticated = self.session.is_authenticated();
        self.epoch += 1;
        self.pending = None;
        self.session = GameSession::new(self.config.clone());
        self.session.set_authenticated(authenticated, now);
        self.session.start(now);
        self.last_autosave = Some(now);
        self.request_frame();
        info!("game restarted");
    }

    /// Stops the loop. An authenticated game still in play is saved first
    /// and the call waits for the store to finish.
    pub fn shutdown(mut self) {
        let Some(bridge) = self.bridge.take() else {
            return;
        };
        if !self.is_resumable() {
            bridge.close();
            return;
        }
        match self.session.snapshot().to_blob() {
            Ok(blob) => bridge.close_with_save(blob),
            Err(err) => {
                warn!("could not encode game: {err}");
                bridge.close();
            }
        }
    }
}
