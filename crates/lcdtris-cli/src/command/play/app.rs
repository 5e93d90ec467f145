use std::{
    cell::Cell,
    path::PathBuf,
    time::{Duration, Instant},
};

use crossterm::event::Event;
use lcdtris_engine::{Action, FrameOutcome, GameLoop, SessionState};
use log::{debug, info, warn};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
};
use ratatui_runtime::{App, RenderMode, Runtime};

use crate::{
    command::play::input::{self, Input, TextInput},
    ui::widgets::{ControlPad, GameDisplay, KeyBinding, KeyBindingDisplay, SignInPrompt},
};

const FPS: f64 = 60.0;
const GAME_HEIGHT: u16 = 22;
const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Default)]
struct SignIn {
    name: String,
    notice: Option<String>,
}

#[derive(Debug)]
pub(super) struct PlayApp {
    game: GameLoop,
    loading_until: Instant,
    save_dir: PathBuf,
    sign_in: SignIn,
    /// Terminal area of the last draw, for mouse hit-testing.
    screen_area: Cell<Rect>,
    is_exiting: bool,
}

impl PlayApp {
    pub(super) fn new(game: GameLoop, loading: Duration, save_dir: PathBuf) -> Self {
        Self {
            game,
            loading_until: Instant::now() + loading,
            save_dir,
            sign_in: SignIn::default(),
            screen_area: Cell::new(Rect::default()),
            is_exiting: false,
        }
    }

    /// Saves an authenticated game and stops the store worker.
    pub(super) fn shutdown(self) {
        info!("leaving with score {}", self.game.session().stats().score());
        self.game.shutdown();
    }

    fn state(&self) -> SessionState {
        self.game.session().state()
    }

    fn apply(&mut self, runtime: &mut Runtime, action: Action, now: Instant) {
        let was_over = self.state().is_over();
        self.game.handle_action(action, now);
        if was_over && !self.state().is_over() {
            // The old game's tick must not run against the new one.
            runtime.reset_tick();
        }
    }

    fn is_signing_in(&self) -> bool {
        self.state().is_gate_blocked()
    }

    fn edit_sign_in(&mut self, input: TextInput, now: Instant) {
        match input {
            TextInput::Push(c) => {
                if self.sign_in.name.chars().count() < MAX_NAME_LEN {
                    self.sign_in.name.push(c);
                }
                self.sign_in.notice = None;
            }
            TextInput::Pop => {
                self.sign_in.name.pop();
            }
            TextInput::Submit => self.submit_sign_in(now),
            TextInput::Cancel => self.is_exiting = true,
        }
    }

    fn submit_sign_in(&mut self, now: Instant) {
        let name = self.sign_in.name.trim().to_owned();
        if name.is_empty() {
            self.sign_in.notice = Some("Enter a name first".to_owned());
            return;
        }
        match super::open_bridge(&self.save_dir, &name) {
            Ok(bridge) => {
                self.game.authenticate(bridge, now);
                self.sign_in = SignIn::default();
            }
            Err(err) => {
                warn!("sign-in as {name} failed: {err:#}");
                self.sign_in.notice = Some("Sign-in failed".to_owned());
            }
        }
    }

    fn click(&mut self, runtime: &mut Runtime, column: u16, row: u16, now: Instant) {
        let [_, pad_area, _] = screen_areas(self.screen_area.get());
        if let Some(button) = ControlPad::hit_test(pad_area, column, row) {
            self.apply(runtime, button.action(), now);
        }
    }
}

fn screen_areas(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(GAME_HEIGHT),
        Constraint::Length(ControlPad::height()),
        Constraint::Length(1),
    ])
    .areas(area)
}

fn help_bindings(state: SessionState) -> &'static [KeyBinding<'static>] {
    match state {
        SessionState::Loading => &[(&["q"], "Quit")],
        SessionState::Running => &[
            (&["←", "→"], "Move"),
            (&["↓"], "Soft Drop"),
            (&["↑", "x"], "Rotate"),
            (&["Space"], "Drop"),
            (&["c"], "Hold"),
            (&["Enter"], "Pause"),
            (&["q"], "Quit"),
        ],
        SessionState::Paused => &[(&["Enter"], "Resume"), (&["q"], "Quit")],
        SessionState::GateBlocked => &[(&["Enter"], "Sign In"), (&["Esc"], "Quit")],
        SessionState::Over => &[(&["Enter", "r"], "Play Again"), (&["q"], "Quit")],
    }
}

impl App for PlayApp {
    fn init(&mut self, runtime: &mut Runtime) {
        runtime.set_tick_rate(Some(FPS));
        runtime.set_render_mode(RenderMode::throttled_from_rate(FPS));
    }

    fn should_exit(&self) -> bool {
        self.is_exiting
    }

    fn handle_event(&mut self, runtime: &mut Runtime, event: Event) {
        let now = Instant::now();
        if self.is_signing_in()
            && let Some(text) = input::translate_text(&event)
        {
            self.edit_sign_in(text, now);
            return;
        }
        match input::translate(&event) {
            Some(Input::Game(action)) => self.apply(runtime, action, now),
            Some(Input::Quit) => self.is_exiting = true,
            Some(Input::FocusLost) => self.game.focus_lost(),
            Some(Input::FocusGained) => self.game.focus_gained(now),
            Some(Input::Click { column, row }) => self.click(runtime, column, row, now),
            None => {}
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        self.screen_area.set(area);
        let [game_area, pad_area, help_area] = screen_areas(area);

        let view = self.game.session().view(Instant::now());
        let mut display = GameDisplay::new(&view);
        if view.state.is_gate_blocked() {
            display = display.sign_in(SignInPrompt {
                name: &self.sign_in.name,
                notice: self.sign_in.notice.as_deref(),
            });
        }
        let pad = ControlPad::new()
            .active(view.state.is_running())
            .can_hold(view.can_hold);

        frame.render_widget(display, game_area);
        frame.render_widget(pad, pad_area);
        frame.render_widget(KeyBindingDisplay::new(help_bindings(view.state)), help_area);
    }

    fn update(&mut self, _runtime: &mut Runtime) {
        let now = Instant::now();
        if self.state().is_loading() && now >= self.loading_until {
            self.game.start(now);
        }
        if let Some(id) = self.game.pending_frame()
            && let FrameOutcome::Halted(outcome) = self.game.run_frame(id, now)
        {
            debug!("frame loop halted in {} after {outcome:?}", self.state());
        }
    }
}
