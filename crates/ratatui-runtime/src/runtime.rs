use std::{
    io::{self, Write as _},
    time::{Duration, Instant},
};

use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
};
use log::warn;
use ratatui::DefaultTerminal;

use crate::{
    App,
    event::TuiEvent,
    event_loop::{EventLoop, RenderMode},
};

/// Runs an [`App`] in the terminal.
///
/// Besides the usual raw mode and alternate screen, the runtime turns on
/// focus-change reporting and mouse capture, so the app receives
/// `Event::FocusLost` / `Event::FocusGained` and mouse clicks.
#[derive(Debug)]
pub struct Runtime {
    events: EventLoop,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: EventLoop::new(Instant::now()),
        }
    }

    /// Sets the tick rate in Hz. `None` disables ticks.
    pub fn set_tick_rate(&mut self, rate: Option<f64>) {
        self.set_tick_interval(rate.map(|rate| Duration::from_secs_f64(1.0 / rate)));
    }

    pub fn set_tick_interval(&mut self, interval: Option<Duration>) {
        self.events.set_tick_interval(interval);
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.events.set_render_mode(mode);
    }

    /// Cancels the pending tick. The next tick fires one full interval
    /// from now.
    pub fn reset_tick(&mut self) {
        self.events.reset_tick(Instant::now());
    }

    /// Runs `app` until [`App::should_exit`] returns `true`.
    ///
    /// Ticks call [`App::update`], renders call [`App::draw`] and terminal
    /// events go to [`App::handle_event`].
    pub fn run<A>(mut self, app: &mut A) -> io::Result<()>
    where
        A: App,
    {
        app.init(&mut self);

        ratatui::run(|terminal| {
            execute!(io::stdout(), EnableFocusChange, EnableMouseCapture)?;
            let result = self.drive(app, terminal);
            let mut stdout = io::stdout();
            if let Err(err) = execute!(stdout, DisableMouseCapture, DisableFocusChange)
                .and_then(|()| stdout.flush())
            {
                warn!("failed to restore terminal modes: {err}");
            }
            result
        })
    }

    fn drive<A>(&mut self, app: &mut A, terminal: &mut DefaultTerminal) -> io::Result<()>
    where
        A: App,
    {
        while !app.should_exit() {
            match self.events.next()? {
                TuiEvent::Tick => app.update(self),
                TuiEvent::Render => {
                    terminal.draw(|frame| app.draw(frame))?;
                }
                TuiEvent::Terminal(event) => app.handle_event(self, event),
            }
        }
        Ok(())
    }
}
