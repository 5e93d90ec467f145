use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event;

use crate::event::TuiEvent;

/// When the runtime redraws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Redraw after every tick or terminal event.
    #[default]
    OnDirty,
    /// Redraw after a tick or terminal event, at most once per interval.
    /// Changes arriving faster than that share one redraw.
    Throttled(Duration),
}

impl RenderMode {
    /// `Throttled` with the interval of `rate` frames per second.
    #[must_use]
    pub fn throttled_from_rate(rate: f64) -> Self {
        Self::Throttled(Duration::from_secs_f64(1.0 / rate))
    }
}

/// Decides which event comes next: a tick, a render, or whatever the
/// terminal reports in between.
#[derive(Debug)]
pub(super) struct EventLoop {
    tick_interval: Option<Duration>,
    render_mode: RenderMode,
    last_tick: Instant,
    last_render: Instant,
    dirty: bool,
}

impl EventLoop {
    pub(super) fn new(now: Instant) -> Self {
        // Back-date both clocks so the first tick and render fire at once.
        let long_ago = now.checked_sub(Duration::from_secs(3600)).unwrap_or(now);
        Self {
            tick_interval: None,
            render_mode: RenderMode::default(),
            last_tick: long_ago,
            last_render: long_ago,
            dirty: true,
        }
    }

    pub(super) fn set_tick_interval(&mut self, interval: Option<Duration>) {
        self.tick_interval = interval;
    }

    pub(super) fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.render_mode = render_mode;
    }

    /// Drops the pending tick; the next one fires a full interval after
    /// `now`.
    pub(super) fn reset_tick(&mut self, now: Instant) {
        self.last_tick = now;
    }

    /// Blocks until the next tick, render or terminal event.
    pub(super) fn next(&mut self) -> io::Result<TuiEvent> {
        loop {
            let now = Instant::now();
            if let Some(due) = self.due(now) {
                return Ok(due);
            }
            if let Some(timeout) = self.timeout(now)
                && !event::poll(timeout)?
            {
                continue;
            }
            self.dirty = true;
            return Ok(event::read()?.into());
        }
    }

    /// Returns the tick or render due at `now`, updating the clocks.
    fn due(&mut self, now: Instant) -> Option<TuiEvent> {
        if let Some(interval) = self.tick_interval
            && now.saturating_duration_since(self.last_tick) >= interval
        {
            self.last_tick = now;
            self.dirty = true;
            return Some(TuiEvent::Tick);
        }

        let render = self.dirty
            && match self.render_mode {
                RenderMode::OnDirty => true,
                RenderMode::Throttled(interval) => {
                    now.saturating_duration_since(self.last_render) >= interval
                }
            };
        if render {
            self.last_render = now;
            self.dirty = false;
            return Some(TuiEvent::Render);
        }
        None
    }

    /// How long the terminal may be polled before a tick or render is due.
    /// `None` waits indefinitely.
    fn timeout(&self, now: Instant) -> Option<Duration> {
        let tick_at = self
            .tick_interval
            .map(|interval| self.last_tick + interval);
        let render_at = self.dirty.then(|| match self.render_mode {
            RenderMode::OnDirty => now,
            RenderMode::Throttled(interval) => self.last_render + interval,
        });
        let wake_at = tick_at.into_iter().chain(render_at).min()?;
        Some(wake_at.saturating_duration_since(now))
    }
}
