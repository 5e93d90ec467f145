//! Minimal host runtime for ratatui applications: a tick/render event loop
//! plus terminal setup for focus and mouse reporting.

pub use self::{app::App, event_loop::RenderMode, runtime::Runtime};

mod app;
mod event;
mod event_loop;
mod runtime;
