use crossterm::event::Event;
use ratatui::Frame;

use crate::Runtime;

/// An application driven by [`Runtime::run`].
///
/// The runtime calls [`update`](Self::update) once per tick (the per-frame
/// callback), [`handle_event`](Self::handle_event) for each terminal event
/// and [`draw`](Self::draw) whenever a render is due.
pub trait App {
    /// Called once before the first event. Configure the tick interval and
    /// render mode here.
    fn init(&mut self, runtime: &mut Runtime);

    fn should_exit(&self) -> bool;

    /// Handles key, mouse, focus and resize events.
    fn handle_event(&mut self, runtime: &mut Runtime, event: Event);

    fn draw(&self, frame: &mut Frame);

    /// Per-frame callback.
    fn update(&mut self, runtime: &mut Runtime);
}
