use crossterm::event::Event;

#[derive(Debug, Clone, derive_more::IsVariant, derive_more::From)]
pub(super) enum TuiEvent {
    /// A tick interval elapsed.
    Tick,
    /// A render is due.
    Render,
    Terminal(Event),
}
