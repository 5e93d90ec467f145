use std::iter;

use lcdtris_engine::Action;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Position, Rect},
    text::Line,
    widgets::{Block as BlockWidget, Widget},
};

use crate::ui::widgets::style;

const BUTTON_COUNT: usize = 7;

/// On-screen buttons, clickable with the mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadButton {
    Left,
    Right,
    Down,
    Rotate,
    Drop,
    Hold,
    Start,
}

impl PadButton {
    pub const ALL: [Self; BUTTON_COUNT] = [
        Self::Left,
        Self::Right,
        Self::Down,
        Self::Rotate,
        Self::Drop,
        Self::Hold,
        Self::Start,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "←",
            Self::Right => "→",
            Self::Down => "↓",
            Self::Rotate => "⟳",
            Self::Drop => "DROP",
            Self::Hold => "HOLD",
            Self::Start => "START",
        }
    }

    /// START doubles as pause/resume and, once the game is over, restart.
    pub fn action(self) -> Action {
        match self {
            Self::Left => Action::MoveLeft,
            Self::Right => Action::MoveRight,
            Self::Down => Action::SoftDrop,
            Self::Rotate => Action::Rotate,
            Self::Drop => Action::HardDrop,
            Self::Hold => Action::Hold,
            Self::Start => Action::TogglePause,
        }
    }
}

#[derive(Debug, Default)]
pub struct ControlPad {
    active: bool,
    can_hold: bool,
}

impl ControlPad {
    const BUTTON_WIDTH: u16 = 7;
    const BUTTON_SPACING: u16 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether movement buttons do anything right now. START is always
    /// enabled.
    pub fn active(self, active: bool) -> Self {
        Self { active, ..self }
    }

    pub fn can_hold(self, can_hold: bool) -> Self {
        Self { can_hold, ..self }
    }

    pub fn height() -> u16 {
        3
    }

    fn button_areas(area: Rect) -> [Rect; BUTTON_COUNT] {
        let layout = Layout::horizontal(
            PadButton::ALL.map(|_| Constraint::Length(Self::BUTTON_WIDTH)),
        )
        .flex(Flex::Center)
        .spacing(Self::BUTTON_SPACING);
        area.layout(&layout)
    }

    /// The button under the terminal cell `(column, row)`, if any.
    pub fn hit_test(area: Rect, column: u16, row: u16) -> Option<PadButton> {
        let position = Position::new(column, row);
        iter::zip(PadButton::ALL, Self::button_areas(area))
            .find_map(|(button, button_area)| button_area.contains(position).then_some(button))
    }

    fn is_enabled(&self, button: PadButton) -> bool {
        match button {
            PadButton::Start => true,
            PadButton::Hold => self.active && self.can_hold,
            _ => self.active,
        }
    }
}

impl Widget for ControlPad {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (button, button_area) in iter::zip(PadButton::ALL, Self::button_areas(area)) {
            let style = if self.is_enabled(button) {
                style::BUTTON
            } else {
                style::BUTTON_DISABLED
            };
            let block = BlockWidget::bordered().style(style);
            let inner = block.inner(button_area);
            block.render(button_area, buf);
            Line::styled(button.label(), style)
                .centered()
                .render(inner, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_finds_each_button() {
        let area = Rect::new(0, 30, 80, ControlPad::height());
        let areas = ControlPad::button_areas(area);
        for (button, button_area) in iter::zip(PadButton::ALL, areas) {
            assert_eq!(
                ControlPad::hit_test(area, button_area.x, button_area.y + 1),
                Some(button)
            );
        }
    }

    #[test]
    fn test_hit_test_misses_gaps_and_outside() {
        let area = Rect::new(0, 30, 80, ControlPad::height());
        let areas = ControlPad::button_areas(area);
        let gap = areas[0].right();
        assert_eq!(ControlPad::hit_test(area, gap, 31), None);
        assert_eq!(ControlPad::hit_test(area, areas[0].x, 29), None);
        assert_eq!(ControlPad::hit_test(area, 0, 31), None);
    }

    #[test]
    fn test_buttons_cover_every_action_but_restart() {
        let actions = PadButton::ALL.map(PadButton::action);
        assert!(actions.contains(&Action::TogglePause));
        assert!(!actions.contains(&Action::Restart));
    }
}
