use crossterm::event::{Event, KeyCode, MouseButton, MouseEventKind};
use lcdtris_engine::Action;

/// A terminal event, reduced to what the play screen reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Input {
    Game(Action),
    Quit,
    FocusLost,
    FocusGained,
    /// Left button pressed at a terminal cell.
    Click { column: u16, row: u16 },
}

pub(super) fn translate(event: &Event) -> Option<Input> {
    match event {
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Input::Click {
                column: mouse.column,
                row: mouse.row,
            }),
            _ => None,
        },
        Event::FocusLost => Some(Input::FocusLost),
        Event::FocusGained => Some(Input::FocusGained),
        _ => {
            let key = event.as_key_press_event()?;
            let input = match key.code {
                KeyCode::Left => Input::Game(Action::MoveLeft),
                KeyCode::Right => Input::Game(Action::MoveRight),
                KeyCode::Down => Input::Game(Action::SoftDrop),
                KeyCode::Up | KeyCode::Char('x') => Input::Game(Action::Rotate),
                KeyCode::Char(' ') => Input::Game(Action::HardDrop),
                KeyCode::Char('c') => Input::Game(Action::Hold),
                KeyCode::Enter => Input::Game(Action::TogglePause),
                KeyCode::Char('r') => Input::Game(Action::Restart),
                KeyCode::Char('q') | KeyCode::Esc => Input::Quit,
                _ => return None,
            };
            Some(input)
        }
    }
}

/// Key presses while the player types a name to sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TextInput {
    Push(char),
    Pop,
    Submit,
    Cancel,
}

pub(super) fn translate_text(event: &Event) -> Option<TextInput> {
    let key = event.as_key_press_event()?;
    match key.code {
        KeyCode::Char(c) if is_name_char(c) => Some(TextInput::Push(c)),
        KeyCode::Backspace => Some(TextInput::Pop),
        KeyCode::Enter => Some(TextInput::Submit),
        KeyCode::Esc => Some(TextInput::Cancel),
        _ => None,
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '@')
}
