use lcdtris_engine::{RenderView, SessionState};
use ratatui::{
    layout::{Constraint, Flex, Layout},
    prelude::{Buffer, Rect},
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Padding, Widget},
};

use crate::ui::widgets::{BoardDisplay, NextQueueDisplay, PieceDisplay, StatsDisplay, color, style};

/// Name entry shown over the board while free play is blocked.
#[derive(Debug, Clone, Copy)]
pub struct SignInPrompt<'a> {
    pub name: &'a str,
    pub notice: Option<&'a str>,
}

/// HOLD and STATS on the left, the board in the middle, NEXT on the right,
/// plus the overlay for the current state.
#[derive(Debug)]
pub struct GameDisplay<'a> {
    view: &'a RenderView<'a>,
    sign_in: Option<SignInPrompt<'a>>,
    horizontal_padding: u16,
    vertical_padding: u16,
}

impl<'a> GameDisplay<'a> {
    pub fn new(view: &'a RenderView<'a>) -> Self {
        Self {
            view,
            sign_in: None,
            horizontal_padding: 1,
            vertical_padding: 0,
        }
    }

    pub fn sign_in(self, prompt: SignInPrompt<'a>) -> Self {
        Self {
            sign_in: Some(prompt),
            ..self
        }
    }

    fn popup(&self) -> Option<(Text<'a>, Style)> {
        let lcd = Style::new().fg(color::BLACK).bg(color::LCD_GREEN);
        let text = match self.view.state {
            SessionState::Running => return None,
            SessionState::Loading => (Text::from("LOADING..."), lcd),
            SessionState::Paused => (
                Text::from("PAUSED"),
                Style::new().fg(color::BLACK).bg(color::YELLOW),
            ),
            SessionState::Over => (
                Text::from(vec![
                    Line::from("GAME OVER!!"),
                    Line::from("START to play again"),
                ]),
                Style::new().fg(color::WHITE).bg(color::RED),
            ),
            SessionState::GateBlocked => {
                let mut lines = vec![
                    Line::from("FREE PLAY IS OVER"),
                    Line::from("Sign in to keep playing"),
                ];
                if let Some(prompt) = self.sign_in {
                    lines.push(Line::from(format!("Name: {}_", prompt.name)));
                    if let Some(notice) = prompt.notice {
                        lines.push(Line::styled(notice.to_owned(), Style::new().fg(Color::Red)));
                    }
                }
                (Text::from(lines), lcd)
            }
        };
        Some(text)
    }
}

impl Widget for GameDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &GameDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let view = self.view;
        let block_padding = Padding::symmetric(self.horizontal_padding, self.vertical_padding);
        let border_style = match view.state {
            SessionState::Loading => color::GRAY,
            SessionState::Running => color::WHITE,
            SessionState::Paused => color::YELLOW,
            SessionState::GateBlocked => color::LCD_GREEN,
            SessionState::Over => color::RED,
        };
        let panel = |title: &'static str| {
            Block::bordered()
                .title(Line::from(title).centered())
                .padding(block_padding)
                .border_style(border_style)
                .style(style::DEFAULT)
        };

        let game_board = BoardDisplay::new(view.board)
            .ghost(&view.drop_preview)
            .falling_piece(view.falling_piece)
            .block(
                Block::bordered()
                    .border_style(border_style)
                    .style(style::DEFAULT),
            );
        let hold_panel = {
            let panel = PieceDisplay::new()
                .dimmed(!view.can_hold)
                .block(panel("HOLD"));
            if let Some(piece) = view.held_piece {
                panel.piece(piece)
            } else {
                panel
            }
        };
        let next_queue = NextQueueDisplay::new(view.next_pieces.iter().copied())
            .dimmed(!view.state.is_running())
            .block(panel("NEXT"));
        let stats = StatsDisplay::new(view).block(panel("STATS"));

        let [left_column, center_column, right_column] = Layout::horizontal([
            Constraint::Length(u16::max(hold_panel.width(), stats.width())),
            Constraint::Length(game_board.width()),
            Constraint::Length(next_queue.width()),
        ])
        .flex(Flex::Center)
        .spacing(1)
        .areas(area);

        let [hold_area, stats_area] = Layout::vertical([
            Constraint::Length(hold_panel.height()),
            Constraint::Length(stats.height()),
        ])
        .spacing(1)
        .areas(left_column);
        let hold_area = hold_area.layout::<1>(
            &Layout::horizontal([Constraint::Length(hold_panel.width())]).flex(Flex::End),
        )[0];
        let stats_area = stats_area.layout::<1>(
            &Layout::horizontal([Constraint::Length(stats.width())]).flex(Flex::End),
        )[0];

        let [board_area] =
            Layout::vertical([Constraint::Length(game_board.height())]).areas(center_column);
        let [next_queue_area] =
            Layout::vertical([Constraint::Length(next_queue.height())]).areas(right_column);

        let game_board_width = game_board.width();
        hold_panel.render(hold_area, buf);
        stats.render(stats_area, buf);
        game_board.render(board_area, buf);
        next_queue.render(next_queue_area, buf);

        if let Some((text, style)) = self.popup() {
            let text_height = u16::try_from(text.height()).unwrap_or(u16::MAX);
            let block = Block::new().style(style);
            let area = board_area.centered(
                Constraint::Length(game_board_width),
                Constraint::Length(text_height.saturating_add(2)),
            );
            let inner = block.inner(area);
            Clear.render(area, buf);
            block.render(area, buf);
            text.style(style)
                .centered()
                .render(inner.centered_vertically(Constraint::Length(text_height)), buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use lcdtris_engine::{GameSession, SessionConfig};

    use super::*;

    fn rendered_text(buf: &Buffer) -> String {
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_loading_overlay() {
        let session = GameSession::new(SessionConfig::default());
        let view = session.view(Instant::now());
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        GameDisplay::new(&view).render(area, &mut buf);

        let text = rendered_text(&buf);
        assert!(text.contains("LOADING..."));
        assert!(text.contains("HOLD"));
        assert!(text.contains("NEXT"));
        assert!(text.contains("SCORE:"));
    }

    #[test]
    fn test_running_has_no_overlay() {
        let mut session = GameSession::new(SessionConfig::default());
        let now = Instant::now();
        session.start(now);
        let view = session.view(now);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        GameDisplay::new(&view).render(area, &mut buf);

        let text = rendered_text(&buf);
        assert!(!text.contains("LOADING"));
        assert!(!text.contains("PAUSED"));
        assert!(text.contains("5:00"));
    }
}
