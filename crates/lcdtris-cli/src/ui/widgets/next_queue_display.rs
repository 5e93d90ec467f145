use std::iter;

use lcdtris_engine::PieceKind;
use ratatui::{
    layout::{Constraint, Layout},
    prelude::{Buffer, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::PieceDisplay;

/// Blank rows between two previews.
const GAP: u16 = 1;

/// The NEXT panel: upcoming pieces from the bag, soonest at the top.
///
/// Each preview is a [`PieceDisplay`] slot. While play is suspended the
/// previews are dimmed like a used hold slot.
#[derive(Debug)]
pub struct NextQueueDisplay<'a> {
    queue: Vec<PieceKind>,
    dimmed: bool,
    block: Option<BlockWidget<'a>>,
}

impl<'a> NextQueueDisplay<'a> {
    pub fn new<I>(queue: I) -> Self
    where
        I: IntoIterator<Item = PieceKind>,
    {
        Self {
            queue: queue.into_iter().collect(),
            dimmed: false,
            block: None,
        }
    }

    pub fn dimmed(self, dimmed: bool) -> Self {
        Self { dimmed, ..self }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        PieceDisplay::new().width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        let slots = u16::try_from(self.queue.len()).unwrap_or(u16::MAX);
        PieceDisplay::new()
            .height()
            .saturating_mul(slots)
            .saturating_add(GAP.saturating_mul(slots.saturating_sub(1)))
            .saturating_add(super::block_vertical_margin(self.block.as_ref()))
    }
}

impl Widget for NextQueueDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &NextQueueDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);
        let slot_height = PieceDisplay::new().height();
        let layout = Layout::vertical(self.queue.iter().map(|_| Constraint::Length(slot_height)))
            .spacing(GAP);

        for (slot, &kind) in iter::zip(area.layout_vec(&layout), &self.queue) {
            PieceDisplay::new()
                .piece(kind)
                .dimmed(self.dimmed)
                .render(slot, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::widgets::Block;

    use super::*;

    #[test]
    fn test_size_counts_gaps_and_border() {
        let queue = NextQueueDisplay::new([PieceKind::I, PieceKind::O, PieceKind::T]);
        assert_eq!(queue.height(), 3 * 2 + 2);
        let queue = queue.block(Block::bordered());
        assert_eq!(queue.height(), 3 * 2 + 2 + 2);
        assert_eq!(queue.width(), 4 * 2 + 2);
    }

    #[test]
    fn test_empty_queue_has_no_height() {
        assert_eq!(NextQueueDisplay::new([]).height(), 0);
    }

    #[test]
    fn test_dimmed_previews_lose_piece_colors() {
        let area = Rect::new(0, 0, 8, 2);
        let render = |dimmed| {
            let mut buf = Buffer::empty(area);
            NextQueueDisplay::new([PieceKind::T])
                .dimmed(dimmed)
                .render(area, &mut buf);
            buf
        };
        assert_ne!(render(false), render(true));
    }
}
