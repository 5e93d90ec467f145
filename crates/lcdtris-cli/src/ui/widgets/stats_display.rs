use std::{iter, time::Duration};

use lcdtris_engine::RenderView;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::ui::widgets::style;

pub struct StatsDisplay<'a> {
    view: &'a RenderView<'a>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> StatsDisplay<'a> {
    pub fn new(view: &'a RenderView<'a>) -> Self {
        Self { view, block: None }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        20 + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        u16::try_from(ROWS.len()).unwrap_or(u16::MAX)
            + super::block_vertical_margin(self.block.as_ref())
    }
}

type ValueFn = &'static dyn Fn(&RenderView<'_>) -> String;

#[derive(Clone, Copy)]
enum Row {
    Empty,
    FullLabel(&'static str),
    FullValue(ValueFn),
    LabelValue(&'static str, ValueFn),
}

const ROWS: &[Row] = &[
    Row::FullLabel("SCORE:"),
    Row::FullValue(&|view| view.stats.score().to_string()),
    Row::FullLabel("FREE PLAY:"),
    Row::FullValue(&|view| match view.free_play_remaining {
        Some(remaining) => format_clock(remaining),
        None => "SIGNED IN".to_owned(),
    }),
    Row::Empty,
    Row::LabelValue("LEVEL:", &|view| view.stats.level().to_string()),
    Row::LabelValue("LINES:", &|view| view.stats.lines().to_string()),
    Row::Empty,
    Row::LabelValue("PIECES:", &|view| view.stats.completed_pieces().to_string()),
    Row::LabelValue("SINGLES:", &|view| {
        view.stats.line_cleared_counter()[1].to_string()
    }),
    Row::LabelValue("DOUBLES:", &|view| {
        view.stats.line_cleared_counter()[2].to_string()
    }),
    Row::LabelValue("TRIPLES:", &|view| {
        view.stats.line_cleared_counter()[3].to_string()
    }),
    Row::LabelValue("TETRIS:", &|view| {
        view.stats.line_cleared_counter()[4].to_string()
    }),
];

/// `m:ss`, rounded up so the clock reads `0:00` only once time is out.
fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    format!("{}:{:0>2}", secs / 60, secs % 60)
}

impl Widget for StatsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let style = style::DEFAULT;

        let rows_areas =
            Layout::vertical((0..ROWS.len()).map(|_| Constraint::Length(1))).split(area);

        for (row, area) in iter::zip(ROWS.iter().copied(), rows_areas[..].iter().copied()) {
            match row {
                Row::Empty => {}
                Row::FullLabel(label) => {
                    Line::styled(label, style).left_aligned().render(area, buf);
                }
                Row::FullValue(value) => {
                    Line::styled(value(self.view), style)
                        .right_aligned()
                        .render(area, buf);
                }
                Row::LabelValue(label, value) => {
                    let [label_area, value_area] = area.layout(&Layout::horizontal([
                        Constraint::Fill(1),
                        Constraint::Fill(1),
                    ]));
                    Line::styled(label, style)
                        .left_aligned()
                        .render(label_area, buf);
                    Line::styled(value(self.view), style)
                        .right_aligned()
                        .render(value_area, buf);
                }
            }
        }
    }
}
