use std::iter;

use lcdtris_engine::{ActivePiece, Board};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt, Widget},
};

use crate::ui::widgets::{BlockDisplay, CellKind};

type CellGrid = [[CellKind; Board::WIDTH]; Board::HEIGHT];

#[derive(Debug)]
pub struct BoardDisplay<'a> {
    board: &'a Board,
    ghost: Option<&'a ActivePiece>,
    falling_piece: Option<&'a ActivePiece>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> BoardDisplay<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            ghost: None,
            falling_piece: None,
            block: None,
        }
    }

    pub fn ghost(self, piece: &'a ActivePiece) -> Self {
        Self {
            ghost: Some(piece),
            ..self
        }
    }

    pub fn falling_piece(self, piece: &'a ActivePiece) -> Self {
        Self {
            falling_piece: Some(piece),
            ..self
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        10 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        20 * BlockDisplay::height() + super::block_vertical_margin(self.block.as_ref())
    }

    fn cells(&self) -> CellGrid {
        let mut grid = [[CellKind::Empty; Board::WIDTH]; Board::HEIGHT];
        for (grid_row, row) in iter::zip(&mut grid, self.board.rows()) {
            for (cell, occupied) in iter::zip(grid_row, row) {
                if *occupied {
                    *cell = CellKind::Stack;
                }
            }
        }
        if let Some(ghost) = self.ghost {
            paint(&mut grid, ghost, CellKind::Ghost);
        }
        if let Some(piece) = self.falling_piece {
            paint(&mut grid, piece, CellKind::Piece(piece.kind()));
        }
        grid
    }
}

/// Paints the visible cells of `piece`; rows above the ceiling are skipped.
fn paint(grid: &mut CellGrid, piece: &ActivePiece, kind: CellKind) {
    for (x, y) in piece.cells() {
        if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y))
            && let Some(cell) = grid.get_mut(y).and_then(|row| row.get_mut(x))
        {
            *cell = kind;
        }
    }
}

impl Widget for BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let col_constraints =
            (0..Board::WIDTH).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints =
            (0..Board::HEIGHT).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);

        let grid_cells = area
            .layout::<{ Board::HEIGHT }>(&vertical)
            .into_iter()
            .map(|row| row.layout::<{ Board::WIDTH }>(&horizontal));

        for (grid_row, row) in iter::zip(grid_cells, self.cells()) {
            for (grid_cell, cell) in iter::zip(grid_row, row) {
                BlockDisplay::from_cell(cell, true).render(grid_cell, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lcdtris_engine::PieceKind;

    use super::*;

    #[test]
    fn test_falling_piece_covers_ghost() {
        let board = Board::from_ascii(
            "
            ##########
            ",
        );
        let piece = ActivePiece::at(PieceKind::O, 0, -1);
        let ghost = ActivePiece::at(PieceKind::O, 0, 17);
        let grid = BoardDisplay::new(&board)
            .ghost(&ghost)
            .falling_piece(&piece)
            .cells();

        // The row above the ceiling is dropped; the lower row is visible.
        assert_eq!(grid[0][0], CellKind::Piece(PieceKind::O));
        assert_eq!(grid[0][1], CellKind::Piece(PieceKind::O));
        assert_eq!(grid[1][0], CellKind::Empty);
        assert_eq!(grid[17][0], CellKind::Ghost);
        assert_eq!(grid[18][1], CellKind::Ghost);
        assert_eq!(grid[19][9], CellKind::Stack);
    }
}
