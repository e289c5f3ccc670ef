// src/buffer/view.rs

//! The read-only snapshot of the visible grid handed to the compositor.

use std::ops::Index;
use std::sync::Arc;

use super::selection::Selection;
use crate::cell::Cell;
use crate::config::ColorScheme;

/// One row of the grid.
///
/// Cells sit behind an `Arc` for copy-on-write: cloning a line into a snapshot
/// only bumps the reference count, and the buffer calls `Arc::make_mut` when
/// it next writes to the row.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    cells: Arc<Vec<Cell>>,
}

impl Line {
    pub fn new(cells: Vec<Cell>) -> Self {
        Line {
            cells: Arc::new(cells),
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<Cell> {
        Arc::make_mut(&mut self.cells)
    }

    /// Drops every image slice on this row. No-op (and no copy) if there are none.
    pub(crate) fn clear_rasters(&mut self) {
        if self.cells.iter().any(|c| c.raster().is_some()) {
            self.cells_mut().iter_mut().for_each(Cell::clear_raster);
        }
    }
}

impl Index<usize> for Line {
    type Output = Cell;

    fn index(&self, column_index: usize) -> &Self::Output {
        &self.cells[column_index]
    }
}

/// Cursor position and visibility.
///
/// `y` is an absolute line index (scrollback included); visible row `r` shows
/// absolute line `r + scroll_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub x: usize,
    pub y: usize,
    pub visible: bool,
}

/// A consistent snapshot of everything the compositor reads.
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    /// Rows of the viewport, scroll offset already applied.
    pub visible_lines: Vec<Line>,
    pub view_width: usize,
    pub view_height: usize,
    pub cursor: CursorState,
    /// Absolute line index of the first visible row.
    pub scroll_offset: usize,
    pub selection: Selection,
    pub colors: ColorScheme,
}

impl GridView {
    /// The cell at visible position `(x, y)`, if the row stores one.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.visible_lines.get(y).and_then(|line| line.cells().get(x))
    }

    pub fn in_selection(&self, x: usize, y: usize) -> bool {
        self.selection.contains(x, y)
    }

    /// True if a visible cursor sits on visible cell `(x, y)`.
    pub fn is_cursor_at(&self, x: usize, y: usize) -> bool {
        self.cursor.visible && self.cursor.x == x && self.cursor.y == y + self.scroll_offset
    }
}
