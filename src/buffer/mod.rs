// src/buffer/mod.rs

//! The terminal grid: cells, scrollback, cursor, selection and the dirty flag.
//!
//! The input path mutates a `Buffer` through `SharedBuffer::with_mut`; the render
//! loop reads it through `SharedBuffer::take_view_if_dirty`, which snapshots the
//! visible rows and clears the dirty flag under the same lock.
//!
//! Images: a decoded raster covers a rectangular block of cells anchored at the
//! cell the Sixel sequence terminated on, sized from the current cell metrics
//! and clipped to the grid. Image slices are dropped when their cell is
//! written or erased, when their row scrolls into history, and on resize.

pub mod selection;
mod shared;
pub mod view;

pub use selection::{Point, Selection, SelectionMode};
pub use shared::SharedBuffer;
pub use view::{CursorState, GridView, Line};

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, trace};
use thiserror::Error;

use crate::cell::{Attributes, Cell, RasterSlice, EMPTY_RUNE};
use crate::config::ColorScheme;
use crate::sixel::Raster;

/// Default tab interval.
pub const DEFAULT_TAB_INTERVAL: usize = 8;

/// Errors from operations that address the grid directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// No cell backs the requested position: the caller and the grid disagree
    /// about its dimensions.
    #[error("no cell at column {x}, row {y}")]
    MissingCell { x: usize, y: usize },
}

/// Pixel size of one cell, as measured by the display driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CellSize {
    fn default() -> Self {
        CellSize {
            width: 1.0,
            height: 1.0,
        }
    }
}

#[derive(Debug)]
pub struct Buffer {
    cols: usize,
    rows: usize,
    /// Scrollback history followed by the `rows` screen lines.
    lines: VecDeque<Line>,
    scrollback_limit: usize,
    /// Cursor column; may equal `cols` when a wrap is pending.
    cursor_x: usize,
    /// Cursor row, relative to the top of the screen.
    cursor_y: usize,
    cursor_visible: bool,
    attr: Attributes,
    colors: ColorScheme,
    selection: Selection,
    /// How many lines the viewport is scrolled back from the live screen.
    view_offset: usize,
    cell_size: CellSize,
    dirty: bool,
}

impl Buffer {
    pub fn new(cols: usize, rows: usize, scrollback_limit: usize, colors: ColorScheme) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let attr = Attributes::new(colors.foreground, colors.background);
        let mut buffer = Buffer {
            cols,
            rows,
            lines: VecDeque::with_capacity(rows),
            scrollback_limit,
            cursor_x: 0,
            cursor_y: 0,
            cursor_visible: true,
            attr,
            colors,
            selection: Selection::new(),
            view_offset: 0,
            cell_size: CellSize::default(),
            dirty: true,
        };
        for _ in 0..rows {
            let line = buffer.blank_line();
            buffer.lines.push_back(line);
        }
        buffer
    }

    // --- Accessors ---

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cursor position `(column, screen row)`.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_x, self.cursor_y)
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn history_len(&self) -> usize {
        self.lines.len() - self.rows
    }

    pub fn scroll_offset(&self) -> usize {
        self.history_len() - self.view_offset
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    pub fn colors(&self) -> ColorScheme {
        self.colors
    }

    /// The cell at `(x, y)` in screen coordinates.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        let history = self.history_len();
        self.lines.get(history + y).and_then(|line| line.cells().get(x))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    // --- Text ---

    /// Writes `c` at the cursor with the current attributes and advances.
    pub fn write(&mut self, c: char) {
        self.wrap_if_pending();
        let (x, y, attr) = (self.cursor_x, self.cursor_y, self.attr);
        self.screen_line_mut(y).cells_mut()[x].write(c, attr);
        self.cursor_x += 1;
        self.dirty = true;
    }

    /// Moves a cursor parked past the last column to the start of the next row.
    fn wrap_if_pending(&mut self) {
        if self.cursor_x >= self.cols {
            self.cursor_x = 0;
            self.line_feed();
        }
    }

    pub fn carriage_return(&mut self) {
        self.cursor_x = 0;
        self.dirty = true;
    }

    /// Moves down one row, scrolling the screen into history at the bottom.
    pub fn line_feed(&mut self) {
        if self.cursor_y + 1 < self.rows {
            self.cursor_y += 1;
        } else {
            self.scroll_up_one();
        }
        self.dirty = true;
    }

    pub fn backspace(&mut self) {
        self.cursor_x = self.cursor_x.min(self.cols - 1).saturating_sub(1);
        self.dirty = true;
    }

    pub fn tab(&mut self) {
        let next = (self.cursor_x / DEFAULT_TAB_INTERVAL + 1) * DEFAULT_TAB_INTERVAL;
        self.cursor_x = next.min(self.cols - 1);
        self.dirty = true;
    }

    pub fn set_attributes(&mut self, attr: Attributes) {
        self.attr = attr;
    }

    pub fn attributes(&self) -> Attributes {
        self.attr
    }

    pub fn set_cursor(&mut self, x: usize, y: usize) {
        self.cursor_x = x.min(self.cols - 1);
        self.cursor_y = y.min(self.rows - 1);
        self.dirty = true;
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        if self.cursor_visible != visible {
            self.cursor_visible = visible;
            self.dirty = true;
        }
    }

    /// Clears every screen cell and homes the cursor.
    pub fn erase_all(&mut self) {
        let history = self.history_len();
        for line in self.lines.iter_mut().skip(history) {
            line.cells_mut().iter_mut().for_each(Cell::erase);
        }
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.dirty = true;
    }

    // --- Selection and viewport ---

    pub fn start_selection(&mut self, point: Point, mode: SelectionMode) {
        self.selection.start_selection(point, mode);
        self.dirty = true;
    }

    pub fn update_selection(&mut self, point: Point) {
        self.selection.update_selection(point);
        self.dirty = true;
    }

    pub fn end_selection(&mut self) {
        self.selection.end_selection();
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear_selection();
            self.dirty = true;
        }
    }

    pub fn in_selection(&self, x: usize, y: usize) -> bool {
        self.selection.contains(x, y)
    }

    /// Scrolls the viewport `n` lines back into history.
    pub fn scroll_view_up(&mut self, n: usize) {
        let offset = (self.view_offset + n).min(self.history_len());
        if offset != self.view_offset {
            self.view_offset = offset;
            self.dirty = true;
        }
    }

    /// Scrolls the viewport `n` lines towards the live screen.
    pub fn scroll_view_down(&mut self, n: usize) {
        let offset = self.view_offset.saturating_sub(n);
        if offset != self.view_offset {
            self.view_offset = offset;
            self.dirty = true;
        }
    }

    // --- Geometry ---

    /// Sets the pixel size used to lay images out over cells. Images already
    /// attached were laid out for the old size and are dropped.
    pub fn set_cell_size(&mut self, cell_size: CellSize) {
        if cell_size == self.cell_size {
            return;
        }
        self.lines.iter_mut().for_each(Line::clear_rasters);
        self.cell_size = cell_size;
        self.dirty = true;
    }

    /// Changes the screen to `cols` x `rows`. Images and the selection are dropped.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if (cols, rows) == (self.cols, self.rows) {
            return;
        }
        debug!(
            "Buffer: resizing {}x{} -> {}x{}",
            self.cols, self.rows, cols, rows
        );

        let blank = self.blank_cell();
        for line in self.lines.iter_mut() {
            line.clear_rasters();
            if line.cells().len() != cols {
                line.cells_mut().resize(cols, blank.clone());
            }
        }
        self.cols = cols;

        // Shrinking: drop empty rows below the cursor first, then push rows
        // above it into history.
        while self.rows > rows {
            if self.cursor_y + 1 < self.rows {
                self.lines.pop_back();
            } else {
                self.cursor_y -= 1;
            }
            self.rows -= 1;
        }
        while self.rows < rows {
            let line = self.blank_line();
            self.lines.push_back(line);
            self.rows += 1;
        }
        self.trim_history();

        self.cursor_x = self.cursor_x.min(cols - 1);
        self.cursor_y = self.cursor_y.min(rows - 1);
        self.view_offset = 0;
        self.selection.clear_selection();
        self.dirty = true;
    }

    // --- Images ---

    /// Attaches `raster` to the block of cells anchored at screen cell `(x, y)`.
    ///
    /// Fails with `MissingCell` if no cell backs the anchor. Covered cells past
    /// the right or bottom edge are clipped. An empty raster attaches nothing.
    pub fn attach_raster(&mut self, x: usize, y: usize, raster: Raster) -> Result<(), GridError> {
        if x >= self.cols || y >= self.rows {
            return Err(GridError::MissingCell { x, y });
        }
        if raster.is_empty() {
            trace!("Buffer: ignoring empty raster at ({}, {})", x, y);
            return Ok(());
        }

        let span_cols = cells_spanned(raster.width(), self.cell_size.width);
        let span_rows = cells_spanned(raster.height(), self.cell_size.height);
        let last_col = (x + span_cols).min(self.cols);
        let last_row = (y + span_rows).min(self.rows);
        debug!(
            "Buffer: attaching {}x{} raster at ({}, {}) covering {}x{} cells",
            raster.width(),
            raster.height(),
            x,
            y,
            last_col - x,
            last_row - y
        );

        let raster = Arc::new(raster);
        for row in y..last_row {
            let cells = self.screen_line_mut(row).cells_mut();
            for col in x..last_col {
                cells[col].set_raster(RasterSlice {
                    raster: Arc::clone(&raster),
                    col_offset: col - x,
                    row_offset: row - y,
                });
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Places an image where the cursor is: the anchor cell is written with a
    /// space (advancing the cursor), then the raster is attached to it.
    ///
    /// A pending wrap is taken first, so the image starts the next row.
    pub fn attach_raster_at_cursor(&mut self, raster: Raster) -> Result<(), GridError> {
        self.wrap_if_pending();
        let (x, y) = (self.cursor_x, self.cursor_y);
        self.write(' ');
        self.attach_raster(x, y, raster)
    }

    // --- Snapshot ---

    /// Builds the compositor's view of the current viewport.
    pub fn view(&self) -> GridView {
        let top = self.scroll_offset();
        GridView {
            visible_lines: self.lines.iter().skip(top).take(self.rows).cloned().collect(),
            view_width: self.cols,
            view_height: self.rows,
            cursor: CursorState {
                x: self.cursor_x,
                y: self.history_len() + self.cursor_y,
                visible: self.cursor_visible,
            },
            scroll_offset: top,
            selection: self.selection.clone(),
            colors: self.colors,
        }
    }

    // --- Internals ---

    fn blank_cell(&self) -> Cell {
        Cell::new(EMPTY_RUNE, Attributes::new(self.colors.foreground, self.colors.background))
    }

    fn blank_line(&self) -> Line {
        Line::new(vec![self.blank_cell(); self.cols])
    }

    fn screen_line_mut(&mut self, y: usize) -> &mut Line {
        let index = self.history_len() + y;
        &mut self.lines[index]
    }

    fn scroll_up_one(&mut self) {
        let history = self.history_len();
        // The top screen row leaves the screen; its images go with it.
        self.lines[history].clear_rasters();
        let line = self.blank_line();
        self.lines.push_back(line);
        if self.view_offset > 0 {
            self.view_offset += 1;
        }
        self.trim_history();
    }

    fn trim_history(&mut self) {
        while self.history_len() > self.scrollback_limit {
            self.lines.pop_front();
        }
        self.view_offset = self.view_offset.min(self.history_len());
    }
}

/// Number of cells needed to cover `pixels`, at least one.
fn cells_spanned(pixels: usize, cell_px: f64) -> usize {
    if cell_px <= 0.0 {
        return 1;
    }
    ((pixels as f64 / cell_px).ceil() as usize).max(1)
}
