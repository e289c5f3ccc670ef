// src/compositor/mod.rs

//! This module defines the `Compositor`.
//!
//! The `Compositor` turns a `GridView` snapshot into a flat list of `DrawOp`s
//! for a `Driver`. It holds no grid state of its own and never mutates the
//! snapshot, so the same view always produces the same operations.
//!
//! Each visible cell yields a background `FillRect`, followed by either a
//! `BlitRaster` (when an image covers the cell) or a `DrawText` (when the cell
//! holds a visible character). An image always hides the character beneath it.

use std::sync::Arc;

use log::{error, trace};

use crate::buffer::GridView;
use crate::cell::{AttrFlags, Cell};
use crate::color::Color;
use crate::sixel::{PixelRect, Raster};

/// A drawing primitive in window pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Fills a rectangle with a solid color.
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    },
    /// Draws one glyph with its baseline at `y`.
    DrawText {
        x: f64,
        y: f64,
        glyph: char,
        color: Color,
        /// Styling flags other than `REVERSE`, which is already applied to `color`.
        flags: AttrFlags,
    },
    /// Copies `src` out of `raster` to `(x, y)`. Unset pixels are transparent.
    BlitRaster {
        x: f64,
        y: f64,
        raster: Arc<Raster>,
        src: PixelRect,
    },
}

/// Pixel geometry of one cell, measured once from the reference glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width: f64,
    pub height: f64,
    /// Distance from the top of the cell to the text baseline.
    pub ascent: f64,
}

impl Default for CellMetrics {
    fn default() -> Self {
        CellMetrics {
            width: 1.0,
            height: 1.0,
            ascent: 1.0,
        }
    }
}

/// Translates grid snapshots into draw operations.
#[derive(Debug, Clone)]
pub struct Compositor {
    metrics: CellMetrics,
}

impl Compositor {
    pub fn new(metrics: CellMetrics) -> Self {
        Compositor { metrics }
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Replaces the cell metrics after the font changed.
    pub fn set_metrics(&mut self, metrics: CellMetrics) {
        self.metrics = metrics;
    }

    /// Produces the draw operations for every cell of `view`, row-major.
    pub fn composite(&self, view: &GridView) -> Vec<DrawOp> {
        let mut ops = Vec::with_capacity(view.view_width * view.view_height * 2);
        let default_cell = Cell::background(view.colors.background);

        for y in 0..view.view_height {
            for x in 0..view.view_width {
                let cell = view.cell(x, y).unwrap_or(&default_cell);
                self.composite_cell(view, x, y, cell, &mut ops);
            }
        }

        trace!(
            "Compositor: {} ops for {}x{} view",
            ops.len(),
            view.view_width,
            view.view_height
        );
        ops
    }

    fn composite_cell(
        &self,
        view: &GridView,
        x: usize,
        y: usize,
        cell: &Cell,
        ops: &mut Vec<DrawOp>,
    ) {
        let (fg, mut bg, flags) = effective_colors(cell);

        if view.is_cursor_at(x, y) {
            bg = view.colors.cursor;
        } else if view.in_selection(x, y) {
            bg = view.colors.selection;
        }

        let CellMetrics {
            width,
            height,
            ascent,
        } = self.metrics;
        let px = x as f64 * width;
        let py = (y as f64 * height).floor();

        ops.push(DrawOp::FillRect {
            x: px,
            y: py,
            width,
            height,
            color: bg,
        });

        if let Some(slice) = cell.raster() {
            let wanted = PixelRect {
                x: (slice.col_offset as f64 * width).floor() as usize,
                y: (slice.row_offset as f64 * height).floor() as usize,
                width: width.ceil() as usize,
                height: height.ceil() as usize,
            };
            match slice.raster.clip(wanted) {
                Some(src) => ops.push(DrawOp::BlitRaster {
                    x: px,
                    y: py,
                    raster: Arc::clone(&slice.raster),
                    src,
                }),
                None => error!(
                    "Compositor: image slice {:?} at ({}, {}) lies outside its {}x{} raster; skipping",
                    wanted,
                    x,
                    y,
                    slice.raster.width(),
                    slice.raster.height()
                ),
            }
        } else if cell.has_glyph() {
            ops.push(DrawOp::DrawText {
                x: px,
                y: py + ascent,
                glyph: cell.rune(),
                color: fg,
                flags,
            });
        }
    }
}

/// Applies `REVERSE`: returns `(fg, bg, flags)` with the colors swapped if it
/// is set, and the flag removed.
fn effective_colors(cell: &Cell) -> (Color, Color, AttrFlags) {
    let attr = cell.attr();
    if attr.is_reverse() {
        (attr.bg, attr.fg, attr.flags.difference(AttrFlags::REVERSE))
    } else {
        (attr.fg, attr.bg, attr.flags)
    }
}

#[cfg(test)]
mod tests;
