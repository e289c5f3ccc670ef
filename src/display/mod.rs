// src/display/mod.rs

//! Defines the `Driver` trait executed by the render loop, and the glyph
//! metrics a driver reports for its font.
//!
//! A driver receives the compositor's `DrawOp`s in order and issues them
//! against whatever surface it owns; `present` makes the frame visible.

pub mod headless;

pub use headless::{FrameStats, HeadlessDriver};

use anyhow::Result;

use crate::compositor::{CellMetrics, DrawOp};

/// Reference glyph measured to size the character cell.
pub const REFERENCE_GLYPH: char = '\u{2588}'; // FULL BLOCK

/// Extents of a single glyph in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Horizontal advance.
    pub advance: f64,
    /// Height above the baseline.
    pub ascent: f64,
    /// Depth below the baseline.
    pub descent: f64,
}

impl GlyphMetrics {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }

    /// Cell geometry when this glyph is the reference glyph.
    pub fn cell_metrics(&self) -> CellMetrics {
        CellMetrics {
            width: self.advance,
            height: self.height(),
            ascent: self.ascent,
        }
    }
}

/// A display backend the render loop draws into.
pub trait Driver {
    /// Measures `c` in the driver's current font.
    fn measure_glyph(&mut self, c: char) -> Result<GlyphMetrics>;

    /// Executes draw operations in order against the back buffer.
    fn execute(&mut self, ops: &[DrawOp]) -> Result<()>;

    /// Makes everything executed since the last present visible.
    fn present(&mut self) -> Result<()>;
}
