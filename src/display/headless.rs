// src/display/headless.rs

//! Headless display driver: draws nothing, records what it was asked to draw.

use anyhow::Result;
use log::{info, trace};

use super::{Driver, GlyphMetrics};
use crate::compositor::DrawOp;
use crate::config::FontConfig;

/// Totals over every frame presented so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frames_presented: usize,
    pub fills: usize,
    pub glyphs: usize,
    pub blits: usize,
    /// Painted raster pixels copied by all blits.
    pub opaque_pixels: usize,
}

#[derive(Debug)]
pub struct HeadlessDriver {
    font: FontConfig,
    pending: Vec<DrawOp>,
    last_frame: Vec<DrawOp>,
    stats: FrameStats,
}

impl HeadlessDriver {
    pub fn new(font: FontConfig) -> Self {
        info!(
            "HeadlessDriver::new() advance {} ascent {} descent {}",
            font.cell_width_px, font.ascent_px, font.descent_px
        );
        HeadlessDriver {
            font,
            pending: Vec::new(),
            last_frame: Vec::new(),
            stats: FrameStats::default(),
        }
    }

    /// Replaces the font, as a user changing font size would.
    pub fn set_font(&mut self, font: FontConfig) {
        self.font = font;
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Operations of the most recently presented frame.
    pub fn last_frame(&self) -> &[DrawOp] {
        &self.last_frame
    }

    /// Characters drawn in the last frame, in draw order.
    pub fn last_frame_glyphs(&self) -> String {
        self.last_frame
            .iter()
            .filter_map(|op| match op {
                DrawOp::DrawText { glyph, .. } => Some(*glyph),
                _ => None,
            })
            .collect()
    }
}

impl Driver for HeadlessDriver {
    fn measure_glyph(&mut self, _c: char) -> Result<GlyphMetrics> {
        // Monospace: every glyph has the configured extents.
        Ok(GlyphMetrics {
            advance: self.font.cell_width_px,
            ascent: self.font.ascent_px,
            descent: self.font.descent_px,
        })
    }

    fn execute(&mut self, ops: &[DrawOp]) -> Result<()> {
        for op in ops {
            match op {
                DrawOp::FillRect { .. } => self.stats.fills += 1,
                DrawOp::DrawText { .. } => self.stats.glyphs += 1,
                DrawOp::BlitRaster { raster, src, .. } => {
                    self.stats.blits += 1;
                    self.stats.opaque_pixels += raster
                        .painted_pixels()
                        .filter(|(x, y, _)| {
                            (src.x..src.x + src.width).contains(x)
                                && (src.y..src.y + src.height).contains(y)
                        })
                        .count();
                }
            }
        }
        self.pending.extend_from_slice(ops);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.last_frame = std::mem::take(&mut self.pending);
        self.stats.frames_presented += 1;
        trace!(
            "HeadlessDriver: Present frame {} ({} ops)",
            self.stats.frames_presented,
            self.last_frame.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::color::Color;
    use crate::sixel::{decode, PixelRect};

    #[test]
    fn metrics_come_from_font_config() {
        let mut driver = HeadlessDriver::new(FontConfig::default());
        let metrics = driver.measure_glyph('x').unwrap();
        assert_eq!(metrics.advance, 8.0);
        assert_eq!(metrics.height(), 16.0);
        assert_eq!(metrics.cell_metrics().ascent, 13.0);
    }

    #[test]
    fn present_moves_pending_ops_into_last_frame() {
        let mut driver = HeadlessDriver::new(FontConfig::default());
        let fill = DrawOp::FillRect {
            x: 0.0,
            y: 0.0,
            width: 8.0,
            height: 16.0,
            color: Color::BLACK,
        };
        driver.execute(&[fill.clone()]).unwrap();
        assert!(driver.last_frame().is_empty());
        driver.present().unwrap();
        assert_eq!(driver.last_frame(), &[fill]);
        driver.present().unwrap();
        assert!(driver.last_frame().is_empty());
        assert_eq!(driver.stats().frames_presented, 2);
    }

    #[test]
    fn blits_count_only_pixels_inside_source_rect() {
        let mut driver = HeadlessDriver::new(FontConfig::default());
        // Four columns, all six bits set: 24 painted pixels.
        let raster = Arc::new(decode("q~~~~").unwrap());
        driver
            .execute(&[DrawOp::BlitRaster {
                x: 0.0,
                y: 0.0,
                raster,
                src: PixelRect {
                    x: 1,
                    y: 0,
                    width: 2,
                    height: 3,
                },
            }])
            .unwrap();
        assert_eq!(driver.stats().blits, 1);
        assert_eq!(driver.stats().opaque_pixels, 6);
    }
}
