// src/sixel/raster.rs

//! The decoded image produced by the Sixel decoder.
//!
//! A `Raster` keeps the band structure of the wire format: a sequence of rows,
//! each exactly six scanlines tall, each row a sequence of six-pixel columns.
//! Pixels are `None` when nothing was painted there, which drivers render as
//! transparent (the cell background shows through).

use crate::color::Rgb;

/// Number of scanlines encoded by one sixel character.
pub const SIXEL_HEIGHT: usize = 6;

/// One sixel column: six vertically stacked pixels, top first.
pub type SixelColumn = [Option<Rgb>; SIXEL_HEIGHT];

const EMPTY_COLUMN: SixelColumn = [None; SIXEL_HEIGHT];

/// A rectangle in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// A decoded Sixel image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Raster {
    rows: Vec<Vec<SixelColumn>>,
    width: usize,
}

impl Raster {
    /// Width in pixels: the highest column index touched plus one.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels: always a multiple of six.
    pub fn height(&self) -> usize {
        self.rows.len() * SIXEL_HEIGHT
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows.is_empty()
    }

    /// The six-pixel bands making up the image, top to bottom.
    /// Every band holds exactly `width()` columns.
    pub fn rows(&self) -> &[Vec<SixelColumn>] {
        &self.rows
    }

    /// Returns the pixel at `(x, y)`, or `None` if it is unset or out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        self.rows
            .get(y / SIXEL_HEIGHT)
            .and_then(|row| row.get(x))
            .and_then(|column| column[y % SIXEL_HEIGHT])
    }

    /// Iterates over every painted pixel as `(x, y, color)`, row-major.
    pub fn painted_pixels(&self) -> impl Iterator<Item = (usize, usize, Rgb)> + '_ {
        self.rows.iter().enumerate().flat_map(|(band, row)| {
            (0..SIXEL_HEIGHT).flat_map(move |bit| {
                row.iter().enumerate().filter_map(move |(x, column)| {
                    column[bit].map(|rgb| (x, band * SIXEL_HEIGHT + bit, rgb))
                })
            })
        })
    }

    /// Number of pixels that carry a color.
    pub fn opaque_pixel_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .map(|column| column.iter().filter(|p| p.is_some()).count())
            .sum()
    }

    /// Clips `rect` against the image bounds. Returns `None` when nothing is left.
    pub fn clip(&self, rect: PixelRect) -> Option<PixelRect> {
        if rect.x >= self.width() || rect.y >= self.height() {
            return None;
        }
        let width = rect.width.min(self.width() - rect.x);
        let height = rect.height.min(self.height() - rect.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(PixelRect {
            x: rect.x,
            y: rect.y,
            width,
            height,
        })
    }

    /// Row-major RGBA bytes (4 per pixel). Unset pixels have alpha 0.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width() * self.height() * 4);
        for y in 0..self.height() {
            for x in 0..self.width() {
                match self.pixel(x, y) {
                    Some(rgb) => out.extend_from_slice(&[rgb.r, rgb.g, rgb.b, 0xff]),
                    None => out.extend_from_slice(&[0, 0, 0, 0]),
                }
            }
        }
        out
    }
}

/// Sparse pixel plane filled in by the decoder, then materialized into a `Raster`.
#[derive(Debug, Default)]
pub(crate) struct RasterBuilder {
    rows: Vec<Vec<SixelColumn>>,
    /// Highest column index touched by a data character, if any.
    max_x: Option<usize>,
    /// Highest band index touched by a data character, if any.
    max_band: Option<usize>,
}

impl RasterBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records that a sixel data character occupied column `x` of band `band`,
    /// whether or not it painted any pixel.
    pub(crate) fn touch(&mut self, x: usize, band: usize) {
        self.max_x = Some(self.max_x.map_or(x, |m| m.max(x)));
        self.max_band = Some(self.max_band.map_or(band, |m| m.max(band)));
    }

    /// Paints pixel `(x, y)`.
    pub(crate) fn set_pixel(&mut self, x: usize, y: usize, rgb: Rgb) {
        let band = y / SIXEL_HEIGHT;
        self.touch(x, band);

        if self.rows.len() <= band {
            self.rows.resize_with(band + 1, Vec::new);
        }
        let row = &mut self.rows[band];
        if row.len() <= x {
            row.resize(x + 1, EMPTY_COLUMN);
        }
        row[x][y % SIXEL_HEIGHT] = Some(rgb);
    }

    /// Width and height the finished raster will have.
    pub(crate) fn dimensions(&self) -> (usize, usize) {
        match (self.max_x, self.max_band) {
            (Some(x), Some(band)) => (x + 1, (band + 1) * SIXEL_HEIGHT),
            _ => (0, 0),
        }
    }

    /// Pads every band to the full width and returns the finished image.
    pub(crate) fn build(mut self) -> Raster {
        let (width, height) = self.dimensions();
        let band_count = height / SIXEL_HEIGHT;
        self.rows.resize_with(band_count, Vec::new);
        for row in &mut self.rows {
            row.resize(width, EMPTY_COLUMN);
        }
        Raster {
            rows: self.rows,
            width,
        }
    }
}
