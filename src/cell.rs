// src/cell.rs

//! Defines the `Cell` type, its visual attributes (`AttrFlags`, `Attributes`),
//! and the raster slice a cell may carry.
//!
//! A `Cell` represents a single character position on the terminal grid,
//! encapsulating the character itself, all its styling information, and
//! optionally the piece of a Sixel image that covers it.

use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

use crate::color::Color;
use crate::sixel::Raster;

/// The rune stored in a cell that has never been written.
pub const EMPTY_RUNE: char = '\0';

bitflags! {
    /// Text attribute flags, corresponding to the common SGR parameters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrFlags: u8 {
        const BOLD      = 1 << 0;
        const DIM       = 1 << 1;
        const UNDERLINE = 1 << 2;
        const BLINK     = 1 << 3;
        const REVERSE   = 1 << 4; // Swaps foreground and background colors.
        const HIDDEN    = 1 << 5;
    }
}

/// Foreground color, background color and styling flags of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attributes {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl Attributes {
    pub fn new(fg: Color, bg: Color) -> Self {
        Attributes {
            fg,
            bg,
            flags: AttrFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: AttrFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_reverse(&self) -> bool {
        self.flags.contains(AttrFlags::REVERSE)
    }
}

/// The part of a Sixel image that covers one cell.
///
/// An image spans a rectangular block of cells; every cell in the block shares
/// the same `Arc<Raster>` and records its position inside the block, so the
/// compositor can cut out the matching source rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSlice {
    pub raster: Arc<Raster>,
    /// Column of this cell within the image block (0 = the anchor column).
    pub col_offset: usize,
    /// Row of this cell within the image block (0 = the anchor row).
    pub row_offset: usize,
}

/// A single grid position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    rune: char,
    attr: Attributes,
    raster: Option<RasterSlice>,
}

impl Cell {
    pub fn new(rune: char, attr: Attributes) -> Self {
        Cell {
            rune,
            attr,
            raster: None,
        }
    }

    /// An empty cell showing only `background`.
    pub fn background(background: Color) -> Self {
        Cell {
            rune: EMPTY_RUNE,
            attr: Attributes {
                bg: background,
                ..Attributes::default()
            },
            raster: None,
        }
    }

    pub fn rune(&self) -> char {
        self.rune
    }

    pub fn attr(&self) -> Attributes {
        self.attr
    }

    pub fn fg(&self) -> Color {
        self.attr.fg
    }

    pub fn bg(&self) -> Color {
        self.attr.bg
    }

    pub fn raster(&self) -> Option<&RasterSlice> {
        self.raster.as_ref()
    }

    /// True for a visible character: neither empty nor a space.
    pub fn has_glyph(&self) -> bool {
        self.rune != EMPTY_RUNE && self.rune != ' '
    }

    /// Writes a character, dropping any image that covered the cell.
    pub(crate) fn write(&mut self, rune: char, attr: Attributes) {
        self.rune = rune;
        self.attr = attr;
        self.raster = None;
    }

    /// Clears the character and any image. Attributes are kept.
    pub(crate) fn erase(&mut self) {
        self.rune = EMPTY_RUNE;
        self.raster = None;
    }

    pub(crate) fn set_raster(&mut self, slice: RasterSlice) {
        self.raster = Some(slice);
    }

    pub(crate) fn clear_raster(&mut self) {
        self.raster = None;
    }
}

// Prints only the character, not its attributes.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rune)
    }
}
