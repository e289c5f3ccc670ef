// src/color.rs

//! Defines the color types used across the crate.
//!
//! Cell attributes and the color scheme use `Color`, a float RGB triple in
//! `0.0..=1.0` as handed to the display driver. Decoded Sixel rasters use `Rgb`,
//! an 8-bit-per-channel triple. `NamedColor` provides the 16 standard ANSI
//! colors used for the default scheme.

use serde::{Deserialize, Serialize};

/// A concrete 8-bit RGB triple, as stored in Sixel color registers and rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// A float RGB color with each channel in `0.0..=1.0`.
///
/// Serialized as a three-element array, e.g. `[1.0, 0.5, 0.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub [f32; 3]);

impl Color {
    pub const BLACK: Color = Color([0.0, 0.0, 0.0]);
    pub const WHITE: Color = Color([1.0, 1.0, 1.0]);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Color([r, g, b])
    }

    /// Converts an 8-bit triple to float channels.
    pub fn from_rgb(rgb: Rgb) -> Self {
        Color([
            rgb.r as f32 / 255.0,
            rgb.g as f32 / 255.0,
            rgb.b as f32 / 255.0,
        ])
    }

    /// Converts back to 8-bit channels, clamping out-of-range values.
    pub fn to_rgb(self) -> Rgb {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb::new(channel(self.0[0]), channel(self.0[1]), channel(self.0[2]))
    }

    pub fn r(&self) -> f32 {
        self.0[0]
    }

    pub fn g(&self) -> f32 {
        self.0[1]
    }

    pub fn b(&self) -> f32 {
        self.0[2]
    }
}

/// Standard ANSI named colors (indices 0-15).
/// These are the 8 normal and 8 bright colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl NamedColor {
    /// Converts a palette index (0-15) to a `NamedColor`, or `None` if out of range.
    pub fn from_index(idx: u8) -> Option<Self> {
        use NamedColor::*;
        const ALL: [NamedColor; 16] = [
            Black,
            Red,
            Green,
            Yellow,
            Blue,
            Magenta,
            Cyan,
            White,
            BrightBlack,
            BrightRed,
            BrightGreen,
            BrightYellow,
            BrightBlue,
            BrightMagenta,
            BrightCyan,
            BrightWhite,
        ];
        ALL.get(idx as usize).copied()
    }

    /// Returns the sRGB value commonly used by terminals for this color.
    pub fn to_rgb(self) -> Rgb {
        match self {
            NamedColor::Black => Rgb::new(0, 0, 0),
            NamedColor::Red => Rgb::new(205, 0, 0),
            NamedColor::Green => Rgb::new(0, 205, 0),
            NamedColor::Yellow => Rgb::new(205, 205, 0),
            NamedColor::Blue => Rgb::new(0, 0, 238),
            NamedColor::Magenta => Rgb::new(205, 0, 205),
            NamedColor::Cyan => Rgb::new(0, 205, 205),
            NamedColor::White => Rgb::new(229, 229, 229),
            NamedColor::BrightBlack => Rgb::new(127, 127, 127),
            NamedColor::BrightRed => Rgb::new(255, 0, 0),
            NamedColor::BrightGreen => Rgb::new(0, 255, 0),
            NamedColor::BrightYellow => Rgb::new(255, 255, 0),
            NamedColor::BrightBlue => Rgb::new(92, 92, 255),
            NamedColor::BrightMagenta => Rgb::new(255, 0, 255),
            NamedColor::BrightCyan => Rgb::new(0, 255, 255),
            NamedColor::BrightWhite => Rgb::new(255, 255, 255),
        }
    }

    pub fn to_color(self) -> Color {
        Color::from_rgb(self.to_rgb())
    }
}
