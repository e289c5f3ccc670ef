// src/sixel/decoder.rs

//! Parses a Sixel payload into a `Raster`.
//!
//! The payload is everything between the DCS introducer and the string
//! terminator. Repeat markers are expanded first, then a small state machine
//! walks the flat character stream:
//!
//! ```text
//! Header --'q'--> Body(Normal) --'#'--> Body(ColorSelectOrDefine)
//!                      ^                          |
//!                      +---- lookahead not [0-9;] +
//! ```
//!
//! Color registers live only for the duration of one call.

use std::collections::HashMap;

use log::{debug, trace};

use super::raster::{Raster, RasterBuilder, SIXEL_HEIGHT};
use super::rle::expand_repeats;
use super::{
    SixelError, DEFAULT_MAX_EXPANDED, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_REPEAT,
    DEFAULT_MAX_WIDTH, SIXEL_BODY_INTRODUCER, SIXEL_DATA_END, SIXEL_DATA_OFFSET,
};
use crate::color::Rgb;

const GRAPHICS_NEW_LINE: char = '-';
const GRAPHICS_CARRIAGE_RETURN: char = '$';
const COLOR_INTRODUCER: char = '#';
const PARAM_SEPARATOR: char = ';';

const COLOR_SPACE_HLS: u32 = 1;
const COLOR_SPACE_RGB: u32 = 2;
const RGB_PERCENT_MAX: u64 = 100;

/// Bounds applied while decoding, so a hostile payload cannot allocate without limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest count accepted in a single `!` repeat marker.
    pub max_repeat: usize,
    /// Longest character stream repeat expansion may produce.
    pub max_expanded: usize,
    /// Widest raster, in pixels.
    pub max_width: usize,
    /// Tallest raster, in pixels.
    pub max_height: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_repeat: DEFAULT_MAX_REPEAT,
            max_expanded: DEFAULT_MAX_EXPANDED,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

/// Top-level parser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Skipping the aspect-ratio / grid-size parameters before `q`.
    Header,
    Body(BodyState),
}

/// Sub-states of the image body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState {
    Normal,
    /// Collecting the parameters of a `#` directive.
    ColorSelectOrDefine,
}

/// Decodes `payload` with the default limits.
pub fn decode(payload: &str) -> Result<Raster, SixelError> {
    decode_with_limits(payload, &DecodeLimits::default())
}

/// Decodes `payload`, failing if it exceeds `limits`.
///
/// An empty payload (or one that never reaches `q`) yields an empty raster.
pub fn decode_with_limits(payload: &str, limits: &DecodeLimits) -> Result<Raster, SixelError> {
    let expanded = expand_repeats(payload, limits.max_repeat, limits.max_expanded)?;
    let mut decoder = Decoder::new(limits);
    decoder.run(&expanded)?;
    let raster = decoder.builder.build();
    debug!(
        "sixel: decoded {}x{} raster ({} painted pixels)",
        raster.width(),
        raster.height(),
        raster.opaque_pixel_count()
    );
    Ok(raster)
}

struct Decoder<'a> {
    state: DecoderState,
    limits: &'a DecodeLimits,
    x: usize,
    y: usize,
    registers: HashMap<u32, Rgb>,
    active_color: Rgb,
    directive: String,
    builder: RasterBuilder,
}

impl<'a> Decoder<'a> {
    fn new(limits: &'a DecodeLimits) -> Self {
        Decoder {
            state: DecoderState::Header,
            limits,
            x: 0,
            y: 0,
            registers: HashMap::new(),
            active_color: Rgb::BLACK,
            directive: String::new(),
            builder: RasterBuilder::new(),
        }
    }

    fn run(&mut self, input: &str) -> Result<(), SixelError> {
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            let lookahead = chars.peek().copied();
            match self.state {
                DecoderState::Header => {
                    if c == SIXEL_BODY_INTRODUCER {
                        trace!("sixel: header done");
                        self.state = DecoderState::Body(BodyState::Normal);
                    }
                }
                DecoderState::Body(BodyState::Normal) => self.handle_body_char(c, lookahead)?,
                DecoderState::Body(BodyState::ColorSelectOrDefine) => {
                    self.directive.push(c);
                    if !is_directive_char(lookahead) {
                        self.finish_directive()?;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_body_char(&mut self, c: char, lookahead: Option<char>) -> Result<(), SixelError> {
        match c {
            GRAPHICS_NEW_LINE => {
                self.y += SIXEL_HEIGHT;
                self.x = 0;
            }
            GRAPHICS_CARRIAGE_RETURN => self.x = 0,
            COLOR_INTRODUCER => {
                self.directive.clear();
                self.state = DecoderState::Body(BodyState::ColorSelectOrDefine);
                if !is_directive_char(lookahead) {
                    self.finish_directive()?;
                }
            }
            _ if (SIXEL_DATA_OFFSET..=SIXEL_DATA_END).contains(&(c as u32)) => {
                self.paint_column(c as u32 - SIXEL_DATA_OFFSET)?;
            }
            _ => trace!("sixel: ignoring {:?} in body", c),
        }
        Ok(())
    }

    fn paint_column(&mut self, mask: u32) -> Result<(), SixelError> {
        let width = self.x + 1;
        let height = self.y + SIXEL_HEIGHT;
        if width > self.limits.max_width || height > self.limits.max_height {
            return Err(SixelError::RasterTooLarge {
                width,
                height,
                max_width: self.limits.max_width,
                max_height: self.limits.max_height,
            });
        }

        self.builder.touch(self.x, self.y / SIXEL_HEIGHT);
        for bit in 0..SIXEL_HEIGHT {
            if mask & (1 << bit) != 0 {
                self.builder.set_pixel(self.x, self.y + bit, self.active_color);
            }
        }
        self.x += 1;
        Ok(())
    }

    fn finish_directive(&mut self) -> Result<(), SixelError> {
        self.state = DecoderState::Body(BodyState::Normal);
        let directive = std::mem::take(&mut self.directive);
        let params: Vec<&str> = directive.split(PARAM_SEPARATOR).collect();
        let invalid = || SixelError::InvalidColorDirective {
            directive: directive.clone(),
        };

        match params.as_slice() {
            [register] => {
                let register = parse_param(register).ok_or_else(invalid)?;
                match self.registers.get(&register) {
                    Some(&rgb) => {
                        trace!("sixel: select register {} -> {:?}", register, rgb);
                        self.active_color = rgb;
                    }
                    None => trace!("sixel: select of undefined register {} ignored", register),
                }
                Ok(())
            }
            [register, space, px, py, pz] => {
                let register = parse_param(register).ok_or_else(invalid)?;
                match parse_param(space) {
                    Some(COLOR_SPACE_HLS) => Err(SixelError::UnsupportedColorSpace { register }),
                    Some(COLOR_SPACE_RGB) => {
                        let r = parse_param(px).ok_or_else(invalid)?;
                        let g = parse_param(py).ok_or_else(invalid)?;
                        let b = parse_param(pz).ok_or_else(invalid)?;
                        let rgb = Rgb::new(scale_percent(r), scale_percent(g), scale_percent(b));
                        trace!("sixel: define register {} = {:?}", register, rgb);
                        self.registers.insert(register, rgb);
                        Ok(())
                    }
                    _ => Err(SixelError::UnknownColorSpace {
                        register,
                        space: space.to_string(),
                    }),
                }
            }
            _ => Err(invalid()),
        }
    }
}

fn is_directive_char(c: Option<char>) -> bool {
    matches!(c, Some(c) if c.is_ascii_digit() || c == PARAM_SEPARATOR)
}

/// Parses a numeric parameter. An empty parameter defaults to 0.
fn parse_param(param: &str) -> Option<u32> {
    if param.is_empty() {
        return Some(0);
    }
    param.parse().ok()
}

/// Maps a 0-100 channel value to 0-255, rounding half up and clamping.
fn scale_percent(value: u32) -> u8 {
    let scaled = (value as u64 * 255 + RGB_PERCENT_MAX / 2) / RGB_PERCENT_MAX;
    scaled.min(u8::MAX as u64) as u8
}

#[cfg(test)]
mod scale_tests {
    use super::scale_percent;

    #[test]
    fn percent_scaling_hits_the_endpoints() {
        assert_eq!(scale_percent(0), 0);
        assert_eq!(scale_percent(50), 128);
        assert_eq!(scale_percent(100), 255);
        assert_eq!(scale_percent(250), 255);
    }
}
