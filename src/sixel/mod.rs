// src/sixel/mod.rs

//! DEC Sixel inline-image support.
//!
//! - `rle`: expansion of `!<count><char>` repeat markers.
//! - `decoder`: the payload state machine producing a `Raster`.
//! - `collector`: accumulation of a payload from the input stream up to its
//!   terminator, with size and time limits.
//! - `raster`: the decoded image type.
//!
//! Everything here is synchronous and holds no state across payloads.

pub mod collector;
pub mod decoder;
pub mod raster;
pub mod rle;

pub use collector::{CollectStatus, SixelCollector};
pub use decoder::{decode, decode_with_limits, DecodeLimits};
pub use raster::{PixelRect, Raster, SixelColumn, SIXEL_HEIGHT};
pub use rle::expand_repeats;

use thiserror::Error;

/// Character that ends the header and starts the image body.
pub const SIXEL_BODY_INTRODUCER: char = 'q';
/// Offset subtracted from a data character to obtain its six-bit mask.
pub const SIXEL_DATA_OFFSET: u32 = 0x3F;
/// Last character of the data range.
pub const SIXEL_DATA_END: u32 = 0x7E;

pub const DEFAULT_MAX_REPEAT: usize = 32_768;
pub const DEFAULT_MAX_WIDTH: usize = 10_000;
pub const DEFAULT_MAX_HEIGHT: usize = 10_000;
/// Longest stream, in characters, that repeat expansion may produce.
pub const DEFAULT_MAX_EXPANDED: usize = 32 * 1024 * 1024;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Errors raised while collecting or decoding a Sixel payload.
///
/// Any of these aborts the current image; no partial raster is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SixelError {
    /// A color definition asked for HSL (`Pu = 1`).
    #[error("HSL color definitions are not supported (register {register})")]
    UnsupportedColorSpace { register: u32 },

    /// A color definition used a `Pu` other than 1 or 2.
    #[error("unknown color space {space} in definition of register {register}")]
    UnknownColorSpace { register: u32, space: String },

    /// A `#` directive had a parameter count other than 1 or 5, or a parameter
    /// that is not a number.
    #[error("invalid color directive: #{directive}")]
    InvalidColorDirective { directive: String },

    /// The payload never reached its terminator: the stream ended, went quiet
    /// for too long, or exceeded the size limit.
    #[error("sixel sequence truncated after {received} characters: {reason}")]
    TruncatedSequence { received: usize, reason: String },

    /// A repeat marker asked for more repetitions than allowed.
    #[error("repeat count {count} exceeds limit {limit}")]
    RepeatTooLarge { count: usize, limit: usize },

    /// Expanding the repeat markers would produce more characters than allowed.
    #[error("expanded sixel payload exceeds limit of {limit} characters")]
    ExpandedTooLarge { limit: usize },

    /// The image grew past the configured dimensions.
    #[error("raster of {width}x{height} exceeds limit {max_width}x{max_height}")]
    RasterTooLarge {
        width: usize,
        height: usize,
        max_width: usize,
        max_height: usize,
    },
}

#[cfg(test)]
mod tests;
