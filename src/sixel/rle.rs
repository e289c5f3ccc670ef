// src/sixel/rle.rs

//! Run-length expansion for Sixel payloads.
//!
//! `!<digits><char>` stands for `<char>` repeated `<digits>` times. The marker
//! is consumed entirely: the `!`, every ASCII digit of the count, and the one
//! character that follows. A missing count reads as zero.

use super::SixelError;

const REPEAT_INTRODUCER: char = '!';

/// Expands every repeat marker in `payload`.
///
/// Fails with `RepeatTooLarge` if a single count exceeds `max_repeat`, and with
/// `ExpandedTooLarge` before the output would grow past `max_expanded`
/// characters. A marker cut off by the end of the payload (`"!12"`) expands to
/// nothing.
pub fn expand_repeats(
    payload: &str,
    max_repeat: usize,
    max_expanded: usize,
) -> Result<String, SixelError> {
    let too_large = || SixelError::ExpandedTooLarge {
        limit: max_expanded,
    };

    if !payload.contains(REPEAT_INTRODUCER) {
        if payload.len() > max_expanded {
            return Err(too_large());
        }
        return Ok(payload.to_string());
    }

    let mut out = String::with_capacity(payload.len().min(max_expanded));
    let mut chars = payload.chars().peekable();

    while let Some(c) = chars.next() {
        if c != REPEAT_INTRODUCER {
            if out.len() + c.len_utf8() > max_expanded {
                return Err(too_large());
            }
            out.push(c);
            continue;
        }

        let mut count: usize = 0;
        while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
            chars.next();
            count = count
                .checked_mul(10)
                .and_then(|n| n.checked_add(digit as usize))
                .filter(|&n| n <= max_repeat)
                .ok_or(SixelError::RepeatTooLarge {
                    count: count.saturating_mul(10).saturating_add(digit as usize),
                    limit: max_repeat,
                })?;
        }

        match chars.next() {
            Some(repeated) => {
                let grown = count
                    .checked_mul(repeated.len_utf8())
                    .and_then(|n| n.checked_add(out.len()))
                    .filter(|&n| n <= max_expanded)
                    .ok_or_else(too_large)?;
                out.reserve(grown - out.len());
                out.extend(std::iter::repeat(repeated).take(count));
            }
            None => log::trace!("sixel: repeat marker cut off at end of payload"),
        }
    }

    Ok(out)
}
