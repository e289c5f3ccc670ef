// src/sixel/tests.rs

//! Unit tests for repeat expansion, the decoder state machine, and payload collection.

use super::*;
use crate::color::Rgb;
use std::collections::BTreeSet;

const YELLOW: Rgb = Rgb::new(255, 255, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);

/// The example image from the DEC documentation, as used on Wikipedia.
const WIKIPEDIA_EXAMPLE: &str = "q
 #0;2;0;0;0#1;2;100;100;0#2;2;0;100;0
 #1~~@@vv@@~~@@~~$
 #2??}}GG}}??}}??-
 #1!14@";

fn mask(c: char) -> u32 {
    c as u32 - SIXEL_DATA_OFFSET
}

/// Pixel set a color-free body should paint, derived straight from the characters.
fn expected_pixels(body: &str) -> BTreeSet<(usize, usize)> {
    let (mut x, mut y) = (0, 0);
    let mut set = BTreeSet::new();
    for c in body.chars() {
        match c {
            '-' => {
                y += SIXEL_HEIGHT;
                x = 0;
            }
            '$' => x = 0,
            '?'..='~' => {
                for bit in 0..SIXEL_HEIGHT {
                    if mask(c) & (1 << bit) != 0 {
                        set.insert((x, y + bit));
                    }
                }
                x += 1;
            }
            _ => {}
        }
    }
    set
}

fn painted(raster: &Raster) -> BTreeSet<(usize, usize)> {
    raster.painted_pixels().map(|(x, y, _)| (x, y)).collect()
}

// --- Repeat expansion ---

fn expand(payload: &str) -> Result<String, SixelError> {
    expand_repeats(payload, DEFAULT_MAX_REPEAT, DEFAULT_MAX_EXPANDED)
}

#[test_log::test]
fn repeat_marker_expands_to_exact_count() {
    assert_eq!(expand("!3a").unwrap(), "aaa");
    assert_eq!(
        expand("x!12~y").unwrap(),
        format!("x{}y", "~".repeat(12))
    );
}

#[test_log::test]
fn zero_repeat_expands_to_nothing() {
    assert_eq!(expand("a!0bc").unwrap(), "ac");
    assert_eq!(expand("a!bc").unwrap(), "ac");
}

#[test_log::test]
fn payload_without_markers_is_unchanged() {
    let payload = "q#0;2;0;0;0#0~~@@-$";
    assert_eq!(expand(payload).unwrap(), payload);
}

#[test_log::test]
fn repeat_marker_cut_off_at_end_expands_to_nothing() {
    assert_eq!(expand("ab!12").unwrap(), "ab");
}

#[test_log::test]
fn repeat_count_over_limit_is_rejected() {
    assert_eq!(
        expand_repeats("!6a", 5, DEFAULT_MAX_EXPANDED),
        Err(SixelError::RepeatTooLarge { count: 6, limit: 5 })
    );
}

#[test_log::test]
fn expansion_stops_at_output_limit() {
    assert_eq!(expand_repeats("ab!3c", 100, 5).unwrap(), "abccc");
    assert_eq!(
        expand_repeats("ab!4c", 100, 5),
        Err(SixelError::ExpandedTooLarge { limit: 5 })
    );
    assert_eq!(
        expand_repeats("abcdef", 100, 5),
        Err(SixelError::ExpandedTooLarge { limit: 5 })
    );
}

#[test_log::test]
fn carriage_returns_cannot_amplify_past_expansion_limit() {
    // Each marker stays under the width limit, but `$` rewinds the column so
    // the total would be far larger than any raster the limits allow.
    let payload = format!("q{}", "!9999?$".repeat(4096));
    assert!(payload.len() < DEFAULT_MAX_PAYLOAD_BYTES);
    assert_eq!(
        decode(&payload),
        Err(SixelError::ExpandedTooLarge {
            limit: DEFAULT_MAX_EXPANDED
        })
    );

    let limits = DecodeLimits {
        max_expanded: 64,
        ..DecodeLimits::default()
    };
    assert!(decode_with_limits("q!60~", &limits).is_ok());
    assert!(matches!(
        decode_with_limits("q!40~$!40~", &limits),
        Err(SixelError::ExpandedTooLarge { limit: 64 })
    ));
}

// --- Decoding geometry ---

#[test_log::test]
fn empty_payload_yields_empty_raster() {
    let raster = decode("").unwrap();
    assert_eq!((raster.width(), raster.height()), (0, 0));
    assert!(raster.is_empty());
}

#[test_log::test]
fn header_parameters_are_skipped() {
    let raster = decode("0;1;0q~").unwrap();
    assert_eq!((raster.width(), raster.height()), (1, 6));
    // Header characters in the data range must not paint anything.
    let raster = decode("~~~").unwrap();
    assert!(raster.is_empty());
}

#[test_log::test]
fn decoded_pixels_match_bitmasks() {
    let bodies = ["~", "@A?B", "~-~", "N$O-?_", "vv@@$??}}-GG\n~"];
    for body in bodies {
        let raster = decode(&format!("q{}", body)).unwrap();
        assert_eq!(painted(&raster), expected_pixels(body), "body {:?}", body);
    }
}

#[test_log::test]
fn empty_columns_still_count_towards_width() {
    let raster = decode("q~??").unwrap();
    assert_eq!(raster.width(), 3);
    assert_eq!(raster.pixel(2, 0), None);
}

#[test_log::test]
fn trailing_newline_does_not_add_a_row() {
    let raster = decode("q~-").unwrap();
    assert_eq!(raster.height(), 6);
    let raster = decode("q~-@").unwrap();
    assert_eq!(raster.height(), 12);
}

#[test_log::test]
fn rows_are_padded_to_full_width() {
    let raster = decode("q~~~~-~").unwrap();
    assert_eq!(raster.width(), 4);
    assert!(raster.rows().iter().all(|row| row.len() == 4));
    assert_eq!(raster.pixel(3, 6), None);
}

#[test_log::test]
fn carriage_return_overwrites_same_row() {
    let raster = decode("q#1;2;100;0;0#1~$#2;2;0;0;100#2@").unwrap();
    assert_eq!(raster.width(), 1);
    assert_eq!(raster.pixel(0, 0), Some(Rgb::new(0, 0, 255)));
    assert_eq!(raster.pixel(0, 1), Some(Rgb::new(255, 0, 0)));
}

#[test_log::test]
fn unknown_body_characters_are_ignored() {
    let raster = decode("q \n\r~\x01~").unwrap();
    assert_eq!(raster.width(), 2);
}

#[test_log::test]
fn wikipedia_example_decodes() {
    let raster = decode(WIKIPEDIA_EXAMPLE).expect("example should decode");
    assert!(raster.height() >= 12);
    assert_eq!(raster.width(), 14);

    // Every bit set by the register 1 characters in the first row is yellow.
    for (x, c) in "~~@@vv@@~~@@~~".chars().enumerate() {
        for bit in 0..SIXEL_HEIGHT {
            if mask(c) & (1 << bit) != 0 {
                assert_eq!(raster.pixel(x, bit), Some(YELLOW), "({}, {})", x, bit);
            }
        }
    }
    // The register 2 overlay.
    assert_eq!(raster.pixel(2, 1), Some(GREEN));
    assert_eq!(raster.pixel(4, 3), Some(GREEN));
    // Second row: a single yellow line, 14 wide.
    for x in 0..14 {
        assert_eq!(raster.pixel(x, 6), Some(YELLOW));
        assert_eq!(raster.pixel(x, 7), None);
    }
}

// --- Color directives ---

#[test_log::test]
fn rgb_definition_scales_percentages() {
    let raster = decode("q#0;2;0;0;0#1;2;100;100;0#0~#1~").unwrap();
    assert_eq!(raster.pixel(0, 0), Some(Rgb::new(0, 0, 0)));
    assert_eq!(raster.pixel(1, 0), Some(YELLOW));
}

#[test_log::test]
fn default_color_is_black_until_selected() {
    let raster = decode("q#3;2;100;0;0~#3~").unwrap();
    assert_eq!(raster.pixel(0, 0), Some(Rgb::BLACK));
    assert_eq!(raster.pixel(1, 0), Some(Rgb::new(255, 0, 0)));
}

#[test_log::test]
fn selecting_undefined_register_keeps_active_color() {
    let raster = decode("q#1;2;100;0;0#1~#7~").unwrap();
    assert_eq!(raster.pixel(1, 0), Some(Rgb::new(255, 0, 0)));
}

#[test_log::test]
fn registers_do_not_persist_between_decodes() {
    decode("q#1;2;100;0;0#1~").unwrap();
    let raster = decode("q#1~").unwrap();
    assert_eq!(raster.pixel(0, 0), Some(Rgb::BLACK));
}

#[test_log::test]
fn hsl_definition_is_unsupported() {
    assert_eq!(
        decode("q#1;1;120;50;100~"),
        Err(SixelError::UnsupportedColorSpace { register: 1 })
    );
}

#[test_log::test]
fn unknown_color_space_is_rejected() {
    assert_eq!(
        decode("q#4;3;0;0;0~"),
        Err(SixelError::UnknownColorSpace {
            register: 4,
            space: "3".to_string()
        })
    );
}

#[test_log::test]
fn wrong_parameter_count_is_invalid() {
    for directive in ["#1;2", "#1;2;0", "#1;2;0;0", "#1;2;0;0;0;0"] {
        let result = decode(&format!("q{}~", directive));
        assert!(
            matches!(result, Err(SixelError::InvalidColorDirective { .. })),
            "{} gave {:?}",
            directive,
            result
        );
    }
}

#[test_log::test]
fn directive_at_end_of_payload_is_still_applied() {
    let raster = decode("q~#").unwrap();
    assert_eq!(raster.width(), 1);
    assert_eq!(
        decode("q~#1;2;1"),
        Err(SixelError::InvalidColorDirective {
            directive: "1;2;1".to_string()
        })
    );
}

#[test_log::test]
fn color_directive_ends_at_non_parameter_character() {
    // The '~' right after the register number is data, not part of the directive.
    let raster = decode("q#1;2;0;0;100#1~").unwrap();
    assert_eq!(raster.pixel(0, 5), Some(Rgb::new(0, 0, 255)));
}

#[test_log::test]
fn raster_over_limit_is_rejected() {
    let limits = DecodeLimits {
        max_width: 2,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        decode_with_limits("q~~~", &limits),
        Err(SixelError::RasterTooLarge { width: 3, .. })
    ));
    assert!(decode_with_limits("q~~", &limits).is_ok());
}

#[test_log::test]
fn rgba_export_marks_unset_pixels_transparent() {
    let raster = decode("q#1;2;100;0;0#1@").unwrap();
    let rgba = raster.to_rgba8();
    assert_eq!(rgba.len(), 6 * 4);
    assert_eq!(&rgba[0..4], &[255, 0, 0, 255]);
    assert_eq!(&rgba[4..8], &[0, 0, 0, 0]);
}

// --- Payload collection ---

fn push_all(collector: &mut SixelCollector, input: &str) -> CollectStatus {
    let mut status = CollectStatus::Pending;
    for c in input.chars() {
        status = collector.push(c);
        if status != CollectStatus::Pending {
            break;
        }
    }
    status
}

#[test_log::test]
fn collector_stops_at_esc_and_swallows_final() {
    let mut collector = SixelCollector::new(DEFAULT_MAX_PAYLOAD_BYTES);
    assert_eq!(
        push_all(&mut collector, "q~~@@\x1b\\"),
        CollectStatus::Complete("q~~@@".to_string())
    );

    let mut collector = SixelCollector::new(DEFAULT_MAX_PAYLOAD_BYTES);
    assert_eq!(
        push_all(&mut collector, "q~\x1b\x07"),
        CollectStatus::Complete("q~".to_string())
    );
}

#[test_log::test]
fn oversized_payload_fails_at_terminator() {
    let mut collector = SixelCollector::new(3);
    assert_eq!(push_all(&mut collector, "q~~~~"), CollectStatus::Pending);
    assert!(matches!(
        push_all(&mut collector, "\x1b\\"),
        CollectStatus::Failed(SixelError::TruncatedSequence { received: 5, .. })
    ));
}

#[test_log::test]
fn aborted_collector_reports_truncation() {
    let mut collector = SixelCollector::new(DEFAULT_MAX_PAYLOAD_BYTES);
    push_all(&mut collector, "q~~");
    assert_eq!(collector.received(), 3);
    assert!(matches!(
        collector.abort("input closed"),
        SixelError::TruncatedSequence { received: 3, .. }
    ));
}
