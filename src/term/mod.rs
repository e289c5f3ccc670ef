// src/term/mod.rs

//! Input processing: turns the raw byte stream into buffer mutations.
//!
//! Bytes are decoded to characters with `utf8parse`, then a small dispatcher
//! state machine sorts them into printable text, the C0 controls the buffer
//! understands (LF, CR, BS, HT), skipped escape sequences, and DCS payloads.
//! A DCS payload is accumulated by a `SixelCollector`, decoded, and the
//! resulting image attached at the cursor.
//!
//! Decoding happens before the buffer lock is taken; the resulting
//! `InputAction`s for one chunk are then applied under a single lock.

mod input;

pub use input::run_input_loop;

use std::time::Duration;

use log::{debug, error, trace, warn};
use utf8parse::{Parser as Utf8Parser, Receiver as Utf8Receiver};

use crate::buffer::{Buffer, SharedBuffer};
use crate::config::SixelConfig;
use crate::sixel::{
    decode_with_limits, CollectStatus, Raster, SixelCollector, SixelError,
    SIXEL_BODY_INTRODUCER,
};

const BS: char = '\x08';
const HT: char = '\x09';
const LF: char = '\x0A';
const VT: char = '\x0B';
const FF: char = '\x0C';
const CR: char = '\x0D';
const ESC: char = '\x1B';

/// Second character of `ESC [`.
const CSI_INTRODUCER: char = '[';
/// Second character of `ESC P`.
const DCS_INTRODUCER: char = 'P';

/// A buffer mutation produced by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    Print(char),
    LineFeed,
    CarriageReturn,
    Backspace,
    Tab,
    /// A decoded image to attach at the cursor.
    Image(Raster),
}

/// Counters reported when the input stream ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputStats {
    pub bytes: usize,
    pub images_attached: usize,
    /// Sixel sequences that were collected or decoded unsuccessfully, or
    /// whose image could not be attached.
    pub sixel_failures: usize,
}

#[derive(Debug)]
enum DispatchState {
    Ground,
    Escape,
    /// Inside a CSI sequence, skipping to its final byte.
    CsiIgnore,
    SixelPayload(SixelCollector),
}

pub struct InputProcessor {
    shared: SharedBuffer,
    config: SixelConfig,
    utf8_parser: Utf8Parser,
    state: DispatchState,
    stats: InputStats,
}

impl InputProcessor {
    pub fn new(shared: SharedBuffer, config: SixelConfig) -> Self {
        InputProcessor {
            shared,
            config,
            utf8_parser: Utf8Parser::new(),
            state: DispatchState::Ground,
            stats: InputStats::default(),
        }
    }

    pub fn stats(&self) -> InputStats {
        self.stats
    }

    /// True while a DCS payload is being collected.
    pub fn in_payload(&self) -> bool {
        matches!(self.state, DispatchState::SixelPayload(_))
    }

    /// How long the input may stay silent inside a payload.
    pub fn payload_timeout(&self) -> Duration {
        Duration::from_millis(self.config.payload_timeout_ms)
    }

    /// Processes one chunk of input.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.stats.bytes += bytes.len();

        let mut chars = Vec::with_capacity(bytes.len());
        let mut sink = CharSink { chars: &mut chars };
        for &byte in bytes {
            self.utf8_parser.advance(&mut sink, byte);
        }

        let mut actions = Vec::new();
        for c in chars {
            self.step(c, &mut actions);
        }
        if actions.is_empty() {
            return;
        }

        let shared = self.shared.clone();
        let stats = &mut self.stats;
        let applied = shared.with_mut(|buffer| {
            for action in actions {
                apply(buffer, action, stats);
            }
        });
        if let Err(e) = applied {
            error!("Input: dropping chunk, buffer unavailable: {:#}", e);
        }
    }

    /// Abandons the payload being collected, if any.
    pub fn abort_payload(&mut self, reason: &str) {
        if let DispatchState::SixelPayload(collector) =
            std::mem::replace(&mut self.state, DispatchState::Ground)
        {
            let err = collector.abort(reason);
            self.report_failure(&err);
        }
    }

    /// Called at end of input: a payload still open is truncated.
    pub fn finish(&mut self) {
        self.abort_payload("input stream ended");
    }

    fn step(&mut self, c: char, actions: &mut Vec<InputAction>) {
        let state = std::mem::replace(&mut self.state, DispatchState::Ground);
        self.state = match state {
            DispatchState::Ground => match c {
                ESC => DispatchState::Escape,
                LF | VT | FF => {
                    actions.push(InputAction::LineFeed);
                    DispatchState::Ground
                }
                CR => {
                    actions.push(InputAction::CarriageReturn);
                    DispatchState::Ground
                }
                BS => {
                    actions.push(InputAction::Backspace);
                    DispatchState::Ground
                }
                HT => {
                    actions.push(InputAction::Tab);
                    DispatchState::Ground
                }
                c if c.is_control() => {
                    trace!("Input: ignoring control {:?}", c);
                    DispatchState::Ground
                }
                c => {
                    actions.push(InputAction::Print(c));
                    DispatchState::Ground
                }
            },
            DispatchState::Escape => match c {
                CSI_INTRODUCER => DispatchState::CsiIgnore,
                DCS_INTRODUCER => {
                    trace!("Input: DCS introducer, collecting payload");
                    DispatchState::SixelPayload(SixelCollector::new(self.config.max_payload_bytes))
                }
                ESC => DispatchState::Escape,
                other => {
                    trace!("Input: ignoring ESC {:?}", other);
                    DispatchState::Ground
                }
            },
            DispatchState::CsiIgnore => {
                if ('\x40'..='\x7E').contains(&c) {
                    DispatchState::Ground
                } else {
                    DispatchState::CsiIgnore
                }
            }
            DispatchState::SixelPayload(mut collector) => match collector.push(c) {
                CollectStatus::Pending => DispatchState::SixelPayload(collector),
                CollectStatus::Complete(payload) => {
                    self.dispatch_payload(&payload, actions);
                    DispatchState::Ground
                }
                CollectStatus::Failed(err) => {
                    self.report_failure(&err);
                    DispatchState::Ground
                }
            },
        };
    }

    fn dispatch_payload(&mut self, payload: &str, actions: &mut Vec<InputAction>) {
        if !is_sixel_payload(payload) {
            debug!("Input: ignoring non-Sixel DCS of {} bytes", payload.len());
            return;
        }
        match decode_with_limits(payload, &self.config.decode_limits()) {
            Ok(raster) if raster.is_empty() => {
                debug!("Input: Sixel sequence decoded to an empty image");
            }
            Ok(raster) => {
                debug!(
                    "Input: decoded {}x{} Sixel image",
                    raster.width(),
                    raster.height()
                );
                actions.push(InputAction::Image(raster));
            }
            Err(err) => self.report_failure(&err),
        }
    }

    fn report_failure(&mut self, err: &SixelError) {
        warn!("Input: discarding Sixel sequence: {}", err);
        self.stats.sixel_failures += 1;
    }
}

fn apply(buffer: &mut Buffer, action: InputAction, stats: &mut InputStats) {
    match action {
        InputAction::Print(c) => buffer.write(c),
        InputAction::LineFeed => buffer.line_feed(),
        InputAction::CarriageReturn => buffer.carriage_return(),
        InputAction::Backspace => buffer.backspace(),
        InputAction::Tab => buffer.tab(),
        InputAction::Image(raster) => match buffer.attach_raster_at_cursor(raster) {
            Ok(()) => stats.images_attached += 1,
            Err(e) => {
                error!("Input: could not attach Sixel image: {}", e);
                stats.sixel_failures += 1;
            }
        },
    }
}

/// A DCS payload is Sixel if its numeric parameters are followed by `q`.
fn is_sixel_payload(payload: &str) -> bool {
    payload
        .chars()
        .find(|c| !c.is_ascii_digit() && *c != ';')
        == Some(SIXEL_BODY_INTRODUCER)
}

struct CharSink<'a> {
    chars: &'a mut Vec<char>,
}

impl Utf8Receiver for CharSink<'_> {
    fn codepoint(&mut self, c: char) {
        self.chars.push(c);
    }

    fn invalid_sequence(&mut self) {
        warn!("Input: invalid UTF-8 sequence");
        self.chars.push(char::REPLACEMENT_CHARACTER);
    }
}
