// src/sixel/collector.rs

//! Accumulates a Sixel payload from the input stream.
//!
//! The dispatcher creates a `SixelCollector` when it sees the DCS introducer
//! and pushes every following character into it. The payload ends at `ESC`;
//! the character after it (`\` of ST, or BEL) is swallowed. A payload that grows
//! past the size limit is dropped, but the collector keeps consuming input
//! until the terminator so the image data is not interpreted as text.

use log::{trace, warn};

use super::SixelError;

const ESC: char = '\x1b';
const BEL: char = '\x07';
const ST_FINAL: char = '\\';

/// Result of pushing one character into the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectStatus {
    /// More input is needed.
    Pending,
    /// The terminator was seen; this is the full payload.
    Complete(String),
    /// The terminator was seen but the payload had already been discarded.
    Failed(SixelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collecting,
    /// Over the size limit: consuming input until the terminator.
    Discarding,
    /// `ESC` seen; the next character is swallowed.
    AwaitingFinal,
}

#[derive(Debug)]
pub struct SixelCollector {
    phase: Phase,
    overflowed: bool,
    payload: String,
    received: usize,
    max_payload_bytes: usize,
}

impl SixelCollector {
    pub fn new(max_payload_bytes: usize) -> Self {
        SixelCollector {
            phase: Phase::Collecting,
            overflowed: false,
            payload: String::new(),
            received: 0,
            max_payload_bytes,
        }
    }

    /// Number of payload characters received so far, including discarded ones.
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn push(&mut self, c: char) -> CollectStatus {
        match self.phase {
            Phase::AwaitingFinal => {
                if c != ST_FINAL && c != BEL {
                    trace!("sixel: swallowing {:?} after ESC terminator", c);
                }
                self.finish()
            }
            _ if c == ESC => {
                self.phase = Phase::AwaitingFinal;
                CollectStatus::Pending
            }
            Phase::Discarding => {
                self.received += 1;
                CollectStatus::Pending
            }
            Phase::Collecting => {
                self.received += 1;
                if self.payload.len() + c.len_utf8() > self.max_payload_bytes {
                    warn!(
                        "sixel: payload exceeded {} bytes, discarding until terminator",
                        self.max_payload_bytes
                    );
                    self.payload = String::new();
                    self.overflowed = true;
                    self.phase = Phase::Discarding;
                } else {
                    self.payload.push(c);
                }
                CollectStatus::Pending
            }
        }
    }

    /// Gives up on the payload because the input stopped before its terminator.
    pub fn abort(self, reason: &str) -> SixelError {
        SixelError::TruncatedSequence {
            received: self.received,
            reason: reason.to_string(),
        }
    }

    fn finish(&mut self) -> CollectStatus {
        if self.overflowed {
            CollectStatus::Failed(SixelError::TruncatedSequence {
                received: self.received,
                reason: format!("payload exceeded {} bytes", self.max_payload_bytes),
            })
        } else {
            CollectStatus::Complete(std::mem::take(&mut self.payload))
        }
    }
}
