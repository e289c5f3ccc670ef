// src/term/input.rs

//! The input loop: a reader thread pulls chunks off the byte source and the
//! loop feeds them to an `InputProcessor`, enforcing the payload timeout.

use std::io::{ErrorKind, Read};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread;

use anyhow::{Context, Result};
use log::*;

use super::{InputProcessor, InputStats};
use crate::render::RenderEvent;

const READ_CHUNK_SIZE: usize = 4096;

/// Feeds everything `reader` produces to `processor` until end of input, then
/// sends `RenderEvent::InputClosed` on `events`.
///
/// Blocks the calling thread; the reads themselves happen on a dedicated
/// `input-reader` thread so a silent source cannot stall an open Sixel payload
/// past its timeout.
pub fn run_input_loop<R>(
    reader: R,
    mut processor: InputProcessor,
    events: Sender<RenderEvent>,
) -> Result<InputStats>
where
    R: Read + Send + 'static,
{
    let (chunk_tx, chunk_rx) = channel::<Vec<u8>>();
    thread::Builder::new()
        .name("input-reader".to_string())
        .spawn(move || read_chunks(reader, chunk_tx))
        .context("Failed to spawn input reader thread")?;

    info!("Input loop: started");
    loop {
        let chunk = if processor.in_payload() {
            let timeout = processor.payload_timeout();
            match chunk_rx.recv_timeout(timeout) {
                Ok(chunk) => chunk,
                Err(RecvTimeoutError::Timeout) => {
                    processor.abort_payload(&format!("no input for {} ms", timeout.as_millis()));
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match chunk_rx.recv() {
                Ok(chunk) => chunk,
                Err(_) => break,
            }
        };
        processor.feed(&chunk);
    }

    processor.finish();
    let stats = processor.stats();
    info!(
        "Input loop: stopped after {} bytes, {} images, {} Sixel failures",
        stats.bytes, stats.images_attached, stats.sixel_failures
    );
    if events.send(RenderEvent::InputClosed).is_err() {
        debug!("Input loop: render loop already gone");
    }
    Ok(stats)
}

fn read_chunks<R: Read>(mut reader: R, chunks: Sender<Vec<u8>>) {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("Input reader: end of input");
                break;
            }
            Ok(n) => {
                if chunks.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Input reader: read failed: {}", e);
                break;
            }
        }
    }
}
