// src/main.rs

//! Replays a captured terminal byte stream (a file argument, or stdin) through
//! the input processor and the render loop, drawing into the headless driver.

use std::fs::File;
use std::io::{self, Read};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use log::info;

use sixterm::buffer::{Buffer, SharedBuffer};
use sixterm::config::CONFIG;
use sixterm::display::HeadlessDriver;
use sixterm::render::{RenderLoop, StopReason};
use sixterm::term::{run_input_loop, InputProcessor};

fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting sixterm...");
    let config = &*CONFIG;

    let reader: Box<dyn Read + Send> = match std::env::args_os().nth(1) {
        Some(path) => {
            info!("Reading input from {:?}", path);
            Box::new(File::open(&path).with_context(|| format!("Failed to open {:?}", path))?)
        }
        None => {
            info!("Reading input from stdin");
            Box::new(io::stdin())
        }
    };

    let shared = SharedBuffer::new(Buffer::new(
        config.appearance.columns,
        config.appearance.rows,
        config.appearance.scrollback_lines,
        config.colors,
    ));
    let (event_tx, event_rx) = mpsc::channel();

    let mut render_loop = RenderLoop::new(
        shared.clone(),
        HeadlessDriver::new(config.font.clone()),
        event_rx,
        Duration::from_millis(config.performance.frame_interval_ms),
    )
    .context("Failed to create render loop")?;

    let processor = InputProcessor::new(shared, config.sixel.clone());
    let input_thread = thread::Builder::new()
        .name("input".to_string())
        .spawn(move || run_input_loop(reader, processor, event_tx))
        .context("Failed to spawn input thread")?;

    let frames = render_loop.run()?;
    let driver_stats = render_loop.driver().stats();

    // A closed window does not wait for the reader, which may be blocked on stdin.
    if render_loop.stop_reason() == Some(StopReason::CloseRequested) {
        info!(
            "sixterm closed: {} frames, {} image pixels drawn",
            frames, driver_stats.opaque_pixels
        );
        return Ok(());
    }

    let input_stats = input_thread
        .join()
        .map_err(|_| anyhow!("Input thread panicked"))??;
    info!(
        "sixterm finished: {} frames, {} bytes read, {} images attached, {} Sixel failures, {} image pixels drawn",
        frames,
        input_stats.bytes,
        input_stats.images_attached,
        input_stats.sixel_failures,
        driver_stats.opaque_pixels
    );
    Ok(())
}
