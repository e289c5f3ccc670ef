// src/render/mod.rs

//! The render loop: drains window events, and when the buffer is dirty,
//! composites a snapshot and hands the draw operations to the driver.
//!
//! The loop owns the `Compositor` and the `Driver`. It shares the grid with the
//! input path only through `SharedBuffer`; the snapshot is taken and the dirty
//! flag cleared under one lock, so an unchanged grid is never drawn twice.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::*;

use crate::buffer::{CellSize, SharedBuffer};
use crate::compositor::{CellMetrics, Compositor};
use crate::display::{Driver, REFERENCE_GLYPH};

/// Notifications consumed by the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEvent {
    /// The drawable area changed size.
    Resize { width_px: u32, height_px: u32 },
    /// The driver's font changed; cell metrics must be measured again.
    FontChanged,
    /// The window needs repainting (exposed, focus gained).
    Redraw,
    /// The user closed the window.
    CloseRequested,
    /// The input stream ended.
    InputClosed,
}

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Continue,
    Stop,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CloseRequested,
    InputClosed,
    /// Every event sender was dropped.
    Disconnected,
}

pub struct RenderLoop<D: Driver> {
    shared: SharedBuffer,
    driver: D,
    events: Receiver<RenderEvent>,
    compositor: Compositor,
    frame_interval: Duration,
    /// Last window size received, re-applied when the font changes.
    window_px: Option<(u32, u32)>,
    frames: usize,
    stop_reason: Option<StopReason>,
}

impl<D: Driver> RenderLoop<D> {
    /// Measures the reference glyph once and sizes the buffer's cells from it.
    pub fn new(
        shared: SharedBuffer,
        mut driver: D,
        events: Receiver<RenderEvent>,
        frame_interval: Duration,
    ) -> Result<Self> {
        let metrics = measure_cell(&mut driver)?;
        shared.with_mut(|buffer| buffer.set_cell_size(cell_size(metrics)))?;
        info!(
            "RenderLoop: cell {}x{} px, ascent {}",
            metrics.width, metrics.height, metrics.ascent
        );
        Ok(RenderLoop {
            shared,
            driver,
            events,
            compositor: Compositor::new(metrics),
            frame_interval,
            window_px: None,
            frames: 0,
            stop_reason: None,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn cell_metrics(&self) -> CellMetrics {
        self.compositor.metrics()
    }

    /// Frames presented so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Set once a tick has returned `TickStatus::Stop`.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Handles every pending event, then draws a frame if the grid changed.
    ///
    /// A frame is still drawn on the tick that sees `CloseRequested` or
    /// `InputClosed`, so the last state of the grid reaches the display.
    pub fn tick(&mut self) -> Result<TickStatus> {
        let mut status = TickStatus::Continue;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if self.handle_event(event)? == TickStatus::Stop {
                        status = TickStatus::Stop;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("RenderLoop: event channel disconnected");
                    self.stop_reason.get_or_insert(StopReason::Disconnected);
                    status = TickStatus::Stop;
                    break;
                }
            }
        }

        if let Some(view) = self.shared.take_view_if_dirty()? {
            let ops = self.compositor.composite(&view);
            self.driver
                .execute(&ops)
                .context("Driver failed to execute draw operations")?;
            self.driver.present().context("Driver failed to present")?;
            self.frames += 1;
            trace!("RenderLoop: frame {} ({} ops)", self.frames, ops.len());
        }
        Ok(status)
    }

    /// Ticks at the frame interval until the window closes or input ends.
    /// Returns the number of frames presented.
    pub fn run(&mut self) -> Result<usize> {
        info!("RenderLoop: started");
        loop {
            let started = Instant::now();
            if self.tick()? == TickStatus::Stop {
                break;
            }
            let elapsed = started.elapsed();
            if elapsed < self.frame_interval {
                thread::sleep(self.frame_interval - elapsed);
            }
        }
        info!("RenderLoop: stopped after {} frames", self.frames);
        Ok(self.frames)
    }

    fn handle_event(&mut self, event: RenderEvent) -> Result<TickStatus> {
        debug!("RenderLoop: {:?}", event);
        match event {
            RenderEvent::Resize {
                width_px,
                height_px,
            } => {
                self.window_px = Some((width_px, height_px));
                self.apply_window_size(width_px, height_px)?;
            }
            RenderEvent::FontChanged => {
                let metrics = measure_cell(&mut self.driver)?;
                self.compositor.set_metrics(metrics);
                self.shared
                    .with_mut(|buffer| buffer.set_cell_size(cell_size(metrics)))?;
                if let Some((width_px, height_px)) = self.window_px {
                    self.apply_window_size(width_px, height_px)?;
                }
            }
            RenderEvent::Redraw => self.shared.mark_dirty()?,
            RenderEvent::CloseRequested => {
                self.stop_reason.get_or_insert(StopReason::CloseRequested);
                return Ok(TickStatus::Stop);
            }
            RenderEvent::InputClosed => {
                self.stop_reason.get_or_insert(StopReason::InputClosed);
                return Ok(TickStatus::Stop);
            }
        }
        Ok(TickStatus::Continue)
    }

    fn apply_window_size(&mut self, width_px: u32, height_px: u32) -> Result<()> {
        let metrics = self.compositor.metrics();
        let cols = cells_fitting(width_px, metrics.width);
        let rows = cells_fitting(height_px, metrics.height);
        debug!(
            "RenderLoop: window {}x{} px -> {}x{} cells",
            width_px, height_px, cols, rows
        );
        self.shared.with_mut(|buffer| buffer.resize(cols, rows))
    }
}

fn measure_cell<D: Driver>(driver: &mut D) -> Result<CellMetrics> {
    let metrics = driver
        .measure_glyph(REFERENCE_GLYPH)
        .context("Failed to measure reference glyph")?
        .cell_metrics();
    if metrics.width <= 0.0 || metrics.height <= 0.0 {
        anyhow::bail!(
            "Reference glyph has degenerate size {}x{}",
            metrics.width,
            metrics.height
        );
    }
    Ok(metrics)
}

fn cell_size(metrics: CellMetrics) -> CellSize {
    CellSize {
        width: metrics.width,
        height: metrics.height,
    }
}

/// Whole cells of `cell_px` that fit in `window_px`, at least one.
fn cells_fitting(window_px: u32, cell_px: f64) -> usize {
    ((window_px as f64 / cell_px).floor() as usize).max(1)
}
