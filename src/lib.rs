// src/lib.rs

//! sixterm: a terminal grid with inline DEC Sixel images.
//!
//! Input bytes flow through `term` into the shared `buffer`; the `render` loop
//! snapshots the buffer when it is dirty, runs the `compositor`, and hands the
//! resulting draw operations to a `display` driver. Sixel payloads are decoded
//! by `sixel` and attached to the grid as images covering a block of cells.

pub mod buffer;
pub mod cell;
pub mod color;
pub mod compositor;
pub mod config;
pub mod display;
pub mod render;
pub mod sixel;
pub mod term;
