// src/buffer/shared.rs

//! `SharedBuffer`: the grid behind one lock, shared by the input and render threads.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use log::trace;

use super::{Buffer, GridView};

/// A `Buffer` shared between the input path and the render loop.
///
/// Every access goes through one mutex, so the render loop never sees a
/// half-applied mutation, and the dirty flag is checked and cleared in the same
/// critical section that builds the snapshot.
#[derive(Debug, Clone)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Buffer>>,
}

impl SharedBuffer {
    pub fn new(buffer: Buffer) -> Self {
        SharedBuffer {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Buffer>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("buffer lock poisoned"))
    }

    /// Runs `f` with exclusive access to the buffer.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Buffer) -> R) -> Result<R> {
        let mut buffer = self.lock()?;
        Ok(f(&mut buffer))
    }

    /// Runs `f` with the buffer locked, without mutating it.
    pub fn with<R>(&self, f: impl FnOnce(&Buffer) -> R) -> Result<R> {
        let buffer = self.lock()?;
        Ok(f(&buffer))
    }

    pub fn mark_dirty(&self) -> Result<()> {
        self.with_mut(Buffer::mark_dirty)
    }

    /// Returns a snapshot of the viewport if anything changed since the last
    /// call, clearing the dirty flag. Returns `None` when nothing changed.
    pub fn take_view_if_dirty(&self) -> Result<Option<GridView>> {
        let mut buffer = self.lock()?;
        if !buffer.is_dirty() {
            return Ok(None);
        }
        let view = buffer.view();
        buffer.clear_dirty();
        trace!("SharedBuffer: took snapshot, dirty flag cleared");
        Ok(Some(view))
    }
}
