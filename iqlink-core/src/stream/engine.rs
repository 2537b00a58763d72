//! `DspStream` — in-process engine stream with a single handler slot.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use super::{SampleStream, StreamHandler};

/// A stream of `T` blocks owned by the engine.
///
/// Share it as `Arc<DspStream<T>>`: the engine keeps the owning `Arc`,
/// consumers keep whatever reference their contract allows.
pub struct DspStream<T> {
    handler: RwLock<Option<StreamHandler<T>>>,
    blocks_written: AtomicUsize,
    blocks_unhandled: AtomicUsize,
}

impl<T> DspStream<T> {
    pub fn new() -> Self {
        Self {
            handler: RwLock::new(None),
            blocks_written: AtomicUsize::new(0),
            blocks_unhandled: AtomicUsize::new(0),
        }
    }

    /// Deliver one block to the bound handler, synchronously, on the
    /// calling thread.
    ///
    /// Returns `false` when no handler is bound and the block was discarded.
    /// The handler is cloned out of the slot before it runs, so a concurrent
    /// bind/unbind never waits on a slow handler.
    pub fn write(&self, block: &[T]) -> bool {
        self.blocks_written.fetch_add(1, Ordering::Relaxed);
        let handler = self.handler.read().clone();
        match handler {
            Some(handler) => {
                handler(block);
                true
            }
            None => {
                self.blocks_unhandled.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Whether a handler is currently bound.
    pub fn has_handler(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Total blocks passed to `write`, handled or not.
    pub fn blocks_written(&self) -> usize {
        self.blocks_written.load(Ordering::Relaxed)
    }

    /// Blocks discarded because nothing was bound.
    pub fn blocks_unhandled(&self) -> usize {
        self.blocks_unhandled.load(Ordering::Relaxed)
    }
}

impl<T> Default for DspStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for DspStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DspStream")
            .field("has_handler", &self.has_handler())
            .field("blocks_written", &self.blocks_written())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> SampleStream<T> for DspStream<T> {
    fn bind_handler(&self, handler: StreamHandler<T>) {
        let replaced = self.handler.write().replace(handler).is_some();
        debug!(replaced, "stream handler bound");
    }

    fn unbind_handler(&self) {
        if self.handler.write().take().is_some() {
            debug!("stream handler unbound");
        }
    }
}
