//! Engine-side sample streams.
//!
//! The DSP engine owns its streams and drives them from its own processing
//! thread. A stream exposes exactly one handler slot: whoever binds last
//! receives every block written afterwards, until `unbind_handler`.
//!
//! [`SampleStream`] is the seam the bridge binds through. [`DspStream`] is
//! the in-process implementation, and [`StreamPump`] is a delivery thread
//! that feeds one from a lock-free ring.

pub mod engine;
pub mod pump;

pub use engine::DspStream;
pub use pump::{PumpConfig, PumpSnapshot, PumpWriter, StreamPump};

use std::sync::Arc;

/// Low-level handler invoked by the stream for every delivered block.
///
/// Runs on the engine's delivery thread. The slice is only valid for the
/// duration of the call.
pub type StreamHandler<T> = Arc<dyn Fn(&[T]) + Send + Sync + 'static>;

/// Handler-binding interface of an engine-owned stream.
pub trait SampleStream<T>: Send + Sync + 'static {
    /// Install `handler`, replacing any handler already bound.
    fn bind_handler(&self, handler: StreamHandler<T>);

    /// Remove the bound handler. No-op when none is bound.
    fn unbind_handler(&self);
}
