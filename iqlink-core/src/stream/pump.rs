//! `StreamPump` — engine delivery thread feeding a [`DspStream`].
//!
//! ```text
//! producer code → PumpWriter → SPSC ring → pump thread → DspStream::write → handler
//! ```
//!
//! The writer side is lock-free and allocation-free, so it can sit inside a
//! device callback. The pump thread owns a single pre-allocated block buffer
//! and never allocates after start-up.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::DspStream;
use crate::error::{BridgeError, Result};
use crate::json;

const MAX_BLOCK_SIZE: usize = 1 << 16;
const MAX_IDLE_SLEEP_MS: u64 = 100;

/// Pump tuning, loadable from the JSON control channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct PumpConfig {
    /// Maximum samples per `write` call. Default: 1024.
    pub block_size: usize,
    /// Ring capacity in samples. Default: 65536.
    pub ring_capacity: usize,
    /// Sleep when the ring is empty, in milliseconds. Default: 2.
    pub idle_sleep_ms: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            ring_capacity: 1 << 16,
            idle_sleep_ms: 2,
        }
    }
}

impl PumpConfig {
    /// Reject values that cannot be clamped into something meaningful.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(BridgeError::Config("blockSize must be non-zero".into()));
        }
        if self.ring_capacity == 0 {
            return Err(BridgeError::Config("ringCapacity must be non-zero".into()));
        }
        Ok(())
    }

    pub fn normalize(&mut self) {
        self.block_size = self.block_size.clamp(1, MAX_BLOCK_SIZE);
        self.ring_capacity = self.ring_capacity.max(self.block_size);
        self.idle_sleep_ms = self.idle_sleep_ms.min(MAX_IDLE_SLEEP_MS);
    }

    /// Decode, validate and normalize a config document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: PumpConfig = json::from_json_text(text)?;
        config.validate()?;
        config.normalize();
        Ok(config)
    }
}

/// Shared pump counters.
#[derive(Debug, Default)]
pub struct PumpDiagnostics {
    pub blocks_pumped: AtomicUsize,
    pub samples_pumped: AtomicUsize,
    pub samples_dropped: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpSnapshot {
    pub blocks_pumped: usize,
    pub samples_pumped: usize,
    pub samples_dropped: usize,
}

impl PumpDiagnostics {
    pub fn snapshot(&self) -> PumpSnapshot {
        PumpSnapshot {
            blocks_pumped: self.blocks_pumped.load(Ordering::Relaxed),
            samples_pumped: self.samples_pumped.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Producer half handed to whatever generates samples.
pub struct PumpWriter<T> {
    producer: HeapProd<T>,
    diagnostics: Arc<PumpDiagnostics>,
}

impl<T: Copy> PumpWriter<T> {
    /// Queue samples for delivery. Returns how many fit; the rest are
    /// dropped and counted.
    pub fn push(&mut self, samples: &[T]) -> usize {
        let written = self.producer.push_slice(samples);
        if written < samples.len() {
            let dropped = samples.len() - written;
            self.diagnostics
                .samples_dropped
                .fetch_add(dropped, Ordering::Relaxed);
            warn!("pump ring full: dropped {dropped} samples");
        }
        written
    }

    /// Free space left in the ring, in samples.
    pub fn vacant(&self) -> usize {
        self.producer.vacant_len()
    }
}

/// Handle to a running pump thread. Dropping it stops the thread.
pub struct StreamPump {
    running: Arc<AtomicBool>,
    diagnostics: Arc<PumpDiagnostics>,
    thread: Option<JoinHandle<()>>,
}

impl StreamPump {
    /// Spawn a pump that drains into `stream`.
    ///
    /// # Errors
    /// `BridgeError::Config` for an invalid config, `BridgeError::Io` if the
    /// thread cannot be spawned.
    pub fn start<T>(
        stream: Arc<DspStream<T>>,
        mut config: PumpConfig,
    ) -> Result<(Self, PumpWriter<T>)>
    where
        T: Copy + Default + Send + Sync + 'static,
    {
        config.validate()?;
        config.normalize();

        let (producer, consumer) = HeapRb::<T>::new(config.ring_capacity).split();
        let running = Arc::new(AtomicBool::new(true));
        let diagnostics = Arc::new(PumpDiagnostics::default());

        let ctx = PumpContext {
            stream,
            consumer,
            running: Arc::clone(&running),
            diagnostics: Arc::clone(&diagnostics),
            block_size: config.block_size,
            idle_sleep: Duration::from_millis(config.idle_sleep_ms),
        };

        let thread = thread::Builder::new()
            .name("iqlink-pump".into())
            .spawn(move || run(ctx))?;

        info!(
            block_size = config.block_size,
            ring_capacity = config.ring_capacity,
            "stream pump started"
        );

        let writer = PumpWriter {
            producer,
            diagnostics: Arc::clone(&diagnostics),
        };
        Ok((
            Self {
                running,
                diagnostics,
                thread: Some(thread),
            },
            writer,
        ))
    }

    /// `false` once stopped, or if the thread has exited on its own (a
    /// handler panic unwinds it).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn diagnostics(&self) -> PumpSnapshot {
        self.diagnostics.snapshot()
    }

    /// Signal the thread to exit and wait for it. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("stream pump thread panicked");
            }
            debug!("stream pump stopped");
        }
    }
}

impl Drop for StreamPump {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PumpContext<T> {
    stream: Arc<DspStream<T>>,
    consumer: HeapCons<T>,
    running: Arc<AtomicBool>,
    diagnostics: Arc<PumpDiagnostics>,
    block_size: usize,
    idle_sleep: Duration,
}

fn run<T: Copy + Default>(mut ctx: PumpContext<T>) {
    let mut block = vec![T::default(); ctx.block_size];

    while ctx.running.load(Ordering::Acquire) {
        if ctx.consumer.is_empty() {
            thread::sleep(ctx.idle_sleep);
            continue;
        }

        let n = ctx.consumer.pop_slice(&mut block);
        ctx.stream.write(&block[..n]);
        ctx.diagnostics.blocks_pumped.fetch_add(1, Ordering::Relaxed);
        ctx.diagnostics.samples_pumped.fetch_add(n, Ordering::Relaxed);
    }
}
