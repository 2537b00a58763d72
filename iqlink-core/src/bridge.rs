//! `StreamBridge` — single-subscriber adapter over an engine stream.
//!
//! ## Lifecycle
//!
//! ```text
//! StreamBridge::new()                         state = Detached
//!     └─► connect(Some(&stream))              state = Attached   (nothing bound yet)
//!         └─► set_callback(cb)                state = Delivering (trampoline bound)
//!             └─► set_callback(cb2)           cb replaced, no rebind
//!             └─► disconnect() / drop         handler unbound, state = Detached
//! ```
//!
//! ## Delivery path
//!
//! The handler bound to the stream is a closure holding a `Weak` to the
//! callback slot of the current connection. It runs on the engine thread, so it must not
//! allocate or copy: it locks the slot, re-checks that a subscriber is
//! still present, and forwards the borrowed slice.
//!
//! Control operations take the same lock to swap or clear the subscriber.
//! Once `disconnect` returns, no subscriber invocation is in flight and
//! none will start. A subscriber must therefore never call back into the
//! bridge's control methods from inside its callback.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Weak,
};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::control::events::{BridgeState, BridgeStatus, BridgeStatusEvent};
use crate::error::{BridgeError, Result};
use crate::sample::ComplexSample;
use crate::stream::{SampleStream, StreamHandler};

/// Broadcast channel capacity for status events.
const STATUS_CAP: usize = 64;

/// Subscriber callback. Receives one borrowed block per engine delivery.
pub type SampleCallback = Box<dyn FnMut(&[ComplexSample]) + Send + 'static>;

/// Delivery counters. Outlive individual connections.
#[derive(Debug, Default)]
struct DeliveryCounters {
    buffers: AtomicUsize,
    samples: AtomicUsize,
    panics: AtomicUsize,
}

/// Subscriber slot for one connection, shared between the bridge (control
/// thread) and the trampoline bound for that connection (engine thread).
///
/// Every `disconnect` retires the slot and installs a fresh one, so a
/// handler clone still held by a detached stream can never reach a later
/// subscriber.
#[derive(Default)]
struct Subscription {
    callback: Mutex<Option<SampleCallback>>,
}

impl Subscription {
    fn forward(&self, block: &[ComplexSample], counters: &DeliveryCounters) {
        let mut slot = self.callback.lock();
        let Some(callback) = slot.as_mut() else {
            return;
        };

        // A subscriber panic must not unwind into the engine thread.
        match panic::catch_unwind(AssertUnwindSafe(|| callback(block))) {
            Ok(()) => {
                counters.buffers.fetch_add(1, Ordering::Relaxed);
                counters.samples.fetch_add(block.len(), Ordering::Relaxed);
            }
            Err(payload) => {
                counters.panics.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "subscriber callback panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return msg;
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.as_str();
    }
    "non-string panic payload"
}

/// Adapts one engine stream of [`ComplexSample`] blocks to a single
/// subscriber callback.
///
/// The bridge never owns the stream: it keeps a `Weak` reference, so the
/// engine stays in charge of the stream's lifetime.
pub struct StreamBridge<S: SampleStream<ComplexSample>> {
    stream: Option<Weak<S>>,
    /// Slot for the current connection only.
    subscription: Arc<Subscription>,
    counters: Arc<DeliveryCounters>,
    /// `true` while our trampoline is bound to `stream`. A subscriber is
    /// always installed while bound.
    bound: bool,
    status_tx: broadcast::Sender<BridgeStatusEvent>,
}

impl<S: SampleStream<ComplexSample>> StreamBridge<S> {
    pub fn new() -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CAP);
        Self {
            stream: None,
            subscription: Arc::new(Subscription::default()),
            counters: Arc::new(DeliveryCounters::default()),
            bound: false,
            status_tx,
        }
    }

    /// Attach to `stream`, fully detaching from any previous one first.
    ///
    /// Delivery does not start until [`set_callback`](Self::set_callback).
    ///
    /// # Errors
    /// `BridgeError::NullStream` when `stream` is `None`; the current
    /// attachment is left untouched.
    pub fn connect(&mut self, stream: Option<&Arc<S>>) -> Result<()> {
        let Some(stream) = stream else {
            warn!("connect called without a stream");
            return Err(BridgeError::NullStream);
        };

        self.disconnect();
        self.stream = Some(Arc::downgrade(stream));
        info!("bridge attached to stream");
        self.emit(BridgeState::Attached, None);
        Ok(())
    }

    /// Install `callback` as the subscriber and start delivery.
    ///
    /// Replaces any existing subscriber without unbinding from the stream.
    ///
    /// # Errors
    /// `BridgeError::NotAttached` if no stream is attached, or the engine has
    /// already dropped it.
    pub fn set_callback<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&[ComplexSample]) + Send + 'static,
    {
        let Some(stream) = self.stream() else {
            if self.stream.take().is_some() {
                debug!("attached stream was dropped by the engine");
                self.bound = false;
                self.retire_subscription();
                self.emit(BridgeState::Detached, Some("stream dropped".into()));
            }
            return Err(BridgeError::NotAttached);
        };

        let replaced = self
            .subscription
            .callback
            .lock()
            .replace(Box::new(callback))
            .is_some();

        if !self.bound {
            stream.bind_handler(self.trampoline());
            self.bound = true;
            info!("bridge delivering");
            self.emit(BridgeState::Delivering, None);
        } else if replaced {
            debug!("subscriber callback replaced");
        }
        Ok(())
    }

    /// Stop delivery and detach. Idempotent; safe when never connected.
    pub fn disconnect(&mut self) {
        if self.bound {
            if let Some(stream) = self.stream() {
                stream.unbind_handler();
            }
            self.bound = false;
        }

        self.retire_subscription();

        if self.stream.take().is_some() {
            info!("bridge disconnected");
            self.emit(BridgeState::Detached, None);
        }
    }

    /// The attached stream, for native code that wants to bypass the bridge.
    pub fn stream(&self) -> Option<Arc<S>> {
        self.stream.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        self.stream().is_some()
    }

    pub fn is_delivering(&self) -> bool {
        self.bound
    }

    /// Snapshot of attachment state and delivery counters.
    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            attached: self.is_attached(),
            delivering: self.is_delivering(),
            buffers_delivered: self.counters.buffers.load(Ordering::Relaxed),
            samples_delivered: self.counters.samples.load(Ordering::Relaxed),
            callback_panics: self.counters.panics.load(Ordering::Relaxed),
        }
    }

    /// Subscribe to state transition events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<BridgeStatusEvent> {
        self.status_tx.subscribe()
    }

    fn trampoline(&self) -> StreamHandler<ComplexSample> {
        let subscription = Arc::downgrade(&self.subscription);
        let counters = Arc::clone(&self.counters);
        Arc::new(move |block: &[ComplexSample]| {
            if let Some(subscription) = subscription.upgrade() {
                subscription.forward(block, &counters);
            }
        })
    }

    /// Clear the current slot and start a new one for the next connection.
    fn retire_subscription(&mut self) {
        // Waits for an in-flight forward to finish.
        self.subscription.callback.lock().take();
        self.subscription = Arc::new(Subscription::default());
    }

    fn emit(&self, state: BridgeState, detail: Option<String>) {
        let _ = self.status_tx.send(BridgeStatusEvent { state, detail });
    }
}

impl<S: SampleStream<ComplexSample>> Default for StreamBridge<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SampleStream<ComplexSample>> Drop for StreamBridge<S> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<S: SampleStream<ComplexSample>> std::fmt::Debug for StreamBridge<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBridge")
            .field("attached", &self.is_attached())
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::DspStream;

    type Bridge = StreamBridge<DspStream<ComplexSample>>;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> impl FnMut(&[ComplexSample]) + Send {
        let counter = Arc::clone(counter);
        move |block: &[ComplexSample]| {
            counter.fetch_add(block.len(), Ordering::SeqCst);
        }
    }

    #[test]
    fn set_callback_without_stream_fails() {
        let mut bridge = Bridge::new();
        let err = bridge.set_callback(|_: &[ComplexSample]| {}).unwrap_err();
        assert!(matches!(err, BridgeError::NotAttached));
    }

    #[test]
    fn connect_alone_does_not_deliver() {
        let stream = Arc::new(DspStream::new());
        let mut bridge = Bridge::new();
        bridge.connect(Some(&stream)).unwrap();

        assert!(bridge.is_attached());
        assert!(!bridge.is_delivering());
        assert!(!stream.has_handler());
        assert!(!stream.write(&[ComplexSample::default()]));
    }

    #[test]
    fn replacing_callback_keeps_single_binding() {
        let stream = Arc::new(DspStream::new());
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut bridge = Bridge::new();
        bridge.connect(Some(&stream)).unwrap();
        bridge.set_callback(counting_callback(&first)).unwrap();
        stream.write(&[ComplexSample::new(1.0, 0.0)]);
        bridge.set_callback(counting_callback(&second)).unwrap();
        stream.write(&[ComplexSample::new(2.0, 0.0); 2]);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
        assert_eq!(bridge.status().buffers_delivered, 2);
        assert_eq!(bridge.status().samples_delivered, 3);
    }

    #[test]
    fn callback_receives_exact_block() {
        let stream = Arc::new(DspStream::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bridge = Bridge::new();
        bridge.connect(Some(&stream)).unwrap();
        {
            let seen = Arc::clone(&seen);
            bridge
                .set_callback(move |block: &[ComplexSample]| seen.lock().extend_from_slice(block))
                .unwrap();
        }

        let block = [ComplexSample::new(1.0, 2.0), ComplexSample::new(3.0, 4.0)];
        assert!(stream.write(&block));
        assert_eq!(seen.lock().as_slice(), &block);
    }

    #[test]
    fn drop_unbinds_from_stream() {
        let stream = Arc::new(DspStream::new());
        {
            let mut bridge = Bridge::new();
            bridge.connect(Some(&stream)).unwrap();
            bridge.set_callback(|_: &[ComplexSample]| {}).unwrap();
            assert!(stream.has_handler());
        }
        assert!(!stream.has_handler());
    }

    #[test]
    fn bridge_does_not_keep_stream_alive() {
        let stream = Arc::new(DspStream::new());
        let mut bridge = Bridge::new();
        bridge.connect(Some(&stream)).unwrap();
        drop(stream);

        assert!(bridge.stream().is_none());
        let err = bridge.set_callback(|_: &[ComplexSample]| {}).unwrap_err();
        assert!(matches!(err, BridgeError::NotAttached));
    }

    #[test]
    fn panicking_subscriber_is_contained() {
        let stream = Arc::new(DspStream::new());
        let mut bridge = Bridge::new();
        bridge.connect(Some(&stream)).unwrap();
        bridge
            .set_callback(|_: &[ComplexSample]| panic!("subscriber bug"))
            .unwrap();

        assert!(stream.write(&[ComplexSample::default()]));
        assert!(stream.write(&[ComplexSample::default()]));

        let status = bridge.status();
        assert_eq!(status.callback_panics, 2);
        assert_eq!(status.buffers_delivered, 0);
        assert!(status.delivering);
    }

    #[test]
    fn status_events_follow_transitions() {
        let stream = Arc::new(DspStream::new());
        let mut bridge = Bridge::new();
        let mut rx = bridge.subscribe_status();

        bridge.connect(Some(&stream)).unwrap();
        bridge.set_callback(|_: &[ComplexSample]| {}).unwrap();
        bridge.disconnect();
        bridge.disconnect();

        let states: Vec<BridgeState> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| event.state)
            .collect();
        assert_eq!(
            states,
            vec![
                BridgeState::Attached,
                BridgeState::Delivering,
                BridgeState::Detached
            ]
        );
    }

    #[test]
    fn status_does_not_wait_for_a_slow_subscriber() {
        use std::sync::mpsc;
        use std::time::Duration;

        let stream = Arc::new(DspStream::new());
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);

        let mut bridge = Bridge::new();
        bridge.connect(Some(&stream)).unwrap();
        bridge
            .set_callback(move |_: &[ComplexSample]| {
                let _ = entered_tx.send(());
                let _ = release_rx.lock().recv_timeout(Duration::from_secs(5));
            })
            .unwrap();

        let delivery = {
            let stream = Arc::clone(&stream);
            std::thread::spawn(move || stream.write(&[ComplexSample::default()]))
        };
        entered_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("subscriber never entered");

        // Subscriber is parked inside its callback on the delivery thread.
        let status = bridge.status();
        assert!(status.delivering);
        assert_eq!(status.buffers_delivered, 0);

        release_tx.send(()).unwrap();
        assert!(delivery.join().expect("delivery thread panicked"));
        assert_eq!(bridge.status().buffers_delivered, 1);
    }

    #[test]
    fn disconnect_when_never_connected_is_noop() {
        let mut bridge = Bridge::new();
        bridge.disconnect();
        bridge.disconnect();
        assert_eq!(bridge.status().state(), BridgeState::Detached);
    }
}
