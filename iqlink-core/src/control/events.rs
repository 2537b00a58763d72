//! Status messages carried over the JSON control channel.
//!
//! | Message | When |
//! |---------|------|
//! | `BridgeStatusEvent` | every bridge state transition (broadcast) |
//! | `BridgeStatus` | on request, as a snapshot |

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Bridge state
// ---------------------------------------------------------------------------

/// Lifecycle state of a `StreamBridge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeState {
    /// No stream attached.
    Detached,
    /// Stream attached, no subscriber yet. Samples are not delivered.
    Attached,
    /// Subscriber callback bound; samples flow.
    Delivering,
}

/// Broadcast on every bridge state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatusEvent {
    pub state: BridgeState,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of a bridge and its delivery counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    pub attached: bool,
    pub delivering: bool,
    /// Blocks forwarded to a subscriber.
    pub buffers_delivered: usize,
    /// Samples forwarded to a subscriber.
    pub samples_delivered: usize,
    /// Subscriber invocations that panicked and were contained.
    pub callback_panics: usize,
}

impl BridgeStatus {
    pub fn state(&self) -> BridgeState {
        match (self.attached, self.delivering) {
            (_, true) => BridgeState::Delivering,
            (true, false) => BridgeState::Attached,
            (false, false) => BridgeState::Detached,
        }
    }
}
