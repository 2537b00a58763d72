//! # iqlink-core
//!
//! Boundary layer between a host and a native IQ signal-processing engine.
//!
//! ## Architecture
//!
//! ```text
//! engine thread ─► StreamPump ─► DspStream::write ─► trampoline ─► subscriber(&[ComplexSample])
//!                                                    (StreamBridge)        │
//!                                                                          ▼
//!                                                        json::{is_valid_json, pretty_print}
//! ```
//!
//! The delivery path is zero-copy and zero-alloc. Control traffic crosses
//! the boundary as JSON text only. `kernels` compiles against either the
//! no-op stub backend or the real `libvolk` backend (`volk` feature).

#![cfg_attr(not(feature = "volk"), forbid(unsafe_code))]
#![cfg_attr(feature = "volk", deny(unsafe_code))]
#![warn(clippy::all)]

pub mod bridge;
pub mod control;
pub mod error;
pub mod json;
pub mod kernels;
pub mod sample;
pub mod stream;

// Convenience re-exports for downstream crates
pub use bridge::{SampleCallback, StreamBridge};
pub use control::events::{BridgeState, BridgeStatus, BridgeStatusEvent};
pub use error::{BridgeError, SerializationError, SerializationOp};
pub use json::{is_valid_json, pretty_print};
pub use sample::{complex_to_float_arrays, ComplexSample};
pub use stream::{DspStream, PumpConfig, SampleStream, StreamPump};
