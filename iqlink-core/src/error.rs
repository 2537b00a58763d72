use std::fmt;

use thiserror::Error;

/// All errors produced by iqlink-core.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("cannot connect to a null stream")]
    NullStream,

    #[error("no stream attached")]
    NotAttached,

    #[error("output buffer too small: need {needed} samples, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Which gateway operation failed. Selects the message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Parse,
    Stringify,
    PrettyPrint,
}

impl fmt::Display for SerializationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SerializationOp::Parse => "parse",
            SerializationOp::Stringify => "stringify",
            SerializationOp::PrettyPrint => "pretty print",
        })
    }
}

/// The single error shape the JSON gateway hands across the boundary.
///
/// Renders as `Failed to <op> JSON: <parser message>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to {op} JSON: {message}")]
pub struct SerializationError {
    pub op: SerializationOp,
    pub message: String,
}

impl SerializationError {
    pub(crate) fn new(op: SerializationOp, source: serde_json::Error) -> Self {
        Self {
            op,
            message: source.to_string(),
        }
    }
}
