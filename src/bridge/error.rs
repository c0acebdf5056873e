//! Error types for bridge operations.

use thiserror::Error;

use crate::{handles::Handle, runtime::value::HostValue};

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The handle has no live entry.
    #[error("unknown handle: {0}")]
    UnknownHandle(Handle),

    /// A call completed with the error flag set; the payload is the thrown
    /// host value.
    #[error("call raised {0}")]
    Call(HostValue),

    #[error("{type_name} is not callable")]
    NotCallable { type_name: &'static str },

    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("index {index} is not a valid array index")]
    InvalidIndex { index: u32 },

    #[error("handle space exhausted (limit {limit})")]
    HandleSpaceExhausted { limit: u32 },

    #[error("invalid bridge configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// Returns the thrown value of a [`BridgeError::Call`].
    pub fn thrown_value(&self) -> Option<&HostValue> {
        match self {
            BridgeError::Call(value) => Some(value),
            _ => None,
        }
    }
}

/// Result type alias
pub type BridgeResult<T> = Result<T, BridgeError>;
