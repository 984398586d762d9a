//! wsmq Error Types
//!
//! Every fallible operation in the workspace reports one of these.

use std::io;
use thiserror::Error;

/// Main error type for wsmq operations
#[derive(Error, Debug)]
pub enum WsmqError {
    /// Send/receive attempted with zero active endpoints
    #[error("Not connected: no active endpoints")]
    NotConnected,

    /// Operation not available on this socket kind
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Disconnect requested for an address that was never connected
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Inbound transport payload could not be parsed
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Integer or float field width not supported by the codec
    #[error("Invalid field width: {width} (expected one of {expected:?})")]
    InvalidFieldWidth {
        width: usize,
        expected: &'static [usize],
    },

    /// Integer does not fit the requested width
    #[error("Value {value} does not fit in {width} byte(s)")]
    ValueOutOfRange { value: i128, width: usize },

    /// Frame holds fewer bytes than the decoded field needs
    #[error("Frame too short: need {needed} byte(s), have {actual}")]
    FrameTooShort { needed: usize, actual: usize },

    /// Frame index outside the message
    #[error("No frame at index {index} (message has {len})")]
    NoSuchFrame { index: usize, len: usize },

    /// Transport write failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for wsmq operations
pub type Result<T> = std::result::Result<T, WsmqError>;

impl WsmqError {
    /// Create an invalid payload error with a message
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Check if this error reflects missing connectivity rather than misuse.
    ///
    /// Connectivity errors clear up on their own once an endpoint
    /// (re)connects; everything else is a caller mistake or bad data.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::NotConnected => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}
