//! Socket event monitoring.
//!
//! Provides event streams for tracking endpoint lifecycle events like
//! connection attempts, establishment, drops and scheduled retries.

use std::fmt;
use std::time::Duration;

/// Endpoint lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// A connection attempt to the address was started.
    Connecting(String),

    /// The transport reported the connection as established.
    Connected(String),

    /// An established connection was lost.
    Disconnected(String),

    /// The retry budget is spent; the next attempt waits `delay`.
    ReconnectScheduled { address: String, delay: Duration },

    /// The endpoint was closed on request and will not reconnect.
    Closed(String),
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting(addr) => write!(f, "Connecting to {addr}"),
            Self::Connected(addr) => write!(f, "Connected to {addr}"),
            Self::Disconnected(addr) => write!(f, "Disconnected from {addr}"),
            Self::ReconnectScheduled { address, delay } => {
                write!(f, "Reconnecting to {address} in {delay:?}")
            }
            Self::Closed(addr) => write!(f, "Closed {addr}"),
        }
    }
}

/// Handle for receiving socket events.
///
/// This is a channel receiver that provides a stream of socket lifecycle events.
pub type SocketMonitor = flume::Receiver<SocketEvent>;

/// Internal sender for socket events.
///
/// This is exposed publicly to allow socket implementations to emit events.
pub type SocketEventSender = flume::Sender<SocketEvent>;

/// Creates a new monitoring channel pair.
#[must_use]
pub fn create_monitor() -> (SocketEventSender, SocketMonitor) {
    flume::unbounded()
}
