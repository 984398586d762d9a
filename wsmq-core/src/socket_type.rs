//! Socket kinds.
//!
//! The set is closed: a socket picks one kind at construction and every
//! kind-specific behaviour is an exhaustive `match` on it.

use std::fmt;

/// Delivery pattern of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketKind {
    /// Request/reply client: outbound messages are load-balanced across
    /// connected peers, replies are queued for `receive()`.
    RoundRobin,

    /// Topic subscriber: receive-only, tells peers which prefixes it wants.
    Subscribe,
}

impl SocketKind {
    /// Get the ZeroMQ name of the equivalent socket type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "DEALER",
            Self::Subscribe => "SUB",
        }
    }

    /// Check if this kind may call `send`.
    pub fn can_send(&self) -> bool {
        matches!(self, Self::RoundRobin)
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_kind_display() {
        assert_eq!(SocketKind::RoundRobin.to_string(), "DEALER");
        assert_eq!(SocketKind::Subscribe.to_string(), "SUB");
    }

    #[test]
    fn test_can_send() {
        assert!(SocketKind::RoundRobin.can_send());
        assert!(!SocketKind::Subscribe.can_send());
    }
}
