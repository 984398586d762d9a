//! Socket configuration options
//!
//! Everything a socket needs to know about its own behaviour is passed in
//! explicitly through [`SocketOptions`]; there is no process-wide state.

use std::borrow::Cow;
use std::time::Duration;

/// Socket configuration options.
///
/// # Examples
///
/// ```
/// use wsmq_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_debug_logging(true)
///     .with_reconnect_backoff(Duration::from_millis(500));
/// assert_eq!(opts.reconnect_threshold, 10);
/// ```
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Verbose lifecycle diagnostics
    ///
    /// When set, connection attempts, establishment, closures and frame
    /// traffic are logged at `debug` level for this socket.
    /// - Default: false
    pub debug_logging: bool,

    /// Immediate reconnect budget
    ///
    /// Number of consecutive failed connection attempts that are retried
    /// immediately. Past this count every retry waits `reconnect_backoff`.
    /// The counter resets once a connection is established.
    /// - Default: 10
    pub reconnect_threshold: u32,

    /// Delay between retries once `reconnect_threshold` is exceeded
    ///
    /// Fixed, not exponential: a peer that stays unreachable is retried at
    /// this pace forever.
    /// - Default: 2000ms
    pub reconnect_backoff: Duration,

    /// Close code sent to the transport on an explicit close
    /// - Default: 1000 (normal closure)
    pub close_code: u16,

    /// Close reason sent to the transport on an explicit close
    pub close_reason: Cow<'static, str>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            debug_logging: false,
            reconnect_threshold: 10,
            reconnect_backoff: Duration::from_millis(2000),
            close_code: 1000,
            close_reason: Cow::Borrowed("socket closed"),
        }
    }
}

impl SocketOptions {
    /// Create new socket options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable verbose lifecycle logging.
    #[must_use]
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Set how many failed attempts are retried without delay.
    #[must_use]
    pub fn with_reconnect_threshold(mut self, attempts: u32) -> Self {
        self.reconnect_threshold = attempts;
        self
    }

    /// Set the delay used once the immediate retry budget is spent.
    #[must_use]
    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Set the code and reason reported to the transport on close.
    #[must_use]
    pub fn with_close(mut self, code: u16, reason: impl Into<Cow<'static, str>>) -> Self {
        self.close_code = code;
        self.close_reason = reason.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SocketOptions::new();
        assert!(!opts.debug_logging);
        assert_eq!(opts.reconnect_threshold, 10);
        assert_eq!(opts.reconnect_backoff, Duration::from_millis(2000));
        assert_eq!(opts.close_code, 1000);
    }

    #[test]
    fn test_builder() {
        let opts = SocketOptions::default()
            .with_debug_logging(true)
            .with_reconnect_threshold(3)
            .with_reconnect_backoff(Duration::from_millis(50))
            .with_close(4000, "bye");

        assert!(opts.debug_logging);
        assert_eq!(opts.reconnect_threshold, 3);
        assert_eq!(opts.reconnect_backoff, Duration::from_millis(50));
        assert_eq!(opts.close_code, 4000);
        assert_eq!(opts.close_reason, "bye");
    }
}
