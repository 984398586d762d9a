//! Reconnection policy: a burst of immediate retries, then a fixed backoff.
//!
//! Every connection attempt is recorded. While the number of consecutive
//! attempts stays within the threshold a dropped connection is reopened
//! right away; after that each reopen waits the configured backoff. The
//! policy never gives up.

use std::time::Duration;
use crate::options::SocketOptions;

/// Reconnection state tracker for one endpoint.
///
/// # Example
///
/// ```rust
/// use wsmq_core::reconnect::ReconnectState;
/// use wsmq_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let options = SocketOptions::default()
///     .with_reconnect_threshold(2)
///     .with_reconnect_backoff(Duration::from_millis(100));
///
/// let mut reconnect = ReconnectState::new(&options);
///
/// reconnect.record_attempt();
/// assert_eq!(reconnect.next_delay(), None);
/// reconnect.record_attempt();
/// assert_eq!(reconnect.next_delay(), None);
///
/// // Budget spent: wait before the next attempt
/// reconnect.record_attempt();
/// assert_eq!(reconnect.next_delay(), Some(Duration::from_millis(100)));
///
/// // Reset on successful connection
/// reconnect.reset();
/// assert_eq!(reconnect.attempt(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectState {
    /// Attempts allowed to retry without delay
    threshold: u32,
    /// Delay once the threshold is exceeded
    backoff: Duration,
    /// Consecutive attempts since the last successful connection
    attempt: u32,
}

impl ReconnectState {
    /// Create a new reconnection state tracker from socket options.
    pub const fn new(options: &SocketOptions) -> Self {
        Self {
            threshold: options.reconnect_threshold,
            backoff: options.reconnect_backoff,
            attempt: 0,
        }
    }

    /// Record that a connection attempt has been started.
    pub fn record_attempt(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }

    /// Delay before the next attempt after the current one failed.
    ///
    /// `None` means reconnect immediately.
    #[must_use]
    pub const fn next_delay(&self) -> Option<Duration> {
        if self.attempt > self.threshold {
            Some(self.backoff)
        } else {
            None
        }
    }

    /// Reset the attempt counter after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Get the current attempt number.
    #[inline]
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Get the immediate retry budget.
    #[inline]
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Get the fixed backoff delay.
    #[inline]
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        self.backoff
    }
}
