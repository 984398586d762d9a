//! Round-robin load balancer
//!
//! Keeps the peers that can currently carry traffic, in attach order, and
//! hands outbound messages to them one after another. The balancer only
//! stores peer keys; writing is done by the caller-supplied closure so the
//! balancer stays independent of the transport.
//!
//! Activity is edge-triggered: `attach` reports `true` only when the set
//! goes from empty to non-empty, so the owner fires its "ready to send"
//! notification once per activation.

use tracing::trace;

use crate::error::Result;
use crate::message::Message;

/// Round-robin registry of active peers.
#[derive(Debug)]
pub struct LoadBalancer<K> {
    // rotation list, attach order
    peers: Vec<K>,
    cursor: usize,
    is_active: bool,
}

impl<K> Default for LoadBalancer<K> {
    fn default() -> Self {
        Self {
            peers: Vec::new(),
            cursor: 0,
            is_active: false,
        }
    }
}

impl<K: PartialEq + std::fmt::Debug> LoadBalancer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to the rotation.
    ///
    /// Returns `true` when this attach made the balancer active again.
    pub fn attach(&mut self, peer: K) -> bool {
        if self.peers.contains(&peer) {
            return false;
        }

        trace!(?peer, "[LB] attach");
        self.peers.push(peer);

        if self.is_active {
            false
        } else {
            self.is_active = true;
            true
        }
    }

    /// Remove a peer from the rotation.
    pub fn terminate(&mut self, peer: &K) {
        let Some(pos) = self.peers.iter().position(|p| p == peer) else {
            return;
        };

        trace!(?peer, "[LB] terminate");
        if self.cursor == self.peers.len() - 1 {
            self.cursor = 0;
        }
        self.peers.remove(pos);

        // The cursor keeps its index: removing a peer before it skips one turn
        if self.cursor >= self.peers.len() {
            self.cursor = 0;
        }
        if self.peers.is_empty() {
            self.is_active = false;
        }
    }

    /// Send `message` through the peer at the cursor and advance.
    ///
    /// Returns `Ok(false)` without calling `write` when no peer is attached.
    pub fn send<F>(&mut self, message: &Message, write: F) -> Result<bool>
    where
        F: FnOnce(&K, &Message) -> Result<()>,
    {
        if self.peers.is_empty() {
            self.is_active = false;
            return Ok(false);
        }

        let peer = &self.peers[self.cursor];
        self.cursor = (self.cursor + 1) % self.peers.len();
        write(peer, message)?;
        Ok(true)
    }

    /// True iff at least one peer is attached.
    #[must_use]
    pub fn has_outbound_capacity(&self) -> bool {
        !self.peers.is_empty()
    }

    /// Peers in rotation order.
    #[must_use]
    pub fn peers(&self) -> &[K] {
        &self.peers
    }

    /// Number of attached peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
