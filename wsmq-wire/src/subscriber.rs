//! Topic subscriber pattern (SUB semantics).
//!
//! Receive-only. Subscriptions are kept locally and announced to every
//! active endpoint; an endpoint that (re)activates gets the full set
//! replayed in insertion order before anything else. Filtering happens on
//! the publisher, so inbound messages are delivered as-is.

use bytes::Bytes;
use tracing::{trace, warn};
use wsmq_core::error::Result;
use wsmq_core::subscription::{SubscriptionEvent, SubscriptionSet};

use crate::endpoint::EndpointId;
use crate::socket::Peers;
use crate::transport::Transport;

#[derive(Debug, Default)]
pub(crate) struct Subscriber {
    subscriptions: SubscriptionSet,
    attached: Vec<EndpointId>,
    is_active: bool,
}

impl Subscriber {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    pub(crate) fn active_endpoints(&self) -> &[EndpointId] {
        &self.attached
    }

    pub(crate) fn subscribe<T: Transport>(
        &mut self,
        topic: Bytes,
        peers: &mut Peers<'_, T>,
    ) -> Result<()> {
        trace!("[SUB] Adding subscription: {:?}", topic);
        if !self.subscriptions.subscribe(topic.clone()) {
            trace!("[SUB] Already subscribed");
            return Ok(());
        }
        self.broadcast(&SubscriptionEvent::Subscribe(topic), peers);
        Ok(())
    }

    pub(crate) fn unsubscribe<T: Transport>(
        &mut self,
        topic: &[u8],
        peers: &mut Peers<'_, T>,
    ) -> Result<()> {
        trace!("[SUB] Removing subscription: {:?}", topic);
        if !self.subscriptions.unsubscribe(topic) {
            trace!("[SUB] Not subscribed");
            return Ok(());
        }
        let event = SubscriptionEvent::Unsubscribe(Bytes::copy_from_slice(topic));
        self.broadcast(&event, peers);
        Ok(())
    }

    /// Replay every subscription to `id`.
    ///
    /// Returns `true` on the inactive to active edge.
    pub(crate) fn on_activated<T: Transport>(
        &mut self,
        id: EndpointId,
        peers: &mut Peers<'_, T>,
    ) -> bool {
        if !self.attached.contains(&id) {
            self.attached.push(id);
        }

        for topic in self.subscriptions.iter() {
            let control = SubscriptionEvent::Subscribe(topic.clone()).to_message();
            if let Err(e) = peers.write(id, &control) {
                warn!("[SUB] Failed to replay subscription to {}: {}", id, e);
            }
        }

        if self.is_active {
            false
        } else {
            self.is_active = true;
            true
        }
    }

    pub(crate) fn on_deactivated(&mut self, id: EndpointId) {
        self.attached.retain(|attached| *attached != id);
        if self.attached.is_empty() {
            self.is_active = false;
        }
    }

    // An endpoint that misses the frame gets the whole set replayed when it
    // reactivates.
    fn broadcast<T: Transport>(&self, event: &SubscriptionEvent, peers: &mut Peers<'_, T>) {
        let control = event.to_message();
        for id in &self.attached {
            if let Err(e) = peers.write(*id, &control) {
                warn!("[SUB] Failed to send subscription change to {}: {}", id, e);
            }
        }
    }
}
