//! Request/reply client pattern (DEALER semantics).
//!
//! Outbound messages rotate across active endpoints. Inbound messages are
//! matched FIFO against outstanding `receive()` calls; whichever side is
//! ahead is queued. At most one of the two queues is non-empty at a time.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use tracing::{debug, trace, warn};
use wsmq_core::error::{Result, WsmqError};
use wsmq_core::load_balancer::LoadBalancer;
use wsmq_core::message::Message;

use crate::endpoint::EndpointId;
use crate::socket::{MessageHandler, Peers};
use crate::transport::Transport;

#[derive(Debug, Default)]
pub(crate) struct RoundRobin {
    balancer: LoadBalancer<EndpointId>,
    // inbound messages nobody asked for yet
    pending_responses: VecDeque<Message>,
    // receive() calls nobody answered yet
    pending_requests: VecDeque<oneshot::Sender<Message>>,
}

impl RoundRobin {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn has_outbound_capacity(&self) -> bool {
        self.balancer.has_outbound_capacity()
    }

    pub(crate) fn active_endpoints(&self) -> &[EndpointId] {
        self.balancer.peers()
    }

    /// Returns `true` when the socket just became able to send.
    pub(crate) fn on_activated(&mut self, id: EndpointId) -> bool {
        self.balancer.attach(id)
    }

    pub(crate) fn on_deactivated(&mut self, id: EndpointId) {
        self.balancer.terminate(&id);
        if self.balancer.has_outbound_capacity() {
            return;
        }

        if !self.pending_requests.is_empty() || !self.pending_responses.is_empty() {
            debug!(
                "[DEALER] No active endpoints left, dropping {} waiting receives and {} queued messages",
                self.pending_requests.len(),
                self.pending_responses.len()
            );
        }
        // dropping the senders fails the waiting futures with NotConnected
        self.pending_requests.clear();
        self.pending_responses.clear();
    }

    pub(crate) fn on_message(&mut self, message: Message, handler: Option<&mut MessageHandler>) {
        let has_handler = handler.is_some();
        if let Some(handler) = handler {
            handler(&message);
        }

        let mut message = message;
        while let Some(request) = self.pending_requests.pop_front() {
            match request.send(message) {
                Ok(()) => return,
                // the receive future was dropped; try the next one
                Err(returned) => message = returned,
            }
        }

        if has_handler {
            trace!("[DEALER] Message delivered to handler only");
        } else {
            trace!("[DEALER] Queueing {} frames", message.len());
            self.pending_responses.push_back(message);
        }
    }

    pub(crate) fn send<T: Transport>(
        &mut self,
        message: &Message,
        peers: &mut Peers<'_, T>,
    ) -> Result<bool> {
        trace!("[DEALER] Sending {} frames", message.len());
        // A failed write means the peer is gone and its close event is
        // queued; the endpoint deactivates and reconnects from there.
        self.balancer.send(message, |id, message| match peers.write(*id, message) {
            Err(WsmqError::Io(e)) => {
                warn!("[DEALER] Write to {} failed: {}", id, e);
                Ok(())
            }
            other => other,
        })
    }

    pub(crate) fn receive(&mut self) -> Result<Receive> {
        if let Some(message) = self.pending_responses.pop_front() {
            return Ok(Receive::ready(message));
        }
        if !self.balancer.has_outbound_capacity() {
            return Err(WsmqError::NotConnected);
        }

        self.pending_requests.retain(|tx| !tx.is_canceled());
        let (tx, rx) = oneshot::channel();
        self.pending_requests.push_back(tx);
        trace!("[DEALER] Waiting for message");
        Ok(Receive::pending(rx))
    }

    pub(crate) fn queued_messages(&self) -> usize {
        self.pending_responses.len()
    }

    pub(crate) fn waiting_receives(&self) -> usize {
        self.pending_requests.len()
    }
}

/// Future returned by [`Socket::receive`](crate::socket::Socket::receive).
///
/// Resolves with the next inbound message, or with
/// [`WsmqError::NotConnected`] if the socket loses all its active endpoints
/// first.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Receive {
    state: ReceiveState,
}

#[derive(Debug)]
enum ReceiveState {
    Ready(Option<Message>),
    Waiting(oneshot::Receiver<Message>),
}

impl Receive {
    fn ready(message: Message) -> Self {
        Self {
            state: ReceiveState::Ready(Some(message)),
        }
    }

    fn pending(rx: oneshot::Receiver<Message>) -> Self {
        Self {
            state: ReceiveState::Waiting(rx),
        }
    }
}

impl Future for Receive {
    type Output = Result<Message>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            ReceiveState::Ready(message) => Poll::Ready(message.take().ok_or(WsmqError::NotConnected)),
            ReceiveState::Waiting(rx) => Pin::new(rx)
                .poll(cx)
                .map(|result| result.map_err(|_canceled| WsmqError::NotConnected)),
        }
    }
}
