//! Socket: a set of endpoints plus one delivery pattern.
//!
//! The socket owns its transport and its endpoints. It never does I/O on its
//! own; whoever runs the event loop feeds transport events in through
//! [`Socket::handle_event`] and calls [`Socket::poll_timers`] when
//! [`Socket::next_deadline`] passes.
//!
//! Endpoint transitions are routed to the pattern:
//!
//! - `Activated`: round-robin attaches the endpoint to its balancer; the
//!   subscriber replays its subscriptions.
//! - `Deactivated`: the endpoint is detached.
//! - `Message`: round-robin matches it against waiting receives; the
//!   subscriber hands it to the message handler.

use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, trace};
use wsmq_core::error::{Result, WsmqError};
use wsmq_core::message::Message;
use wsmq_core::monitor::{create_monitor, SocketEventSender, SocketMonitor};
use wsmq_core::options::SocketOptions;
use wsmq_core::socket_type::SocketKind;
use wsmq_core::subscription::SubscriptionSet;

use crate::endpoint::{ConnectionState, Endpoint, EndpointEvent, EndpointId};
use crate::round_robin::{Receive, RoundRobin};
use crate::subscriber::Subscriber;
use crate::transport::{Transport, TransportEvent};

/// Callback for every complete inbound message.
pub type MessageHandler = Box<dyn FnMut(&Message)>;

/// Callback fired when a socket becomes able to send again.
pub type ReadyHandler = Box<dyn FnMut()>;

enum Pattern {
    RoundRobin(RoundRobin),
    Subscribe(Subscriber),
}

/// Write access to the endpoints, split off the socket so a pattern can send
/// while the socket itself is mutably borrowed.
pub(crate) struct Peers<'a, T: Transport> {
    transport: &'a mut T,
    endpoints: &'a [Endpoint<T::Handle>],
}

impl<T: Transport> Peers<'_, T> {
    pub(crate) fn write(&mut self, id: EndpointId, message: &Message) -> Result<()> {
        let endpoint = self
            .endpoints
            .iter()
            .find(|endpoint| endpoint.id() == id)
            .ok_or(WsmqError::NotConnected)?;
        endpoint.write(message, self.transport)
    }
}

/// A client socket over transport `T`.
///
/// # Example
///
/// ```rust
/// use wsmq_core::prelude::*;
/// use wsmq_wire::inproc::InprocNetwork;
/// use wsmq_wire::socket::Socket;
///
/// let network = InprocNetwork::new();
/// let (transport, _events) = network.transport();
/// let mut socket = Socket::round_robin(transport, SocketOptions::default());
///
/// // nothing connected yet: not sent, no capacity
/// assert!(!socket.send(&Message::new()).unwrap());
/// assert!(!socket.has_outbound_capacity());
/// ```
pub struct Socket<T: Transport> {
    kind: SocketKind,
    transport: T,
    options: SocketOptions,
    pattern: Pattern,
    endpoints: Vec<Endpoint<T::Handle>>,
    // disconnected endpoints waiting for the transport to confirm the close
    closing: Vec<Endpoint<T::Handle>>,
    next_id: u64,
    on_message: Option<MessageHandler>,
    send_ready: Option<ReadyHandler>,
    monitor: Option<SocketEventSender>,
}

impl<T: Transport> Socket<T> {
    /// Create a socket of `kind` with no endpoints.
    pub fn new(kind: SocketKind, transport: T, options: SocketOptions) -> Self {
        let pattern = match kind {
            SocketKind::RoundRobin => Pattern::RoundRobin(RoundRobin::new()),
            SocketKind::Subscribe => Pattern::Subscribe(Subscriber::new()),
        };
        debug!("[{}] Socket created", kind);
        Self {
            kind,
            transport,
            options,
            pattern,
            endpoints: Vec::new(),
            closing: Vec::new(),
            next_id: 0,
            on_message: None,
            send_ready: None,
            monitor: None,
        }
    }

    /// Create a round-robin (DEALER) socket.
    pub fn round_robin(transport: T, options: SocketOptions) -> Self {
        Self::new(SocketKind::RoundRobin, transport, options)
    }

    /// Create a broadcast-subscribe (SUB) socket.
    pub fn subscriber(transport: T, options: SocketOptions) -> Self {
        Self::new(SocketKind::Subscribe, transport, options)
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    pub fn options(&self) -> &SocketOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Register the callback invoked for every complete inbound message.
    ///
    /// On a round-robin socket a registered handler takes over delivery:
    /// unsolicited messages are no longer queued for `receive()`.
    pub fn set_message_handler(&mut self, handler: impl FnMut(&Message) + 'static) {
        self.on_message = Some(Box::new(handler));
    }

    pub fn clear_message_handler(&mut self) {
        self.on_message = None;
    }

    /// Register the callback fired each time the socket goes from unable to
    /// able to send.
    pub fn set_send_ready_handler(&mut self, handler: impl FnMut() + 'static) {
        self.send_ready = Some(Box::new(handler));
    }

    /// Subscribe to endpoint lifecycle events.
    ///
    /// Replaces any previous monitor.
    pub fn monitor(&mut self) -> SocketMonitor {
        let (sender, receiver) = create_monitor();
        for endpoint in self.endpoints.iter_mut().chain(self.closing.iter_mut()) {
            endpoint.set_monitor(Some(sender.clone()));
        }
        self.monitor = Some(sender);
        receiver
    }

    /// Add an endpoint for `address` and start connecting.
    pub fn connect(&mut self, address: impl Into<String>) -> EndpointId {
        let id = EndpointId(self.next_id);
        self.next_id += 1;

        let mut endpoint = Endpoint::new(id, address, &self.options);
        endpoint.set_monitor(self.monitor.clone());
        debug!("[{}] Connecting to endpoint: {}", self.kind, endpoint.address());
        endpoint.open(&mut self.transport);
        self.endpoints.push(endpoint);
        id
    }

    /// Close and remove the endpoint connected to `address`.
    pub fn disconnect(&mut self, address: &str) -> Result<()> {
        let index = self
            .endpoints
            .iter()
            .position(|endpoint| endpoint.address() == address)
            .ok_or_else(|| WsmqError::UnknownEndpoint(address.to_string()))?;

        let endpoint = self.endpoints.remove(index);
        debug!("[{}] Disconnecting from endpoint: {}", self.kind, address);
        self.retire(endpoint);
        Ok(())
    }

    /// Close every endpoint. The socket stays usable; `connect` again to
    /// resume.
    pub fn close(&mut self) {
        trace!("[{}] Closing socket", self.kind);
        for endpoint in std::mem::take(&mut self.endpoints) {
            self.retire(endpoint);
        }
    }

    /// Send `message` to the next active endpoint.
    ///
    /// Returns `Ok(false)` when no endpoint is active; nothing is queued.
    /// A transport write failure is logged and the message is dropped; the
    /// endpoint's pending close event then takes it out of the rotation.
    pub fn send(&mut self, message: &Message) -> Result<bool> {
        let mut peers = Peers {
            transport: &mut self.transport,
            endpoints: &self.endpoints,
        };
        match &mut self.pattern {
            Pattern::RoundRobin(round_robin) => round_robin.send(message, &mut peers),
            Pattern::Subscribe(_) => Err(WsmqError::UnsupportedOperation(
                "send on a subscribe socket",
            )),
        }
    }

    /// Wait for the next inbound message.
    ///
    /// Fails right away with [`WsmqError::NotConnected`] when nothing is
    /// queued and no endpoint is active.
    pub fn receive(&mut self) -> Result<Receive> {
        match &mut self.pattern {
            Pattern::RoundRobin(round_robin) => round_robin.receive(),
            Pattern::Subscribe(_) => Err(WsmqError::UnsupportedOperation(
                "receive on a subscribe socket, use a message handler",
            )),
        }
    }

    /// True iff `send` would currently reach an endpoint.
    pub fn has_outbound_capacity(&self) -> bool {
        match &self.pattern {
            Pattern::RoundRobin(round_robin) => round_robin.has_outbound_capacity(),
            Pattern::Subscribe(_) => false,
        }
    }

    /// Inbound messages queued for `receive()`.
    pub fn queued_messages(&self) -> usize {
        match &self.pattern {
            Pattern::RoundRobin(round_robin) => round_robin.queued_messages(),
            Pattern::Subscribe(_) => 0,
        }
    }

    /// Registered `receive()` calls still waiting for a message.
    pub fn waiting_receives(&self) -> usize {
        match &self.pattern {
            Pattern::RoundRobin(round_robin) => round_robin.waiting_receives(),
            Pattern::Subscribe(_) => 0,
        }
    }

    /// Add a topic prefix and announce it to every active endpoint.
    pub fn subscribe(&mut self, topic: impl Into<Bytes>) -> Result<()> {
        let mut peers = Peers {
            transport: &mut self.transport,
            endpoints: &self.endpoints,
        };
        match &mut self.pattern {
            Pattern::Subscribe(subscriber) => subscriber.subscribe(topic.into(), &mut peers),
            Pattern::RoundRobin(_) => Err(WsmqError::UnsupportedOperation(
                "subscribe on a round-robin socket",
            )),
        }
    }

    /// Remove a topic prefix and announce the removal to every active
    /// endpoint.
    pub fn unsubscribe(&mut self, topic: &[u8]) -> Result<()> {
        let mut peers = Peers {
            transport: &mut self.transport,
            endpoints: &self.endpoints,
        };
        match &mut self.pattern {
            Pattern::Subscribe(subscriber) => subscriber.unsubscribe(topic, &mut peers),
            Pattern::RoundRobin(_) => Err(WsmqError::UnsupportedOperation(
                "unsubscribe on a round-robin socket",
            )),
        }
    }

    /// Current subscriptions, in insertion order. `None` on a round-robin
    /// socket.
    pub fn subscriptions(&self) -> Option<&SubscriptionSet> {
        match &self.pattern {
            Pattern::Subscribe(subscriber) => Some(subscriber.subscriptions()),
            Pattern::RoundRobin(_) => None,
        }
    }

    /// Endpoints currently connected or reconnecting, in connect order.
    pub fn endpoints(&self) -> &[Endpoint<T::Handle>] {
        &self.endpoints
    }

    pub fn endpoint(&self, id: EndpointId) -> Option<&Endpoint<T::Handle>> {
        self.endpoints.iter().find(|endpoint| endpoint.id() == id)
    }

    /// Active endpoints, in the order the pattern uses them.
    pub fn active_endpoints(&self) -> &[EndpointId] {
        match &self.pattern {
            Pattern::RoundRobin(round_robin) => round_robin.active_endpoints(),
            Pattern::Subscribe(subscriber) => subscriber.active_endpoints(),
        }
    }

    /// Dispatch one transport event to the endpoint owning `handle`.
    ///
    /// Events for handles no endpoint currently owns are ignored.
    pub fn handle_event(&mut self, handle: &T::Handle, event: TransportEvent, now: Instant) {
        let Some(index) = self
            .endpoints
            .iter()
            .position(|endpoint| endpoint.is_current(handle))
        else {
            self.handle_closing_event(handle, event, now);
            return;
        };

        let endpoint = &mut self.endpoints[index];
        let id = endpoint.id();
        match endpoint.handle_event(event, &mut self.transport, now) {
            Some(EndpointEvent::Activated) => self.on_activated(id),
            Some(EndpointEvent::Deactivated) => self.on_deactivated(id),
            Some(EndpointEvent::Message(message)) => self.on_message(message),
            None => {}
        }
    }

    /// Start every reconnect that is due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        for endpoint in &mut self.endpoints {
            endpoint.poll_reconnect(now, &mut self.transport);
        }
    }

    /// Earliest scheduled reconnect, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.endpoints
            .iter()
            .filter_map(Endpoint::next_deadline)
            .min()
    }

    fn handle_closing_event(&mut self, handle: &T::Handle, event: TransportEvent, now: Instant) {
        let Some(index) = self
            .closing
            .iter()
            .position(|endpoint| endpoint.is_current(handle))
        else {
            trace!("[{}] Ignoring event for stale handle {:?}", self.kind, handle);
            return;
        };

        // only the close confirmation matters here
        self.closing[index].handle_event(event, &mut self.transport, now);
        if self.closing[index].state() == ConnectionState::Closed {
            self.closing.swap_remove(index);
        }
    }

    fn retire(&mut self, mut endpoint: Endpoint<T::Handle>) {
        if endpoint.is_active() {
            self.on_deactivated(endpoint.id());
        }
        endpoint.close(&mut self.transport);
        if endpoint.state() == ConnectionState::Closing {
            self.closing.push(endpoint);
        }
    }

    fn on_activated(&mut self, id: EndpointId) {
        let mut peers = Peers {
            transport: &mut self.transport,
            endpoints: &self.endpoints,
        };
        let became_ready = match &mut self.pattern {
            Pattern::RoundRobin(round_robin) => round_robin.on_activated(id),
            Pattern::Subscribe(subscriber) => subscriber.on_activated(id, &mut peers),
        };

        if became_ready {
            debug!("[{}] Ready", self.kind);
            if let Some(send_ready) = self.send_ready.as_mut() {
                send_ready();
            }
        }
    }

    fn on_deactivated(&mut self, id: EndpointId) {
        match &mut self.pattern {
            Pattern::RoundRobin(round_robin) => round_robin.on_deactivated(id),
            Pattern::Subscribe(subscriber) => subscriber.on_deactivated(id),
        }
    }

    fn on_message(&mut self, message: Message) {
        match &mut self.pattern {
            Pattern::RoundRobin(round_robin) => {
                round_robin.on_message(message, self.on_message.as_mut());
            }
            Pattern::Subscribe(_) => match self.on_message.as_mut() {
                Some(handler) => handler(&message),
                None => trace!("[SUB] No message handler, dropping {} frames", message.len()),
            },
        }
    }
}

impl<T: Transport> Drop for Socket<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> std::fmt::Debug for Socket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("kind", &self.kind)
            .field("endpoints", &self.endpoints)
            .field("closing", &self.closing.len())
            .finish_non_exhaustive()
    }
}
