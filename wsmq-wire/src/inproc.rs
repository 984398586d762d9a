//! In-process transport.
//!
//! Connects sockets to peers living in the same process over channels, with
//! the same message-per-frame semantics as a WebSocket. Useful for tests and
//! for wiring components together without a network.
//!
//! # Usage
//!
//! ```rust
//! use std::time::Instant;
//! use wsmq_core::prelude::*;
//! use wsmq_wire::inproc::InprocNetwork;
//! use wsmq_wire::socket::Socket;
//!
//! let network = InprocNetwork::new();
//! let listener = network.bind("inproc://backend").unwrap();
//!
//! let (transport, events) = network.transport();
//! let mut socket = Socket::round_robin(transport, SocketOptions::default());
//! socket.connect("inproc://backend");
//!
//! // deliver the open event
//! for (handle, event) in events.try_iter() {
//!     socket.handle_event(&handle, event, Instant::now());
//! }
//!
//! let mut msg = Message::new();
//! msg.push_str("ping");
//! assert!(socket.send(&msg).unwrap());
//!
//! let mut peer = listener.accept().unwrap();
//! assert_eq!(peer.recv_message().unwrap(), msg);
//! ```
//!
//! Each [`InprocNetwork`] is its own namespace; there is no global registry.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hashbrown::HashMap;
use tracing::trace;
use wsmq_core::message::Message;

use crate::framing::{self, FrameAssembler};
use crate::transport::{
    Payload, Transport, TransportEvent, TransportEventSender, TransportEvents, CLOSE_ABNORMAL,
};

const PREFIX: &str = "inproc://";

/// Handle of one inproc connection. Unique within its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inproc-{}", self.0)
    }
}

/// Event stream of an [`InprocTransport`].
pub type InprocEvents = TransportEvents<ConnectionId>;

/// A namespace of inproc listeners.
///
/// Cheap to clone; clones share the same listeners.
#[derive(Clone, Default)]
pub struct InprocNetwork {
    inner: Arc<NetworkInner>,
}

#[derive(Default)]
struct NetworkInner {
    listeners: DashMap<String, flume::Sender<InprocPeer>>,
    next_connection: AtomicU64,
}

impl InprocNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting connections on `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not an `inproc://` address or is
    /// already bound in this network.
    pub fn bind(&self, address: &str) -> io::Result<InprocListener> {
        let name = validate_and_extract_name(address)?;
        let (tx, rx) = flume::unbounded();

        match self.inner.listeners.entry(name.to_string()) {
            Entry::Occupied(_) => Err(io::Error::new(
                io::ErrorKind::AddrInUse,
                format!("inproc endpoint '{name}' is already bound"),
            )),
            Entry::Vacant(entry) => {
                entry.insert(tx);
                trace!("[inproc] bound {}", name);
                Ok(InprocListener {
                    name: name.to_string(),
                    incoming: rx,
                    network: self.clone(),
                })
            }
        }
    }

    /// Create a transport for one socket, with the stream its events arrive
    /// on.
    #[must_use]
    pub fn transport(&self) -> (InprocTransport, InprocEvents) {
        let (events, rx) = flume::unbounded();
        let transport = InprocTransport {
            network: self.clone(),
            events,
            links: HashMap::new(),
        };
        (transport, rx)
    }

    /// Names currently bound, without the `inproc://` prefix.
    pub fn bound_names(&self) -> Vec<String> {
        self.inner
            .listeners
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn next_connection(&self) -> ConnectionId {
        ConnectionId(self.inner.next_connection.fetch_add(1, Ordering::Relaxed))
    }

    fn listener(&self, address: &str) -> Option<flume::Sender<InprocPeer>> {
        let name = validate_and_extract_name(address).ok()?;
        self.inner.listeners.get(name).map(|tx| tx.value().clone())
    }
}

impl fmt::Debug for InprocNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InprocNetwork")
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

/// Accepts connections for one bound address. Unbinds on drop.
pub struct InprocListener {
    name: String,
    incoming: flume::Receiver<InprocPeer>,
    network: InprocNetwork,
}

impl InprocListener {
    /// Bound name, without the `inproc://` prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next pending connection, if any.
    pub fn accept(&self) -> Option<InprocPeer> {
        self.incoming.try_recv().ok()
    }

    /// Wait for the next connection.
    pub async fn accept_async(&self) -> Option<InprocPeer> {
        self.incoming.recv_async().await.ok()
    }
}

impl fmt::Debug for InprocListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InprocListener")
            .field("name", &self.name)
            .field("pending", &self.incoming.len())
            .finish_non_exhaustive()
    }
}

impl Drop for InprocListener {
    fn drop(&mut self) {
        self.network.inner.listeners.remove(&self.name);
        trace!("[inproc] unbound {}", self.name);
    }
}

/// [`Transport`] implementation over an [`InprocNetwork`].
pub struct InprocTransport {
    network: InprocNetwork,
    events: TransportEventSender<ConnectionId>,
    // socket -> peer direction of every live connection
    links: HashMap<ConnectionId, flume::Sender<Bytes>>,
}

impl InprocTransport {
    fn notify(&self, id: ConnectionId, event: TransportEvent) {
        // the socket side is gone; nobody to tell
        let _ = self.events.send((id, event));
    }

    fn refuse(&self, id: ConnectionId, address: &str) {
        trace!("[inproc] connection to {} refused", address);
        self.notify(
            id,
            TransportEvent::Close {
                code: CLOSE_ABNORMAL,
                reason: "connection refused".to_string(),
            },
        );
    }
}

impl Transport for InprocTransport {
    type Handle = ConnectionId;

    fn open(&mut self, address: &str) -> ConnectionId {
        self.links.retain(|_, link| !link.is_disconnected());

        let id = self.network.next_connection();
        let Some(listener) = self.network.listener(address) else {
            self.refuse(id, address);
            return id;
        };

        let (to_peer, from_socket) = flume::unbounded();
        let peer = InprocPeer {
            id,
            from_socket,
            to_socket: self.events.clone(),
            incoming: FrameAssembler::new(),
            closed: false,
        };
        if let Err(flume::SendError(mut peer)) = listener.send(peer) {
            peer.closed = true;
            self.refuse(id, address);
            return id;
        }

        self.links.insert(id, to_peer);
        trace!("[inproc] {} connected to {}", id, address);
        self.notify(id, TransportEvent::Open);
        id
    }

    fn write(&mut self, handle: &ConnectionId, data: Bytes) -> io::Result<()> {
        let link = self.links.get(handle).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, format!("{handle} is not open"))
        })?;
        link.send(data)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "inproc peer dropped"))
    }

    fn close(&mut self, handle: &ConnectionId, code: u16, reason: &str) {
        if self.links.remove(handle).is_some() {
            self.notify(
                *handle,
                TransportEvent::Close {
                    code,
                    reason: reason.to_string(),
                },
            );
        }
    }
}

impl fmt::Debug for InprocTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InprocTransport")
            .field("links", &self.links.len())
            .finish_non_exhaustive()
    }
}

/// The accepting side of one inproc connection.
///
/// Sees the raw wire frames the socket writes and can inject frames, text
/// payloads or a close back into the socket's event stream. Dropping the
/// peer without [`close`](Self::close) reports an abnormal close.
pub struct InprocPeer {
    id: ConnectionId,
    from_socket: flume::Receiver<Bytes>,
    to_socket: TransportEventSender<ConnectionId>,
    incoming: FrameAssembler,
    closed: bool,
}

impl InprocPeer {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next raw wire frame, marker byte included.
    pub fn recv_raw(&self) -> Option<Bytes> {
        self.from_socket.try_recv().ok()
    }

    /// Every raw wire frame received so far.
    pub fn drain_raw(&self) -> Vec<Bytes> {
        self.from_socket.try_iter().collect()
    }

    /// Next complete message, if all its frames have arrived.
    pub fn recv_message(&mut self) -> Option<Message> {
        while let Ok(wire) = self.from_socket.try_recv() {
            if let Ok(Some(message)) = self.incoming.push(wire) {
                return Some(message);
            }
        }
        None
    }

    /// Wait for the next complete message. `None` once the socket closed
    /// the connection.
    pub async fn recv_message_async(&mut self) -> Option<Message> {
        loop {
            let wire = self.from_socket.recv_async().await.ok()?;
            if let Ok(Some(message)) = self.incoming.push(wire) {
                return Some(message);
            }
        }
    }

    /// Deliver one raw wire frame to the socket as a binary payload.
    pub fn send_raw(&self, wire: impl Into<Bytes>) -> io::Result<()> {
        self.deliver(TransportEvent::Data(Payload::Binary(wire.into())))
    }

    /// Deliver a text payload (comma-separated byte values).
    pub fn send_text(&self, text: impl Into<String>) -> io::Result<()> {
        self.deliver(TransportEvent::Data(Payload::Text(text.into())))
    }

    /// Frame `message` and deliver every frame.
    pub fn send_message(&self, message: &Message) -> io::Result<()> {
        for frame in framing::encode_message(message) {
            self.send_raw(frame)?;
        }
        Ok(())
    }

    /// Close the connection from the peer side.
    pub fn close(mut self, code: u16, reason: &str) {
        self.send_close(code, reason);
    }

    /// True once the socket side has closed the connection.
    pub fn is_closed(&self) -> bool {
        self.from_socket.is_disconnected()
    }

    fn deliver(&self, event: TransportEvent) -> io::Result<()> {
        self.to_socket
            .send((self.id, event))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "inproc socket dropped"))
    }

    fn send_close(&mut self, code: u16, reason: &str) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.deliver(TransportEvent::Close {
            code,
            reason: reason.to_string(),
        });
    }
}

impl Drop for InprocPeer {
    fn drop(&mut self) {
        self.send_close(CLOSE_ABNORMAL, "peer dropped");
    }
}

impl fmt::Debug for InprocPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InprocPeer")
            .field("id", &self.id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn validate_and_extract_name(address: &str) -> io::Result<&str> {
    let Some(name) = address.strip_prefix(PREFIX) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("inproc endpoint must start with '{PREFIX}', got: '{address}'"),
        ));
    };
    if name.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "inproc endpoint name cannot be empty",
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_event(events: &InprocEvents) -> (ConnectionId, TransportEvent) {
        events.try_recv().expect("event queued")
    }

    #[test]
    fn test_validate_endpoint() {
        assert_eq!(validate_and_extract_name("inproc://test").unwrap(), "test");
        assert!(validate_and_extract_name("ws://test").is_err());
        assert!(validate_and_extract_name("inproc://").is_err());
        assert!(validate_and_extract_name("").is_err());
    }

    #[test]
    fn test_bind_twice_fails() {
        let network = InprocNetwork::new();
        let _listener = network.bind("inproc://a").unwrap();
        let err = network.bind("inproc://a").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }

    #[test]
    fn test_listener_debug_shows_pending() {
        let network = InprocNetwork::new();
        let listener = network.bind("inproc://dbg").unwrap();
        let (mut transport, _events) = network.transport();
        transport.open("inproc://dbg");

        let shown = format!("{listener:?}");
        assert!(shown.contains("name: \"dbg\""));
        assert!(shown.contains("pending: 1"));
    }

    #[test]
    fn test_networks_are_isolated() {
        let one = InprocNetwork::new();
        let two = InprocNetwork::new();
        let _a = one.bind("inproc://same").unwrap();
        let _b = two.bind("inproc://same").unwrap();
        assert_eq!(one.bound_names(), vec!["same".to_string()]);
    }

    #[test]
    fn test_unbind_on_drop() {
        let network = InprocNetwork::new();
        drop(network.bind("inproc://gone").unwrap());
        assert!(network.bound_names().is_empty());
        assert!(network.bind("inproc://gone").is_ok());
    }

    #[test]
    fn test_open_unbound_is_refused() {
        let network = InprocNetwork::new();
        let (mut transport, events) = network.transport();

        let id = transport.open("inproc://nobody");
        let (handle, event) = next_event(&events);
        assert_eq!(handle, id);
        assert!(matches!(event, TransportEvent::Close { code: CLOSE_ABNORMAL, .. }));
        assert!(transport.write(&id, Bytes::from_static(b"\x00x")).is_err());
    }

    #[test]
    fn test_open_write_close() {
        let network = InprocNetwork::new();
        let listener = network.bind("inproc://svc").unwrap();
        let (mut transport, events) = network.transport();

        let id = transport.open("inproc://svc");
        assert_eq!(next_event(&events), (id, TransportEvent::Open));

        let peer = listener.accept().unwrap();
        assert_eq!(peer.id(), id);
        transport.write(&id, Bytes::from_static(b"\x00hi")).unwrap();
        assert_eq!(peer.recv_raw().unwrap(), Bytes::from_static(b"\x00hi"));

        transport.close(&id, 1000, "done");
        assert_eq!(
            next_event(&events),
            (
                id,
                TransportEvent::Close {
                    code: 1000,
                    reason: "done".into()
                }
            )
        );
        assert!(peer.is_closed());
    }

    #[test]
    fn test_peer_close_and_drop() {
        let network = InprocNetwork::new();
        let listener = network.bind("inproc://svc").unwrap();
        let (mut transport, events) = network.transport();

        let first = transport.open("inproc://svc");
        let second = transport.open("inproc://svc");
        let _ = events.try_iter().count();

        listener.accept().unwrap().close(4001, "bye");
        assert_eq!(
            next_event(&events),
            (
                first,
                TransportEvent::Close {
                    code: 4001,
                    reason: "bye".into()
                }
            )
        );

        drop(listener.accept().unwrap());
        let (handle, event) = next_event(&events);
        assert_eq!(handle, second);
        assert!(matches!(event, TransportEvent::Close { code: CLOSE_ABNORMAL, .. }));
        assert!(events.try_recv().is_err());

        let err = transport
            .write(&second, Bytes::from_static(b"\x00x"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_peer_sends_into_event_stream() {
        let network = InprocNetwork::new();
        let listener = network.bind("inproc://svc").unwrap();
        let (mut transport, events) = network.transport();
        let id = transport.open("inproc://svc");
        let _ = next_event(&events);

        let peer = listener.accept().unwrap();
        peer.send_text("0,104,105").unwrap();
        assert_eq!(
            next_event(&events),
            (id, TransportEvent::Data(Payload::Text("0,104,105".into())))
        );

        let mut msg = Message::new();
        msg.push_str("a").push_str("b");
        peer.send_message(&msg).unwrap();
        let frames: Vec<_> = events.try_iter().collect();
        assert_eq!(frames.len(), 2);
    }
}
