//! Transport contract consumed by endpoints.
//!
//! A transport carries discrete messages (one wire frame each) over some
//! connection-oriented channel, WebSocket being the intended one. It is
//! driven from the outside: the socket calls `open` / `write` / `close`, and
//! whoever runs the event loop feeds the resulting [`TransportEvent`]s back
//! into [`Socket::handle_event`](crate::socket::Socket::handle_event),
//! tagged with the handle they belong to.

use std::fmt;
use std::hash::Hash;
use std::io;

use bytes::Bytes;

/// Close code used when a connection goes away without a close handshake.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// A message-oriented, connection-based transport.
pub trait Transport {
    /// Identifies one connection attempt. A reconnect gets a fresh handle.
    type Handle: Clone + Eq + Hash + fmt::Debug;

    /// Start connecting to `address`.
    ///
    /// Never fails synchronously: a refused or unreachable peer is reported
    /// later as [`TransportEvent::Close`] for the returned handle.
    fn open(&mut self, address: &str) -> Self::Handle;

    /// Send one discrete message on an open connection.
    fn write(&mut self, handle: &Self::Handle, data: Bytes) -> io::Result<()>;

    /// Ask the transport to shut the connection down. Completion is reported
    /// as [`TransportEvent::Close`].
    fn close(&mut self, handle: &Self::Handle, code: u16, reason: &str);
}

/// Something that happened on a transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established.
    Open,
    /// The connection is gone, or never came up.
    Close { code: u16, reason: String },
    /// One inbound message.
    Data(Payload),
}

/// Inbound message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw bytes.
    Binary(Bytes),
    /// Comma-separated decimal byte values, for transports without binary
    /// frames (`"0,112,105,110,103"`).
    Text(String),
}

/// Receiving side of a transport's event stream.
pub type TransportEvents<H> = flume::Receiver<(H, TransportEvent)>;

/// Sending side of a transport's event stream.
pub type TransportEventSender<H> = flume::Sender<(H, TransportEvent)>;
