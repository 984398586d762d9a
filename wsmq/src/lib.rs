//! # wsmq
//!
//! ZeroMQ-style client sockets over message-oriented transports such as
//! WebSocket.
//!
//! ## Architecture
//!
//! - **`wsmq-core`**: messages, typed field codec, load balancer,
//!   subscriptions, options, errors
//! - **`wsmq-wire`**: sans-IO endpoints with reconnection, wire framing,
//!   the socket patterns, an in-process transport
//! - **`wsmq`**: public API surface and the async [`Driver`] (this crate)
//!
//! ## Socket kinds
//!
//! - **RoundRobin** (DEALER): each `send` goes to the next connected peer;
//!   `recv` returns replies in arrival order
//! - **Subscribe** (SUB): tells every peer which topic prefixes it wants and
//!   hands inbound messages to a callback
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wsmq::prelude::*;
//!
//! #[compio::main]
//! async fn main() -> Result<()> {
//!     let network = InprocNetwork::new();
//!     let listener = network.bind("inproc://echo")?;
//!
//!     let (transport, events) = network.transport();
//!     let mut driver = Driver::round_robin(transport, events, SocketOptions::default());
//!     driver.connect("inproc://echo");
//!     driver.wait_ready().await?;
//!
//!     let mut request = Message::new();
//!     request.push_str("ping");
//!     driver.send(&request)?;
//!
//!     let mut peer = listener.accept().expect("connected");
//!     let echoed = peer.recv_message().expect("request");
//!     peer.send_message(&echoed)?;
//!
//!     let reply = driver.recv().await?;
//!     assert_eq!(reply.get_str(0)?, "ping");
//!     Ok(())
//! }
//! ```
//!
//! ## Wire format
//!
//! Every frame of a message is one transport message, prefixed with a
//! continuation byte: `1` when more frames follow, `0` on the last one.
//! Subscription changes are single-frame messages `[1|0][topic]`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dev_tracing;
pub mod driver;

pub use bytes::Bytes;

pub use driver::Driver;
pub use wsmq_core::codec;
pub use wsmq_core::error::{Result, WsmqError};
pub use wsmq_core::message::Message;
pub use wsmq_core::monitor::{SocketEvent, SocketMonitor};
pub use wsmq_core::options::SocketOptions;
pub use wsmq_core::socket_type::SocketKind;
pub use wsmq_core::subscription::SubscriptionEvent;
pub use wsmq_wire::framing;
pub use wsmq_wire::inproc::{InprocListener, InprocNetwork, InprocPeer, InprocTransport};
pub use wsmq_wire::transport::{Payload, Transport, TransportEvent, TransportEvents};
pub use wsmq_wire::{ConnectionState, EndpointId, Receive, Socket};

/// Convenient imports.
///
/// # Example
///
/// ```rust
/// use wsmq::prelude::*;
///
/// // Now you have:
/// // - Driver, Socket, SocketKind, SocketOptions
/// // - Message, Bytes, Result, WsmqError
/// // - Transport and the inproc transport types
/// ```
pub mod prelude {
    pub use crate::driver::Driver;
    pub use bytes::Bytes;
    pub use wsmq_core::error::{Result, WsmqError};
    pub use wsmq_core::message::Message;
    pub use wsmq_core::monitor::SocketEvent;
    pub use wsmq_core::options::SocketOptions;
    pub use wsmq_core::socket_type::SocketKind;
    pub use wsmq_wire::inproc::{InprocNetwork, InprocPeer};
    pub use wsmq_wire::socket::Socket;
    pub use wsmq_wire::transport::{Transport, TransportEvent};
}
