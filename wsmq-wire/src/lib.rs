//! # wsmq wire
//!
//! Socket machinery for the wsmq client: endpoints with reconnection, the
//! continuation-flagged wire framing, and the two socket patterns.
//!
//! ## Overview
//!
//! - **RoundRobin** (DEALER): outbound messages rotate across connected
//!   peers, replies are matched FIFO against `receive()` calls
//! - **Subscribe** (SUB): receive-only, announces topic subscriptions to
//!   every peer and replays them on reconnect
//!
//! Everything here is sans-IO. A [`Transport`] performs the actual
//! connection work and its [`TransportEvent`]s are fed back into
//! [`Socket::handle_event`]; the `wsmq` crate ships an async driver that
//! does this on a `compio` runtime.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Instant;
//! use wsmq_core::prelude::*;
//! use wsmq_wire::{InprocNetwork, Socket};
//!
//! let network = InprocNetwork::new();
//! let _listener = network.bind("inproc://feed").unwrap();
//! let (transport, events) = network.transport();
//!
//! let mut socket = Socket::subscriber(transport, SocketOptions::default());
//! socket.subscribe("weather").unwrap();
//! socket.connect("inproc://feed");
//!
//! for (handle, event) in events.try_iter() {
//!     socket.handle_event(&handle, event, Instant::now());
//! }
//! assert_eq!(socket.active_endpoints().len(), 1);
//! ```

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

pub mod endpoint;
pub mod framing;
pub mod inproc;
pub mod socket;
pub mod transport;

mod round_robin;
mod subscriber;

pub use endpoint::{ConnectionState, Endpoint, EndpointEvent, EndpointId};
pub use inproc::{ConnectionId, InprocEvents, InprocListener, InprocNetwork, InprocPeer, InprocTransport};
pub use round_robin::Receive;
pub use socket::{MessageHandler, ReadyHandler, Socket};
pub use transport::{Payload, Transport, TransportEvent, TransportEvents};
