//! Endpoint lifecycle.
//!
//! An [`Endpoint`] owns one logical connection to one address. It drives the
//! transport through connect / reconnect / close, reassembles inbound frames,
//! and reports the transitions its socket cares about as [`EndpointEvent`]s.
//!
//! ```text
//!            open()                Open event
//!  Closed ───────────▶ Connecting ────────────▶ Open
//!    ▲  ▲                  │                      │
//!    │  └──── Close ───────┘                      │ close()
//!    │        (reconnect)                         ▼
//!    └──────────────────── Close ─────────────── Closing
//! ```
//!
//! Every close that was not requested triggers a reconnect: immediately while
//! the attempt counter is within the threshold, otherwise after the fixed
//! backoff. The caller supplies `now`, so the state machine never reads a
//! clock.

use std::borrow::Cow;
use std::fmt;
use std::time::Instant;

use tracing::{debug, trace, warn};
use wsmq_core::error::{Result, WsmqError};
use wsmq_core::message::Message;
use wsmq_core::monitor::{SocketEvent, SocketEventSender};
use wsmq_core::options::SocketOptions;
use wsmq_core::reconnect::ReconnectState;

use crate::framing::{self, FrameAssembler};
use crate::transport::{Payload, Transport, TransportEvent};

/// Identifies an endpoint within its socket. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(pub(crate) u64);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint-{}", self.0)
    }
}

/// Transport connection state of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
    Closing,
}

/// What the socket has to react to after an endpoint processed an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointEvent {
    /// The endpoint became usable for traffic.
    Activated,
    /// The endpoint stopped being usable for traffic.
    Deactivated,
    /// A complete inbound message.
    Message(Message),
}

/// One reconnecting connection to a single address.
pub struct Endpoint<H> {
    id: EndpointId,
    address: String,
    state: ConnectionState,
    // None until the first open()
    handle: Option<H>,
    reconnect: ReconnectState,
    reopen_at: Option<Instant>,
    incoming: FrameAssembler,
    close_code: u16,
    close_reason: Cow<'static, str>,
    debug_logging: bool,
    monitor: Option<SocketEventSender>,
}

impl<H: Clone + Eq + fmt::Debug> Endpoint<H> {
    /// Create a closed endpoint. Call [`open`](Self::open) to start connecting.
    pub fn new(id: EndpointId, address: impl Into<String>, options: &SocketOptions) -> Self {
        Self {
            id,
            address: address.into(),
            state: ConnectionState::Closed,
            handle: None,
            reconnect: ReconnectState::new(options),
            reopen_at: None,
            incoming: FrameAssembler::new(),
            close_code: options.close_code,
            close_reason: options.close_reason.clone(),
            debug_logging: options.debug_logging,
            monitor: None,
        }
    }

    pub(crate) fn set_monitor(&mut self, monitor: Option<SocketEventSender>) {
        self.monitor = monitor;
    }

    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True iff the transport connection is open.
    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Handle of the current connection attempt.
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// Whether `handle` belongs to the current connection attempt. Events for
    /// any other handle are stale.
    pub fn is_current(&self, handle: &H) -> bool {
        self.handle.as_ref() == Some(handle)
    }

    /// Consecutive connection attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect.attempt()
    }

    /// When a delayed reconnect is due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.reopen_at
    }

    /// Start a connection attempt. Ignored unless the endpoint is closed.
    pub fn open<T>(&mut self, transport: &mut T)
    where
        T: Transport<Handle = H>,
    {
        if self.state != ConnectionState::Closed {
            trace!("[Endpoint] open ignored in state {:?}", self.state);
            return;
        }

        self.reopen_at = None;
        self.incoming.reset();
        self.reconnect.record_attempt();
        self.handle = Some(transport.open(&self.address));
        self.state = ConnectionState::Connecting;

        if self.debug_logging {
            debug!(
                "[Endpoint] Connecting to {} (attempt {})",
                self.address,
                self.reconnect.attempt()
            );
        }
        self.emit(SocketEvent::Connecting(self.address.clone()));
    }

    /// Request a graceful close.
    ///
    /// A connecting or open endpoint moves to `Closing` and finishes when the
    /// transport reports the close. A closed endpoint just forgets any
    /// scheduled reconnect.
    pub fn close<T>(&mut self, transport: &mut T)
    where
        T: Transport<Handle = H>,
    {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                if let Some(handle) = &self.handle {
                    transport.close(handle, self.close_code, &self.close_reason);
                }
                self.state = ConnectionState::Closing;
                if self.debug_logging {
                    debug!("[Endpoint] Closing {}", self.address);
                }
            }
            ConnectionState::Closed => {
                self.reopen_at = None;
                self.emit(SocketEvent::Closed(self.address.clone()));
            }
            ConnectionState::Closing => {}
        }
    }

    /// Process one transport event for the current handle.
    pub fn handle_event<T>(
        &mut self,
        event: TransportEvent,
        transport: &mut T,
        now: Instant,
    ) -> Option<EndpointEvent>
    where
        T: Transport<Handle = H>,
    {
        match event {
            TransportEvent::Open => self.on_open(),
            TransportEvent::Close { code, reason } => self.on_close(code, &reason, transport, now),
            TransportEvent::Data(payload) => self.on_data(payload),
        }
    }

    /// Fire a scheduled reconnect whose time has come.
    ///
    /// Returns `true` if a connection attempt was started.
    pub fn poll_reconnect<T>(&mut self, now: Instant, transport: &mut T) -> bool
    where
        T: Transport<Handle = H>,
    {
        match self.reopen_at {
            Some(at) if at <= now && self.state == ConnectionState::Closed => {
                self.open(transport);
                true
            }
            _ => false,
        }
    }

    /// Frame `message` and write it to the open connection.
    pub fn write<T>(&self, message: &Message, transport: &mut T) -> Result<()>
    where
        T: Transport<Handle = H>,
    {
        let handle = match (&self.handle, self.state) {
            (Some(handle), ConnectionState::Open) => handle,
            _ => return Err(WsmqError::NotConnected),
        };

        if self.debug_logging {
            trace!("[Endpoint] Sending {} frames to {}", message.len(), self.address);
        }
        for frame in framing::encode_message(message) {
            transport.write(handle, frame)?;
        }
        Ok(())
    }

    fn on_open(&mut self) -> Option<EndpointEvent> {
        if self.state != ConnectionState::Connecting {
            trace!("[Endpoint] open event ignored in state {:?}", self.state);
            return None;
        }

        self.state = ConnectionState::Open;
        self.reconnect.reset();
        if self.debug_logging {
            debug!("[Endpoint] Connected to {}", self.address);
        }
        self.emit(SocketEvent::Connected(self.address.clone()));
        Some(EndpointEvent::Activated)
    }

    fn on_close<T>(
        &mut self,
        code: u16,
        reason: &str,
        transport: &mut T,
        now: Instant,
    ) -> Option<EndpointEvent>
    where
        T: Transport<Handle = H>,
    {
        let prior = self.state;
        if prior == ConnectionState::Closed {
            return None;
        }

        self.state = ConnectionState::Closed;
        self.incoming.reset();
        if self.debug_logging {
            debug!(
                "[Endpoint] Connection to {} closed: {} {}",
                self.address, code, reason
            );
        }

        if prior == ConnectionState::Closing {
            self.handle = None;
            self.emit(SocketEvent::Closed(self.address.clone()));
            return None;
        }

        let was_open = prior == ConnectionState::Open;
        if was_open {
            self.emit(SocketEvent::Disconnected(self.address.clone()));
        }

        match self.reconnect.next_delay() {
            None => self.open(transport),
            Some(delay) => {
                self.reopen_at = Some(now + delay);
                if self.debug_logging {
                    debug!(
                        "[Endpoint] Reconnecting to {} in {:?} after {} attempts",
                        self.address,
                        delay,
                        self.reconnect.attempt()
                    );
                }
                self.emit(SocketEvent::ReconnectScheduled {
                    address: self.address.clone(),
                    delay,
                });
            }
        }

        was_open.then_some(EndpointEvent::Deactivated)
    }

    fn on_data(&mut self, payload: Payload) -> Option<EndpointEvent> {
        if self.state != ConnectionState::Open {
            trace!("[Endpoint] data ignored in state {:?}", self.state);
            return None;
        }

        let wire = match framing::decode_payload(payload) {
            Ok(wire) => wire,
            Err(e) => {
                warn!("[Endpoint] Dropping payload from {}: {}", self.address, e);
                return None;
            }
        };

        match self.incoming.push(wire) {
            Ok(Some(message)) => {
                if self.debug_logging {
                    trace!(
                        "[Endpoint] Received {} frames from {}",
                        message.len(),
                        self.address
                    );
                }
                Some(EndpointEvent::Message(message))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("[Endpoint] Dropping frame from {}: {}", self.address, e);
                None
            }
        }
    }

    fn emit(&self, event: SocketEvent) {
        if let Some(monitor) = &self.monitor {
            // a dropped monitor just means nobody is listening
            let _ = monitor.send(event);
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for Endpoint<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("state", &self.state)
            .field("handle", &self.handle)
            .field("reconnect_attempts", &self.reconnect.attempt())
            .field("reopen_at", &self.reopen_at)
            .finish_non_exhaustive()
    }
}
