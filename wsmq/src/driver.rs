//! Async event loop for a [`Socket`].
//!
//! The socket itself is sans-IO. A [`Driver`] owns it together with the
//! transport's event stream and runs the loop on the current `compio`
//! runtime: wait for the next transport event or the next reconnect
//! deadline, whichever comes first, and feed it to the socket.

use std::time::Instant;

use futures::future::{self, Either};
use futures::{pin_mut, FutureExt};
use tracing::trace;
use wsmq_core::error::{Result, WsmqError};
use wsmq_core::message::Message;
use wsmq_core::options::SocketOptions;
use wsmq_core::socket_type::SocketKind;
use wsmq_wire::endpoint::EndpointId;
use wsmq_wire::socket::Socket;
use wsmq_wire::transport::{Transport, TransportEvent, TransportEvents};

enum Turn<H> {
    Event(H, TransportEvent),
    Timer,
    Disconnected,
}

/// A socket plus the event stream of its transport.
///
/// # Example
///
/// ```rust,no_run
/// use wsmq::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let network = InprocNetwork::new();
/// let (transport, events) = network.transport();
/// let mut driver = Driver::round_robin(transport, events, SocketOptions::default());
///
/// driver.connect("inproc://backend");
/// driver.wait_ready().await?;
///
/// let mut request = Message::new();
/// request.push_str("ping");
/// driver.send(&request)?;
/// let reply = driver.recv().await?;
/// # Ok(())
/// # }
/// ```
pub struct Driver<T: Transport> {
    socket: Socket<T>,
    events: TransportEvents<T::Handle>,
}

impl<T: Transport> Driver<T> {
    /// Drive `socket` with the events arriving on `events`.
    pub fn new(socket: Socket<T>, events: TransportEvents<T::Handle>) -> Self {
        Self { socket, events }
    }

    /// Create a driver for a fresh socket of `kind`.
    pub fn with_kind(
        kind: SocketKind,
        transport: T,
        events: TransportEvents<T::Handle>,
        options: SocketOptions,
    ) -> Self {
        Self::new(Socket::new(kind, transport, options), events)
    }

    /// Create a driver for a fresh round-robin (DEALER) socket.
    pub fn round_robin(transport: T, events: TransportEvents<T::Handle>, options: SocketOptions) -> Self {
        Self::with_kind(SocketKind::RoundRobin, transport, events, options)
    }

    /// Create a driver for a fresh broadcast-subscribe (SUB) socket.
    pub fn subscriber(transport: T, events: TransportEvents<T::Handle>, options: SocketOptions) -> Self {
        Self::with_kind(SocketKind::Subscribe, transport, events, options)
    }

    /// The driven socket.
    pub fn socket(&self) -> &Socket<T> {
        &self.socket
    }

    /// The driven socket, for callbacks, monitoring and everything else
    /// the driver does not wrap.
    pub fn socket_mut(&mut self) -> &mut Socket<T> {
        &mut self.socket
    }

    /// Take the socket and its event stream apart again.
    pub fn into_parts(self) -> (Socket<T>, TransportEvents<T::Handle>) {
        (self.socket, self.events)
    }

    /// See [`Socket::connect`].
    pub fn connect(&mut self, address: impl Into<String>) -> EndpointId {
        self.socket.connect(address)
    }

    /// See [`Socket::disconnect`].
    pub fn disconnect(&mut self, address: &str) -> Result<()> {
        self.socket.disconnect(address)
    }

    /// See [`Socket::send`].
    pub fn send(&mut self, message: &Message) -> Result<bool> {
        self.socket.send(message)
    }

    /// See [`Socket::subscribe`].
    pub fn subscribe(&mut self, topic: impl Into<bytes::Bytes>) -> Result<()> {
        self.socket.subscribe(topic)
    }

    /// See [`Socket::unsubscribe`].
    pub fn unsubscribe(&mut self, topic: &[u8]) -> Result<()> {
        self.socket.unsubscribe(topic)
    }

    /// Wait for one transport event or due reconnect and process it.
    ///
    /// Returns `false` once the event stream has ended.
    pub async fn turn(&mut self) -> bool {
        let deadline = self.socket.next_deadline();

        let outcome = {
            let event = self.events.recv_async();
            let timer = async {
                match deadline {
                    Some(at) => {
                        compio::time::sleep(at.saturating_duration_since(Instant::now())).await;
                    }
                    None => future::pending::<()>().await,
                }
            };
            pin_mut!(event, timer);

            match future::select(event, timer).await {
                Either::Left((Ok((handle, event)), _)) => Turn::Event(handle, event),
                Either::Left((Err(_), _)) => Turn::Disconnected,
                Either::Right(((), _)) => Turn::Timer,
            }
        };

        match outcome {
            Turn::Event(handle, event) => {
                self.socket.handle_event(&handle, event, Instant::now());
                true
            }
            Turn::Timer => {
                trace!("[Driver] Reconnect deadline reached");
                self.socket.poll_timers(Instant::now());
                true
            }
            Turn::Disconnected => {
                trace!("[Driver] Transport event stream ended");
                false
            }
        }
    }

    /// Process everything that is ready right now without waiting.
    ///
    /// Returns the number of transport events handled.
    pub fn pump(&mut self) -> usize {
        let now = Instant::now();
        self.socket.poll_timers(now);

        let mut handled = 0;
        while let Ok((handle, event)) = self.events.try_recv() {
            self.socket.handle_event(&handle, event, now);
            handled += 1;
        }
        handled
    }

    /// Receive the next message, running the loop until it arrives.
    ///
    /// Fails with [`WsmqError::NotConnected`] if no endpoint is active, or
    /// if the last active endpoint goes away while waiting.
    pub async fn recv(&mut self) -> Result<Message> {
        let mut pending = self.socket.receive()?;
        loop {
            if let Some(result) = (&mut pending).now_or_never() {
                return result;
            }
            if !self.turn().await {
                return Err(WsmqError::NotConnected);
            }
        }
    }

    /// Run the loop until the socket can send.
    pub async fn wait_ready(&mut self) -> Result<()> {
        if self.socket.kind() != SocketKind::RoundRobin {
            return Err(WsmqError::UnsupportedOperation(
                "wait_ready on a socket that cannot send",
            ));
        }
        while !self.socket.has_outbound_capacity() {
            if !self.turn().await {
                return Err(WsmqError::NotConnected);
            }
        }
        Ok(())
    }

    /// Run the loop until the event stream ends.
    ///
    /// Inbound messages reach the socket's message handler.
    pub async fn run(&mut self) {
        while self.turn().await {}
    }
}

impl<T: Transport> std::fmt::Debug for Driver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("socket", &self.socket)
            .field("queued_events", &self.events.len())
            .finish()
    }
}
