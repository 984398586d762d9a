//! Integration tests for endpoint reconnection through a socket.

use std::time::{Duration, Instant};

use wsmq_core::prelude::*;
use wsmq_wire::{ConnectionState, InprocEvents, InprocNetwork, InprocTransport, Socket};

fn pump_at(socket: &mut Socket<InprocTransport>, events: &InprocEvents, now: Instant) -> usize {
    let mut n = 0;
    while let Ok((handle, event)) = events.try_recv() {
        socket.handle_event(&handle, event, now);
        n += 1;
    }
    n
}

#[test]
fn test_unreachable_peer_backs_off_then_recovers() {
    let network = InprocNetwork::new();
    let (transport, events) = network.transport();
    let options = SocketOptions::default()
        .with_reconnect_threshold(10)
        .with_reconnect_backoff(Duration::from_millis(2000));
    let mut socket = Socket::round_robin(transport, options);
    let monitor = socket.monitor();

    let start = Instant::now();
    let id = socket.connect("inproc://late");

    // initial attempt plus ten immediate retries, all refused
    assert_eq!(pump_at(&mut socket, &events, start), 11);
    let deadline = socket.next_deadline().unwrap();
    assert_eq!(deadline, start + Duration::from_millis(2000));
    assert_eq!(socket.endpoint(id).unwrap().state(), ConnectionState::Closed);

    let attempts = monitor
        .try_iter()
        .filter(|e| matches!(e, SocketEvent::Connecting(_)))
        .count();
    assert_eq!(attempts, 11);

    // nothing happens before the deadline
    socket.poll_timers(deadline - Duration::from_millis(1));
    assert!(events.try_recv().is_err());

    // each further failure waits the full backoff again
    socket.poll_timers(deadline);
    assert_eq!(pump_at(&mut socket, &events, deadline), 1);
    let next = socket.next_deadline().unwrap();
    assert_eq!(next, deadline + Duration::from_millis(2000));

    let listener = network.bind("inproc://late").unwrap();
    socket.poll_timers(next);
    pump_at(&mut socket, &events, next);

    assert!(socket.has_outbound_capacity());
    assert!(socket.next_deadline().is_none());
    assert_eq!(socket.endpoint(id).unwrap().reconnect_attempts(), 0);
    assert!(listener.accept().is_some());
}

#[test]
fn test_disconnect_during_backoff_cancels_retry() {
    let network = InprocNetwork::new();
    let (transport, events) = network.transport();
    let options = SocketOptions::default().with_reconnect_threshold(0);
    let mut socket = Socket::round_robin(transport, options);

    let now = Instant::now();
    socket.connect("inproc://nowhere");
    pump_at(&mut socket, &events, now);
    assert!(socket.next_deadline().is_some());

    socket.disconnect("inproc://nowhere").unwrap();
    assert!(socket.next_deadline().is_none());
    assert!(socket.endpoints().is_empty());

    socket.poll_timers(now + Duration::from_secs(60));
    assert!(events.try_recv().is_err());
}

#[test]
fn test_events_for_old_connections_are_ignored() {
    let network = InprocNetwork::new();
    let listener = network.bind("inproc://svc").unwrap();
    let (transport, events) = network.transport();
    let mut socket = Socket::round_robin(transport, SocketOptions::default());

    socket.connect("inproc://svc");
    pump_at(&mut socket, &events, Instant::now());
    let old = listener.accept().unwrap();
    let old_id = old.id();

    // close the connection from the peer, then reconnect
    old.close(1001, "restart");
    pump_at(&mut socket, &events, Instant::now());
    let current = listener.accept().unwrap();
    assert_ne!(current.id(), old_id);

    // late data on the old handle goes nowhere
    let mut late = Message::new();
    late.push_str("late");
    socket.handle_event(
        &old_id,
        wsmq_wire::TransportEvent::Data(wsmq_wire::Payload::Binary(bytes::Bytes::from_static(
            b"\x00late",
        ))),
        Instant::now(),
    );
    assert_eq!(socket.queued_messages(), 0);

    current.send_message(&late).unwrap();
    pump_at(&mut socket, &events, Instant::now());
    assert_eq!(socket.queued_messages(), 1);
}

#[test]
fn test_monitor_reports_lifecycle() {
    let network = InprocNetwork::new();
    let listener = network.bind("inproc://svc").unwrap();
    let (transport, events) = network.transport();
    let mut socket = Socket::subscriber(transport, SocketOptions::default().with_debug_logging(true));
    let monitor = socket.monitor();

    socket.connect("inproc://svc");
    pump_at(&mut socket, &events, Instant::now());
    drop(listener.accept());
    pump_at(&mut socket, &events, Instant::now());
    socket.disconnect("inproc://svc").unwrap();
    pump_at(&mut socket, &events, Instant::now());

    let seen: Vec<_> = monitor.try_iter().map(|e| e.to_string()).collect();
    assert_eq!(
        seen,
        vec![
            "Connecting to inproc://svc",
            "Connected to inproc://svc",
            "Disconnected from inproc://svc",
            "Connecting to inproc://svc",
            "Connected to inproc://svc",
            "Closed inproc://svc",
        ]
    );
}
