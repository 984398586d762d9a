//! Integration tests for the broadcast-subscribe (SUB) socket.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use bytes::Bytes;
use wsmq_core::prelude::*;
use wsmq_wire::{InprocEvents, InprocNetwork, InprocTransport, Socket};

fn pump(socket: &mut Socket<InprocTransport>, events: &InprocEvents) {
    let now = Instant::now();
    while let Ok((handle, event)) = events.try_recv() {
        socket.handle_event(&handle, event, now);
    }
}

fn subscriber(network: &InprocNetwork) -> (Socket<InprocTransport>, InprocEvents) {
    let (transport, events) = network.transport();
    (Socket::subscriber(transport, SocketOptions::default()), events)
}

#[test]
fn test_subscriptions_replayed_on_activation() {
    let network = InprocNetwork::new();
    let listener = network.bind("inproc://feed").unwrap();
    let (mut socket, events) = subscriber(&network);

    socket.subscribe("a").unwrap();
    socket.subscribe("b").unwrap();
    socket.connect("inproc://feed");
    pump(&mut socket, &events);

    let peer = listener.accept().unwrap();
    assert_eq!(
        peer.drain_raw(),
        vec![
            Bytes::from_static(b"\x00\x01a"),
            Bytes::from_static(b"\x00\x01b")
        ]
    );

    // reconnect replays the full set again
    drop(peer);
    pump(&mut socket, &events);
    let peer = listener.accept().unwrap();
    assert_eq!(peer.drain_raw().len(), 2);
}

#[test]
fn test_subscribe_broadcasts_to_active_endpoints() {
    let network = InprocNetwork::new();
    let one = network.bind("inproc://one").unwrap();
    let two = network.bind("inproc://two").unwrap();
    let (mut socket, events) = subscriber(&network);

    socket.connect("inproc://one");
    socket.connect("inproc://two");
    pump(&mut socket, &events);
    let mut peers = vec![one.accept().unwrap(), two.accept().unwrap()];

    socket.subscribe("news").unwrap();
    socket.unsubscribe(b"news").unwrap();

    for peer in &mut peers {
        let control: Vec<_> = std::iter::from_fn(|| peer.recv_message())
            .map(|mut msg| SubscriptionEvent::from_frame(&msg.pop_frame().unwrap()).unwrap())
            .collect();
        assert_eq!(
            control,
            vec![
                SubscriptionEvent::Subscribe(Bytes::from_static(b"news")),
                SubscriptionEvent::Unsubscribe(Bytes::from_static(b"news")),
            ]
        );
    }
}

#[test]
fn test_subscribe_with_vanished_peer_is_replayed_later() {
    let network = InprocNetwork::new();
    let listener = network.bind("inproc://feed").unwrap();
    let (mut socket, events) = subscriber(&network);

    socket.connect("inproc://feed");
    pump(&mut socket, &events);
    drop(listener.accept().unwrap());

    socket.subscribe("news").unwrap();
    assert!(socket.subscriptions().unwrap().contains(b"news"));
    // already recorded, nothing to resend
    socket.subscribe("news").unwrap();

    pump(&mut socket, &events);
    let peer = listener.accept().unwrap();
    assert_eq!(peer.drain_raw(), vec![Bytes::from_static(b"\x00\x01news")]);
}

#[test]
fn test_duplicate_subscribe_is_silent() {
    let network = InprocNetwork::new();
    let listener = network.bind("inproc://feed").unwrap();
    let (mut socket, events) = subscriber(&network);
    socket.connect("inproc://feed");
    pump(&mut socket, &events);
    let peer = listener.accept().unwrap();

    socket.subscribe("x").unwrap();
    socket.subscribe("x").unwrap();
    socket.unsubscribe(b"never").unwrap();

    assert_eq!(peer.drain_raw().len(), 1);
    assert_eq!(socket.subscriptions().unwrap().len(), 1);
}

#[test]
fn test_unsubscribed_topic_not_replayed() {
    let network = InprocNetwork::new();
    let listener = network.bind("inproc://feed").unwrap();
    let (mut socket, events) = subscriber(&network);

    socket.subscribe("keep").unwrap();
    socket.subscribe("drop").unwrap();
    socket.unsubscribe(b"drop").unwrap();
    socket.connect("inproc://feed");
    pump(&mut socket, &events);

    let peer = listener.accept().unwrap();
    assert_eq!(peer.drain_raw(), vec![Bytes::from_static(b"\x00\x01keep")]);
}

#[test]
fn test_send_and_receive_are_unsupported() {
    let network = InprocNetwork::new();
    let (mut socket, _events) = subscriber(&network);

    assert!(matches!(
        socket.send(&Message::new()),
        Err(WsmqError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        socket.receive(),
        Err(WsmqError::UnsupportedOperation(_))
    ));
    assert!(!socket.has_outbound_capacity());
}

#[test]
fn test_round_robin_cannot_subscribe() {
    let network = InprocNetwork::new();
    let (transport, _events) = network.transport();
    let mut socket = Socket::round_robin(transport, SocketOptions::default());

    assert!(matches!(
        socket.subscribe("x"),
        Err(WsmqError::UnsupportedOperation(_))
    ));
    assert!(socket.subscriptions().is_none());
}

#[test]
fn test_messages_delivered_to_handler() {
    let network = InprocNetwork::new();
    let listener = network.bind("inproc://feed").unwrap();
    let (mut socket, events) = subscriber(&network);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    socket.set_message_handler(move |msg| sink.borrow_mut().push(msg.get_str(0).unwrap()));

    socket.subscribe("weather").unwrap();
    socket.connect("inproc://feed");
    pump(&mut socket, &events);

    let peer = listener.accept().unwrap();
    let mut update = Message::new();
    update.push_str("weather").push_str("sunny");
    peer.send_message(&update).unwrap();
    pump(&mut socket, &events);

    assert_eq!(*seen.borrow(), vec!["weather".to_string()]);
}

#[test]
fn test_send_ready_once_per_activation() {
    let network = InprocNetwork::new();
    let _one = network.bind("inproc://one").unwrap();
    let _two = network.bind("inproc://two").unwrap();
    let (mut socket, events) = subscriber(&network);

    let ready = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&ready);
    socket.set_send_ready_handler(move || *counter.borrow_mut() += 1);

    socket.connect("inproc://one");
    socket.connect("inproc://two");
    pump(&mut socket, &events);

    assert_eq!(*ready.borrow(), 1);
    assert_eq!(socket.active_endpoints().len(), 2);
}
