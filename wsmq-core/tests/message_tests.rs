//! Integration tests for the message container and its typed fields

use bytes::Bytes;
use wsmq_core::prelude::*;

#[test]
fn test_build_and_read_back() {
    let mut msg = Message::new();
    msg.push_str("reading")
        .push_bool(true)
        .push_int(-12, 1)
        .unwrap()
        .push_uint(65_000, 2)
        .unwrap()
        .push_float(0.5, 4)
        .unwrap();

    assert_eq!(msg.len(), 5);
    assert_eq!(msg.get_str(0).unwrap(), "reading");
    assert!(msg.get_bool(1).unwrap());
    assert_eq!(msg.get_int(2, 1).unwrap(), -12);
    assert_eq!(msg.get_uint(3, 2).unwrap(), 65_000);
    assert!((msg.get_float(4, 4).unwrap() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_pops_consume_front_to_back() {
    let mut msg = Message::new();
    msg.push_str("header").push_int(1_000_000, 4).unwrap();
    msg.push_float(-2.25, 8).unwrap();

    assert_eq!(msg.pop_str().unwrap(), "header");
    assert_eq!(msg.pop_int(4).unwrap(), 1_000_000);
    assert!((msg.pop_float(8).unwrap() + 2.25).abs() < f64::EPSILON);
    assert!(msg.is_empty());
    assert!(matches!(msg.pop_frame(), Err(WsmqError::NoSuchFrame { .. })));
}

#[test]
fn test_failed_pop_keeps_frame() {
    let mut msg = Message::new();
    msg.push(Bytes::from_static(b"\x01"));

    assert!(matches!(
        msg.pop_int(4),
        Err(WsmqError::FrameTooShort { needed: 4, actual: 1 })
    ));
    assert!(matches!(
        msg.pop_int(3),
        Err(WsmqError::InvalidFieldWidth { width: 3, .. })
    ));
    assert_eq!(msg.len(), 1);
    assert!(msg.pop_bool().unwrap());
}

#[test]
fn test_width_and_range_checks() {
    let mut msg = Message::new();

    assert!(matches!(
        msg.push_int(1, 8),
        Err(WsmqError::InvalidFieldWidth { width: 8, .. })
    ));
    assert!(matches!(
        msg.push_float(1.0, 2),
        Err(WsmqError::InvalidFieldWidth { width: 2, .. })
    ));
    assert!(matches!(
        msg.push_uint(256, 1),
        Err(WsmqError::ValueOutOfRange { .. })
    ));
    assert!(msg.is_empty());
}

#[test]
fn test_insert_str_prepends() {
    let mut msg = Message::new();
    msg.push_str("body");
    msg.insert_str(0, "routing").unwrap();

    let frames: Vec<_> = msg.frames().cloned().collect();
    assert_eq!(
        frames,
        vec![Bytes::from_static(b"routing"), Bytes::from_static(b"body")]
    );
    assert!(msg.insert_str(5, "x").is_err());
}

#[test]
fn test_non_ascii_strings_are_replaced() {
    let mut msg = Message::new();
    msg.push_str("caf\u{e9}");
    assert_eq!(&msg.frame(0).unwrap()[..], b"caf?");
    assert_eq!(msg.get_str(0).unwrap(), "caf?");
}

#[test]
fn test_conversions() {
    let frames = vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")];
    let msg = Message::from(frames.clone());
    assert_eq!(Vec::<Bytes>::from(msg.clone()), frames);
    assert_eq!(msg.into_frames(), frames);
}
