#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use wsmq_core::message::Message;
use wsmq_core::subscription::SubscriptionEvent;
use wsmq_wire::framing::{decode_payload, encode_message, FrameAssembler};
use wsmq_wire::transport::Payload;

fuzz_target!(|data: &[u8]| {
    // First byte picks the chunk size, the rest is a stream of wire frames
    let Some((&chunk, rest)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk % 16) + 1;

    let mut assembler = FrameAssembler::new();
    for wire in rest.chunks(chunk) {
        if let Ok(Some(msg)) = assembler.push(Bytes::copy_from_slice(wire)) {
            check_reframe(&msg);
            for frame in msg.frames() {
                let _ = SubscriptionEvent::from_frame(frame);
            }
        }
    }

    // The same bytes as a text payload must never panic
    if let Ok(text) = std::str::from_utf8(rest) {
        let _ = decode_payload(Payload::Text(text.to_string()));
    }
});

// Encoding a reassembled message and reassembling it again is lossless
fn check_reframe(msg: &Message) {
    let mut assembler = FrameAssembler::new();
    let mut out = None;
    for wire in encode_message(msg) {
        out = assembler.push(wire).expect("encoded frames carry a marker");
    }
    assert_eq!(out.as_ref(), Some(msg));
}
