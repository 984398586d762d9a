//! Continuation-flagged framing.
//!
//! Every frame of a message travels as its own transport message:
//!
//! ```text
//! byte 0     : 1 = more frames follow, 0 = last frame of this message
//! bytes 1..N : frame payload
//! ```
//!
//! There is no length prefix; the transport message boundary is the frame
//! boundary.

use bytes::{BufMut, Bytes, BytesMut};
use smallvec::SmallVec;
use wsmq_core::error::{Result, WsmqError};
use wsmq_core::message::Message;

use crate::transport::Payload;

/// Marker for "another frame of this message follows".
pub const MORE: u8 = 1;

/// Marker for the final frame of a message.
pub const LAST: u8 = 0;

/// Prefix `payload` with its continuation marker.
#[must_use]
pub fn encode_frame(payload: &[u8], more: bool) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + 1);
    buf.put_u8(if more { MORE } else { LAST });
    buf.extend_from_slice(payload);
    buf.freeze()
}

/// Wire frames for `message`, in order. Only the last one carries [`LAST`].
pub fn encode_message(message: &Message) -> impl Iterator<Item = Bytes> + '_ {
    let last = message.len().saturating_sub(1);
    message
        .frames()
        .enumerate()
        .map(move |(i, frame)| encode_frame(frame, i < last))
}

/// Turn an inbound transport payload into raw wire bytes.
pub fn decode_payload(payload: Payload) -> Result<Bytes> {
    match payload {
        Payload::Binary(bytes) => Ok(bytes),
        Payload::Text(text) => parse_text(&text).map(Bytes::from),
    }
}

fn parse_text(text: &str) -> Result<Vec<u8>> {
    text.split(',')
        .map(|field| {
            field.trim().parse::<u8>().map_err(|e| {
                WsmqError::invalid_payload(format!("bad byte value {field:?} in text payload: {e}"))
            })
        })
        .collect()
}

/// Reassembles inbound wire frames into messages.
///
/// Holds at most one partial message. Frames must arrive in order.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    frames: SmallVec<[Bytes; 4]>,
}

impl FrameAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one wire frame.
    ///
    /// Returns the completed message when `wire` carried the last-frame
    /// marker. An empty frame is rejected and leaves the partial message
    /// untouched.
    pub fn push(&mut self, mut wire: Bytes) -> Result<Option<Message>> {
        if wire.is_empty() {
            return Err(WsmqError::invalid_payload("missing continuation marker"));
        }

        let marker = wire[0];
        let payload = wire.split_off(1);
        self.frames.push(payload);

        if marker == LAST {
            Ok(Some(Message::from_frames(self.frames.drain(..))))
        } else {
            Ok(None)
        }
    }

    /// Number of frames of the partial message.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Drop the partial message, if any.
    pub fn reset(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(frames: &[&'static [u8]]) -> Message {
        frames.iter().map(|f| Bytes::from_static(*f)).collect()
    }

    #[test]
    fn test_single_frame_uses_last_marker() {
        let mut msg = Message::new();
        msg.push_str("ping");

        let wire: Vec<_> = encode_message(&msg).collect();
        assert_eq!(wire.len(), 1);
        assert_eq!(&wire[0][..], b"\x00ping");
    }

    #[test]
    fn test_markers_on_multipart() {
        let msg = message(&[b"a", b"", b"ccc"]);
        let wire: Vec<_> = encode_message(&msg).collect();

        assert_eq!(&wire[0][..], b"\x01a");
        assert_eq!(&wire[1][..], b"\x01");
        assert_eq!(&wire[2][..], b"\x00ccc");
    }

    #[test]
    fn test_reassembly_inverts_framing() {
        let originals = [
            message(&[b"only"]),
            message(&[b"cmd", b"x", b"y", b"z"]),
            message(&[b"", b""]),
        ];

        let mut assembler = FrameAssembler::new();
        for original in originals {
            let wire: Vec<_> = encode_message(&original).collect();
            let n = wire.len();
            for (i, frame) in wire.into_iter().enumerate() {
                let out = assembler.push(frame).unwrap();
                if i + 1 < n {
                    assert!(out.is_none());
                } else {
                    assert_eq!(out.unwrap(), original);
                }
            }
            assert_eq!(assembler.pending_frames(), 0);
        }
    }

    #[test]
    fn test_any_nonzero_marker_means_more() {
        let mut assembler = FrameAssembler::new();
        assert!(assembler.push(Bytes::from_static(b"\x07a")).unwrap().is_none());
        let msg = assembler.push(Bytes::from_static(b"\x00b")).unwrap().unwrap();
        assert_eq!(msg, message(&[b"a", b"b"]));
    }

    #[test]
    fn test_empty_frame_keeps_partial() {
        let mut assembler = FrameAssembler::new();
        assembler.push(Bytes::from_static(b"\x01head")).unwrap();

        assert!(matches!(
            assembler.push(Bytes::new()),
            Err(WsmqError::InvalidPayload(_))
        ));
        assert_eq!(assembler.pending_frames(), 1);

        let msg = assembler.push(Bytes::from_static(b"\x00tail")).unwrap().unwrap();
        assert_eq!(msg, message(&[b"head", b"tail"]));
    }

    #[test]
    fn test_text_payloads() {
        let bytes = decode_payload(Payload::Text("0, 112,105,110,103".into())).unwrap();
        assert_eq!(&bytes[..], b"\x00ping");

        assert!(decode_payload(Payload::Text("1,256".into())).is_err());
        assert!(decode_payload(Payload::Text("hello".into())).is_err());
        assert!(decode_payload(Payload::Text(String::new())).is_err());
    }
}
