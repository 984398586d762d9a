//! Multipart message container with typed frame accessors.
//!
//! A message is an ordered list of frames. Frame 0 is usually a routing or
//! command frame and the rest is payload. Frames can only be appended,
//! inserted at an index, or taken from the front.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::codec;
use crate::error::{Result, WsmqError};

/// A multipart message.
///
/// # Examples
///
/// ```
/// use wsmq_core::message::Message;
///
/// let mut msg = Message::new();
/// msg.push_str("temperature");
/// msg.push_float(21.5, 8).unwrap();
/// msg.push_int(-3, 2).unwrap();
///
/// assert_eq!(msg.len(), 3);
/// assert_eq!(msg.pop_str().unwrap(), "temperature");
/// assert_eq!(msg.get_int(1, 2).unwrap(), -3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    frames: VecDeque<Bytes>,
}

impl Message {
    /// Create a new empty message.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames: VecDeque::new(),
        }
    }

    /// Create a message with room for `capacity` frames.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Create a message from existing frames.
    #[must_use]
    pub fn from_frames(frames: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Get the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the message has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate over the frames in order.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = &Bytes> + '_ {
        self.frames.iter()
    }

    /// Consume the message and return its frames.
    #[must_use]
    pub fn into_frames(self) -> Vec<Bytes> {
        self.frames.into()
    }

    /// Append a raw frame.
    pub fn push(&mut self, frame: impl Into<Bytes>) -> &mut Self {
        self.frames.push_back(frame.into());
        self
    }

    /// Insert a raw frame so that it ends up at `index`.
    ///
    /// `index == len()` appends.
    pub fn insert(&mut self, index: usize, frame: impl Into<Bytes>) -> Result<&mut Self> {
        if index > self.frames.len() {
            return Err(self.no_such_frame(index));
        }
        self.frames.insert(index, frame.into());
        Ok(self)
    }

    /// Remove and return the first frame.
    pub fn pop_front(&mut self) -> Option<Bytes> {
        self.frames.pop_front()
    }

    /// Borrow the frame at `index`.
    pub fn frame(&self, index: usize) -> Result<&Bytes> {
        self.frames
            .get(index)
            .ok_or_else(|| self.no_such_frame(index))
    }

    fn no_such_frame(&self, index: usize) -> WsmqError {
        WsmqError::NoSuchFrame {
            index,
            len: self.frames.len(),
        }
    }

    /// Decode the first frame and remove it only if decoding succeeds.
    fn pop_with<V>(&mut self, decode: impl FnOnce(&[u8]) -> Result<V>) -> Result<V> {
        let value = decode(self.frame(0)?)?;
        self.frames.pop_front();
        Ok(value)
    }

    // --- typed appends ---

    /// Append a boolean frame.
    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        self.push(codec::encode_bool(value))
    }

    /// Append a signed integer frame of `width` bytes.
    pub fn push_int(&mut self, value: i64, width: usize) -> Result<&mut Self> {
        let frame = codec::encode_int(value, width)?;
        Ok(self.push(frame))
    }

    /// Append an unsigned integer frame of `width` bytes.
    pub fn push_uint(&mut self, value: u64, width: usize) -> Result<&mut Self> {
        let frame = codec::encode_uint(value, width)?;
        Ok(self.push(frame))
    }

    /// Append a float frame of `width` bytes.
    pub fn push_float(&mut self, value: f64, width: usize) -> Result<&mut Self> {
        let frame = codec::encode_float(value, width)?;
        Ok(self.push(frame))
    }

    /// Append a string frame (one byte per character, non-ASCII as `?`).
    pub fn push_str(&mut self, value: &str) -> &mut Self {
        self.push(codec::encode_str(value))
    }

    /// Insert a string frame at `index`. `insert_str(0, ..)` prepends.
    pub fn insert_str(&mut self, index: usize, value: &str) -> Result<&mut Self> {
        self.insert(index, codec::encode_str(value))
    }

    // --- typed reads ---

    /// Read the boolean at `index`.
    pub fn get_bool(&self, index: usize) -> Result<bool> {
        codec::decode_bool(self.frame(index)?)
    }

    /// Read the signed integer of `width` bytes at `index`.
    pub fn get_int(&self, index: usize, width: usize) -> Result<i64> {
        codec::decode_int(self.frame(index)?, width)
    }

    /// Read the unsigned integer of `width` bytes at `index`.
    pub fn get_uint(&self, index: usize, width: usize) -> Result<u64> {
        codec::decode_uint(self.frame(index)?, width)
    }

    /// Read the float of `width` bytes at `index`.
    pub fn get_float(&self, index: usize, width: usize) -> Result<f64> {
        codec::decode_float(self.frame(index)?, width)
    }

    /// Read the string at `index`.
    pub fn get_str(&self, index: usize) -> Result<String> {
        Ok(codec::decode_str(self.frame(index)?))
    }

    // --- typed pops ---

    /// Remove and return the first frame, failing on an empty message.
    pub fn pop_frame(&mut self) -> Result<Bytes> {
        self.frames.pop_front().ok_or_else(|| self.no_such_frame(0))
    }

    /// Remove the first frame and decode it as a boolean.
    pub fn pop_bool(&mut self) -> Result<bool> {
        self.pop_with(codec::decode_bool)
    }

    /// Remove the first frame and decode it as a signed integer.
    pub fn pop_int(&mut self, width: usize) -> Result<i64> {
        self.pop_with(|frame| codec::decode_int(frame, width))
    }

    /// Remove the first frame and decode it as an unsigned integer.
    pub fn pop_uint(&mut self, width: usize) -> Result<u64> {
        self.pop_with(|frame| codec::decode_uint(frame, width))
    }

    /// Remove the first frame and decode it as a float.
    pub fn pop_float(&mut self, width: usize) -> Result<f64> {
        self.pop_with(|frame| codec::decode_float(frame, width))
    }

    /// Remove the first frame and decode it as a string.
    pub fn pop_str(&mut self) -> Result<String> {
        self.pop_with(|frame| Ok(codec::decode_str(frame)))
    }
}

impl From<Vec<Bytes>> for Message {
    fn from(frames: Vec<Bytes>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl From<Message> for Vec<Bytes> {
    fn from(msg: Message) -> Self {
        msg.into_frames()
    }
}

impl FromIterator<Bytes> for Message {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        Self::from_frames(iter)
    }
}
