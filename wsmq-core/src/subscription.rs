//! Topic subscriptions for SUB-style sockets.
//!
//! [`SubscriptionSet`] is the local record of which prefixes the socket has
//! asked for; [`SubscriptionEvent`] is the control frame that tells a peer
//! about a change.

use bytes::Bytes;

use crate::message::Message;

/// Subscribed topic prefixes in subscribe order.
///
/// Order matters: a freshly connected peer is brought up to date by
/// replaying the set front to back.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionSet {
    topics: Vec<Bytes>,
}

impl SubscriptionSet {
    /// Create a new empty subscription set
    #[must_use]
    pub const fn new() -> Self {
        Self { topics: Vec::new() }
    }

    /// Add a topic. Returns `false` if it was already present.
    pub fn subscribe(&mut self, topic: Bytes) -> bool {
        if self.contains(&topic) {
            return false;
        }
        self.topics.push(topic);
        true
    }

    /// Remove a topic. Returns `false` if it was not present.
    pub fn unsubscribe(&mut self, topic: &[u8]) -> bool {
        match self.topics.iter().position(|t| t[..] == *topic) {
            Some(pos) => {
                self.topics.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Check whether `topic` is subscribed (exact match, not prefix match).
    #[must_use]
    pub fn contains(&self, topic: &[u8]) -> bool {
        self.topics.iter().any(|t| t[..] == *topic)
    }

    /// Iterate over the topics in subscribe order.
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> + '_ {
        self.topics.iter()
    }

    /// Check if there are no subscriptions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Get the number of subscriptions
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }
}

/// Subscription change sent to a peer as a one-frame control message.
///
/// Format: `[0x01|0x00] [topic prefix...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// Start receiving messages with this prefix
    Subscribe(Bytes),
    /// Stop receiving messages with this prefix
    Unsubscribe(Bytes),
}

impl SubscriptionEvent {
    /// Parse a control frame.
    #[must_use]
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        let (&cmd, topic) = frame.split_first()?;
        let topic = Bytes::copy_from_slice(topic);
        match cmd {
            0x01 => Some(Self::Subscribe(topic)),
            0x00 => Some(Self::Unsubscribe(topic)),
            _ => None,
        }
    }

    /// Encode this event as a control frame.
    #[must_use]
    pub fn to_frame(&self) -> Bytes {
        let (cmd, topic) = match self {
            Self::Subscribe(t) => (0x01u8, t),
            Self::Unsubscribe(t) => (0x00u8, t),
        };

        let mut frame = Vec::with_capacity(1 + topic.len());
        frame.push(cmd);
        frame.extend_from_slice(topic);
        Bytes::from(frame)
    }

    /// Wrap the control frame as the only frame of a message.
    #[must_use]
    pub fn to_message(&self) -> Message {
        Message::from(vec![self.to_frame()])
    }

    /// Get the topic prefix
    #[must_use]
    pub const fn topic(&self) -> &Bytes {
        match self {
            Self::Subscribe(t) | Self::Unsubscribe(t) => t,
        }
    }

    /// Check if this is a subscribe event
    #[must_use]
    pub const fn is_subscribe(&self) -> bool {
        matches!(self, Self::Subscribe(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_order_and_dedupes() {
        let mut set = SubscriptionSet::new();
        assert!(set.subscribe(Bytes::from_static(b"b")));
        assert!(set.subscribe(Bytes::from_static(b"a")));
        assert!(!set.subscribe(Bytes::from_static(b"b")));

        let topics: Vec<_> = set.iter().cloned().collect();
        assert_eq!(topics, vec![Bytes::from_static(b"b"), Bytes::from_static(b"a")]);

        assert!(set.unsubscribe(b"b"));
        assert!(!set.unsubscribe(b"b"));
        assert_eq!(set.len(), 1);
        assert!(set.contains(b"a"));
    }

    #[test]
    fn test_subscribe_frame() {
        let sub = SubscriptionEvent::Subscribe(Bytes::from_static(b"topic"));
        let frame = sub.to_frame();

        assert_eq!(frame[0], 0x01);
        assert_eq!(&frame[1..], b"topic");
        assert_eq!(SubscriptionEvent::from_frame(&frame), Some(sub));
    }

    #[test]
    fn test_unsubscribe_frame() {
        let unsub = SubscriptionEvent::Unsubscribe(Bytes::from_static(b"topic"));
        let msg = unsub.to_message();

        assert_eq!(msg.len(), 1);
        assert_eq!(&msg.frame(0).unwrap()[..], b"\x00topic");
        assert!(!unsub.is_subscribe());
    }

    #[test]
    fn test_invalid_frames() {
        assert_eq!(SubscriptionEvent::from_frame(&[]), None);
        assert_eq!(SubscriptionEvent::from_frame(&[0x02, b'x']), None);
        assert_eq!(
            SubscriptionEvent::from_frame(&[0x01]),
            Some(SubscriptionEvent::Subscribe(Bytes::new()))
        );
    }
}
