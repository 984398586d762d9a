//! wsmq Core
//!
//! This crate contains the transport-agnostic building blocks:
//! - Typed little-endian value codec (`codec`)
//! - Multipart message container (`message`)
//! - Round-robin load balancer (`load_balancer`)
//! - Subscription set + control frames (`subscription`)
//! - Reconnect policy and socket options (`reconnect`, `options`)
//! - Lifecycle monitoring (`monitor`)
//! - Error types (`error`)

#![deny(unsafe_code)]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::new_without_default)]
pub mod codec;
pub mod error;
pub mod load_balancer;
pub mod message;
pub mod monitor;
pub mod options;
pub mod reconnect;
pub mod socket_type;
pub mod subscription;

/// Types the wire and facade crates import together.
pub mod prelude {
    pub use crate::error::{Result, WsmqError};
    pub use crate::load_balancer::LoadBalancer;
    pub use crate::message::Message;
    pub use crate::monitor::{SocketEvent, SocketMonitor};
    pub use crate::options::SocketOptions;
    pub use crate::reconnect::ReconnectState;
    pub use crate::socket_type::SocketKind;
    pub use crate::subscription::{SubscriptionEvent, SubscriptionSet};
}
