//! Notification handlers.
//!
//! ## Commands
//! - Admin broadcast to a filtered audience

mod send_broadcast;

pub use send_broadcast::{SendBroadcastCommand, SendBroadcastHandler, SendBroadcastResult, ALL};
