//! Realtime push channel for the fixly client stack.
//!
//! One [`RealtimeChannel`] per authenticated identity: it joins the
//! user's room on connect, fans typed [`ServerEvent`]s out to
//! subscribers, sends [`ClientEvent`]s, and quietly reconnects with
//! back-off when the connection drops.

pub mod channel;
pub mod error;
pub mod events;

pub use channel::{RealtimeChannel, ReconnectPolicy};
pub use error::RealtimeError;
pub use events::{ClientEvent, ServerEvent};
