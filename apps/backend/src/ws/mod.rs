//! Broadcast relay: in-process hub plus the WebSocket bridge for remote clients.

pub mod hub;
pub mod protocol;
pub mod session;

pub use hub::{BroadcastHub, Subscription};
pub use protocol::{Envelope, PlayerSnapshot, RoundSignal, Topic};
