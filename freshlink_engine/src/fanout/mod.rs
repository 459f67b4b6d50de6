//! Real-time fan-out: rooms, the connection registry, and the order-scoped chat relay.
//!
//! Delivery here is at-most-once and best-effort by contract. A member that is disconnected, slow, or joined late
//! simply misses events; there is no durable backlog and no replay on reconnect. Callers that need a guarantee must
//! query the persisted order instead.

mod chat;
mod messages;
mod registry;

pub use chat::ChatRelay;
pub use messages::{ChatMessage, NotificationEvent, NotificationType, RoomKey};
pub use registry::{ConnectionId, FanoutService};
