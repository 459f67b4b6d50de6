use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, Role, UserId};

//--------------------------------------       RoomKey        --------------------------------------------------------
/// A named broadcast channel. Every client joins their own user room; suppliers additionally join their supplier
/// room, which is where new-order traffic lands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomKey {
    User(UserId),
    Supplier(UserId),
}

impl Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomKey::User(id) => write!(f, "user-{id}"),
            RoomKey::Supplier(id) => write!(f, "supplier-{id}"),
        }
    }
}

//--------------------------------------   NotificationType   --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    NewOrderReceived,
    OrderConfirmed,
    OrderUpdated,
    NewMessage,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::NewOrderReceived => write!(f, "new-order-received"),
            NotificationType::OrderConfirmed => write!(f, "order-confirmed"),
            NotificationType::OrderUpdated => write!(f, "order-updated"),
            NotificationType::NewMessage => write!(f, "new-message"),
        }
    }
}

//--------------------------------------  NotificationEvent   --------------------------------------------------------
/// The envelope delivered to room members. Transient: events exist only on the wire and in per-connection queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub event_type: NotificationType,
    pub order_id: OrderId,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(event_type: NotificationType, order_id: OrderId, payload: serde_json::Value) -> Self {
        Self { event_type, order_id, payload, timestamp: Utc::now() }
    }
}

//--------------------------------------     ChatMessage      --------------------------------------------------------
/// One chat line between the two parties of an order. Broadcast-only; never persisted, so a participant that joins
/// after it was sent will never see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub order_id: OrderId,
    pub sender_id: UserId,
    pub sender_role: Role,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}
