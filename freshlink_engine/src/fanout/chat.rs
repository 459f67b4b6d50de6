use chrono::Utc;
use log::*;

use crate::{
    api::errors::{not_a_party, OrderFlowError},
    db_types::{Actor, OrderId, Role},
    fanout::{ChatMessage, FanoutService, NotificationEvent, NotificationType, RoomKey},
    traits::MarketplaceDatabase,
};

/// Routes chat between the two parties of one order. A thin specialization of the fan-out service: the relay only
/// resolves the receiver's room and publishes; it stores nothing and promises nothing beyond best-effort delivery to
/// whoever is connected right now.
#[derive(Clone)]
pub struct ChatRelay<B> {
    db: B,
    fanout: FanoutService,
}

impl<B> std::fmt::Debug for ChatRelay<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChatRelay")
    }
}

impl<B> ChatRelay<B>
where B: MarketplaceDatabase
{
    pub fn new(db: B, fanout: FanoutService) -> Self {
        Self { db, fanout }
    }

    /// Relay one message from `sender` to the opposite party of the order. The receiver's room is their supplier
    /// room when the receiver is the order's supplier, and their user room otherwise. Returns the message as
    /// published; whether anyone was connected to receive it is deliberately not part of the result.
    pub async fn send_message(
        &self,
        sender: &Actor,
        order_id: &OrderId,
        body: &str,
    ) -> Result<ChatMessage, OrderFlowError> {
        if body.trim().is_empty() {
            return Err(OrderFlowError::validation("Chat message body must not be blank"));
        }
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        let Some(receiver) = order.counterparty(&sender.id) else {
            return Err(not_a_party(&sender.id, order_id));
        };
        let room = if receiver == &order.supplier_id {
            RoomKey::Supplier(receiver.clone())
        } else {
            RoomKey::User(receiver.clone())
        };
        let message = ChatMessage {
            order_id: order_id.clone(),
            sender_id: sender.id.clone(),
            sender_role: sender.role,
            body: body.trim().to_string(),
            timestamp: Utc::now(),
        };
        let payload = serde_json::to_value(&message)
            .map_err(|e| OrderFlowError::Internal(format!("Could not serialize chat message: {e}")))?;
        let event = NotificationEvent::new(NotificationType::NewMessage, order_id.clone(), payload);
        let delivered = self.fanout.publish(&room, &event);
        debug!("💬️ Chat on order {order_id} relayed to {delivered} member(s) of {room}");
        Ok(message)
    }
}
