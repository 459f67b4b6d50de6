use crate::db_types::{Order, OrderStatusType};

/// Emitted once for every order committed by the transaction builder. Feeds the outbound "you have a new order /
/// your order is confirmed" notifier collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted after every successful status transition. Carries the status the order moved away from; the order itself
/// already holds the new one.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType) -> Self {
        Self { order, old_status }
    }
}
