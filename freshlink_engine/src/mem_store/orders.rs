use chrono::Utc;
use log::trace;

use crate::{
    db_types::{Order, OrderId, OrderUpdate, Rating, Role, UserId},
    mem_store::db::{read, write, Documents},
    traits::StorageError,
};

pub(crate) fn insert_order(docs: &Documents, order: Order) -> Result<(), StorageError> {
    let mut guard = write(&docs.orders)?;
    if guard.contains_key(&order.order_id) {
        return Err(StorageError::DuplicateOrderId(order.order_id));
    }
    trace!("🗃️ Inserted order {}", order.order_id);
    guard.insert(order.order_id.clone(), order);
    Ok(())
}

pub(crate) fn fetch_order(docs: &Documents, id: &OrderId) -> Result<Option<Order>, StorageError> {
    Ok(read(&docs.orders)?.get(id).cloned())
}

/// Orders in which the user participates on the given side, oldest first.
pub(crate) fn fetch_orders_for_user(
    docs: &Documents,
    user: &UserId,
    role: Role,
) -> Result<Vec<Order>, StorageError> {
    let guard = read(&docs.orders)?;
    let mut orders: Vec<Order> = guard
        .values()
        .filter(|o| match role {
            Role::Vendor => &o.vendor_id == user,
            Role::Supplier => &o.supplier_id == user,
        })
        .cloned()
        .collect();
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(orders)
}

pub(crate) fn update_order(docs: &Documents, id: &OrderId, update: OrderUpdate) -> Result<Order, StorageError> {
    let mut guard = write(&docs.orders)?;
    let order = guard.get_mut(id).ok_or_else(|| StorageError::OrderNotFound(id.clone()))?;
    if update.is_empty() {
        trace!("🗃️ No fields to update for order {id}. Update request skipped.");
        return Ok(order.clone());
    }
    if let Some(status) = update.status {
        order.status = status;
    }
    if let Some(at) = update.estimated_delivery_at {
        order.estimated_delivery_at = Some(at);
    }
    if let Some(at) = update.delivered_at {
        order.delivered_at = Some(at);
    }
    if let Some(reason) = update.cancellation_reason {
        order.cancellation_reason = Some(reason);
    }
    order.updated_at = Utc::now();
    Ok(order.clone())
}

pub(crate) fn set_rating(docs: &Documents, id: &OrderId, rating: Rating) -> Result<Order, StorageError> {
    let mut guard = write(&docs.orders)?;
    let order = guard.get_mut(id).ok_or_else(|| StorageError::OrderNotFound(id.clone()))?;
    if order.rating.is_some() {
        return Err(StorageError::AlreadyRated(id.clone()));
    }
    order.rating = Some(rating);
    order.updated_at = Utc::now();
    Ok(order.clone())
}
