use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    api::{
        errors::{not_a_party, OrderFlowError, ValidationErrors},
        order_objects::{CheckoutResult, DeliveryDetails, GroupFailure, OrderPolicy},
    },
    cart::SupplierGroup,
    db_types::{
        Actor,
        LineItem,
        Money,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        OrderUpdate,
        PaymentStatus,
        ProductId,
        Rating,
        Role,
    },
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    fanout::{FanoutService, NotificationEvent, NotificationType, RoomKey},
    helpers::new_order_number,
    traits::MarketplaceDatabase,
};

/// `OrderFlowApi` is the primary API for the order transaction path: cart checkout, order creation against live
/// stock, the lifecycle state machine, and ratings. Every committed change is fanned out to both parties' rooms and
/// mirrored to the external notifier hooks, both best-effort.
pub struct OrderFlowApi<B> {
    db: B,
    policy: OrderPolicy,
    producers: EventProducers,
    fanout: FanoutService,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, policy: OrderPolicy, producers: EventProducers, fanout: FanoutService) -> Self {
        Self { db, policy, producers, fanout }
    }

    pub fn fanout(&self) -> &FanoutService {
        &self.fanout
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Create one order for one supplier.
    ///
    /// All preconditions are checked before any stock is touched, and every violation is reported in one cumulative
    /// list. Stock is then reserved line by line through the store's conditional decrement; the first line that
    /// fails aborts the order, and every line reserved before it is released again before the error is returned, so
    /// no partial decrement stays visible once the call completes. Pricing is read from the reservation snapshots
    /// and frozen into the order.
    ///
    /// On success the order is persisted in `pending` status, the supplier's room receives a `new-order-received`
    /// event, the vendor's room an `order-confirmed` event, and the order-created notifier hook fires. All
    /// post-commit notifications are best-effort; their failure never rolls back the committed order.
    pub async fn create_order(&self, vendor: &Actor, request: NewOrder) -> Result<Order, OrderFlowError> {
        if vendor.role != Role::Vendor {
            return Err(OrderFlowError::NotPermitted("Only vendors may place orders".to_string()));
        }
        self.validate_order_request(&request).await?;
        let (items, reserved) = self.reserve_lines(&request).await?;

        let subtotal: Money = items.iter().map(|i| i.line_total).sum();
        let delivery_fee = self.policy.pricing.delivery_fee_for(subtotal);
        let now = Utc::now();
        let order = Order {
            order_id: new_order_number(),
            vendor_id: vendor.id.clone(),
            supplier_id: request.supplier_id.clone(),
            items,
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
            status: OrderStatusType::Pending,
            payment_method: request.payment_method.unwrap_or_default(),
            payment_status: PaymentStatus::default(),
            delivery_address: request.delivery_address.trim().to_string(),
            // Validation guarantees the date is present.
            delivery_date: request.delivery_date.ok_or_else(|| {
                OrderFlowError::Internal("delivery date missing after validation".to_string())
            })?,
            delivery_time: request.delivery_time.clone(),
            notes: request.notes.clone(),
            estimated_delivery_at: None,
            delivered_at: None,
            rating: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.db.insert_order(order.clone()).await {
            // The order never committed, so the reservation must not stay visible either.
            self.release_reservations(&reserved).await;
            return Err(e.into());
        }
        debug!("📦️ Order {} created for vendor {} against supplier {}", order.order_id, order.vendor_id, order.supplier_id);

        self.publish_order_event(NotificationType::NewOrderReceived, &order, &RoomKey::Supplier(order.supplier_id.clone()));
        self.publish_order_event(NotificationType::OrderConfirmed, &order, &RoomKey::User(order.vendor_id.clone()));
        self.call_order_created_hook(&order).await;
        Ok(order)
    }

    /// Check out a multi-supplier cart: one [`Self::create_order`] call per supplier group.
    ///
    /// There is deliberately no cross-group atomicity. A group that fails leaves the groups already committed fully
    /// committed, and the result spells out which groups landed and which did not, with the reasons.
    pub async fn checkout_cart(
        &self,
        vendor: &Actor,
        groups: &[SupplierGroup],
        delivery: &DeliveryDetails,
    ) -> Result<CheckoutResult, OrderFlowError> {
        if groups.is_empty() {
            return Err(OrderFlowError::validation("Cart is empty"));
        }
        let mut result = CheckoutResult::default();
        for group in groups {
            let request = NewOrder {
                supplier_id: group.supplier_id.clone(),
                items: group.line_requests(),
                delivery_address: delivery.address.clone(),
                delivery_date: delivery.date,
                delivery_time: delivery.time.clone(),
                payment_method: delivery.payment_method,
                notes: delivery.notes.clone(),
            };
            match self.create_order(vendor, request).await {
                Ok(order) => result.orders.push(order),
                Err(e) => {
                    info!("📦️ Checkout group for supplier {} failed: {e}", group.supplier_id);
                    result.failures.push(GroupFailure { supplier_id: group.supplier_id.clone(), reasons: e.reasons() });
                },
            }
        }
        debug!(
            "📦️ Checkout complete for vendor {}: {} group(s) committed, {} failed",
            vendor.id,
            result.orders.len(),
            result.failures.len()
        );
        Ok(result)
    }

    /// Move an order to a new status.
    ///
    /// The transition table and the acting role it demands live on [`OrderStatusType::transition_role`]; on top of
    /// that the actor must be the relevant party of this very order, and `rejected`/`cancelled` require a reason.
    /// The status, its side-effect timestamp and the reason are applied as a single store write. Both parties' rooms
    /// then receive an `order-updated` event and the status-changed notifier hook fires, best-effort.
    pub async fn transition_order(
        &self,
        actor: &Actor,
        order_id: &OrderId,
        new_status: OrderStatusType,
        reason: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        let from = order.status;
        let Some(required_role) = from.transition_role(new_status) else {
            return Err(OrderFlowError::IllegalTransition { from, to: new_status });
        };
        if actor.role != required_role {
            return Err(OrderFlowError::NotPermitted(format!(
                "Only the {required_role} may move an order from {from} to {new_status}"
            )));
        }
        let expected_party = match required_role {
            Role::Supplier => &order.supplier_id,
            Role::Vendor => &order.vendor_id,
        };
        if &actor.id != expected_party {
            return Err(not_a_party(&actor.id, order_id));
        }

        let mut update = OrderUpdate::default().with_status(new_status);
        match new_status {
            OrderStatusType::Accepted => {
                update = update.with_estimated_delivery_at(Utc::now() + self.policy.estimated_delivery_offset);
            },
            OrderStatusType::Delivered => {
                update = update.with_delivered_at(Utc::now());
            },
            s if s.requires_reason() => {
                let reason = reason.map(str::trim).filter(|r| !r.is_empty());
                match reason {
                    Some(r) => update = update.with_cancellation_reason(r),
                    None => return Err(OrderFlowError::ReasonRequired(new_status)),
                }
            },
            _ => {},
        }

        let updated = self.db.update_order(order_id, update).await?;
        debug!("📦️ Order {order_id} moved {from} -> {new_status} by {} {}", actor.role, actor.id);
        self.publish_order_event(NotificationType::OrderUpdated, &updated, &RoomKey::User(updated.vendor_id.clone()));
        self.publish_order_event(
            NotificationType::OrderUpdated,
            &updated,
            &RoomKey::Supplier(updated.supplier_id.clone()),
        );
        self.call_status_changed_hook(&updated, from).await;
        Ok(updated)
    }

    /// Attach the vendor's once-off rating to a delivered order.
    pub async fn add_rating(
        &self,
        actor: &Actor,
        order_id: &OrderId,
        stars: u8,
        review: Option<String>,
    ) -> Result<Order, OrderFlowError> {
        if !(1..=5).contains(&stars) {
            return Err(OrderFlowError::validation("Rating must be between 1 and 5 stars"));
        }
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if actor.role != Role::Vendor || actor.id != order.vendor_id {
            return Err(OrderFlowError::NotPermitted(format!(
                "Only the vendor of order {order_id} may rate it"
            )));
        }
        if order.status != OrderStatusType::Delivered {
            return Err(OrderFlowError::RatingNotAllowed(format!(
                "Order {order_id} is {}; only delivered orders can be rated",
                order.status
            )));
        }
        let rating = Rating { stars, review, rated_at: Utc::now() };
        let updated = self.db.set_rating(order_id, rating).await?;
        debug!("📦️ Order {order_id} rated {stars} star(s)");
        Ok(updated)
    }

    /// Fetch one order, restricted to its two parties.
    pub async fn order_for_actor(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if !order.involves(&actor.id) {
            return Err(not_a_party(&actor.id, order_id));
        }
        Ok(order)
    }

    /// All orders on the actor's side of the marketplace, oldest first.
    pub async fn orders_for_actor(&self, actor: &Actor) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.fetch_orders_for_user(&actor.id, actor.role).await?)
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    async fn validate_order_request(&self, request: &NewOrder) -> Result<(), OrderFlowError> {
        let mut errors = ValidationErrors::new();
        match self.db.fetch_user(&request.supplier_id).await? {
            Some(user) if user.role == Role::Supplier => {},
            Some(_) => errors.push(format!("User {} is not a supplier", request.supplier_id)),
            None => errors.push(format!("Supplier {} does not exist", request.supplier_id)),
        }
        if request.items.is_empty() {
            errors.push("Order must contain at least one item");
        }
        for (idx, line) in request.items.iter().enumerate() {
            if line.product_id.as_str().trim().is_empty() {
                errors.push(format!("Item {} has no product id", idx + 1));
            }
            if line.quantity < 1 {
                errors.push(format!("Item {} must have a quantity of at least 1", idx + 1));
            }
        }
        if request.delivery_address.trim().is_empty() {
            errors.push("Delivery address must not be blank");
        }
        match request.delivery_date {
            None => errors.push("Delivery date is required"),
            // Date-only comparison: ordering for later today is fine.
            Some(date) if date < Utc::now().date_naive() => {
                errors.push(format!("Delivery date {date} is in the past"));
            },
            Some(_) => {},
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(OrderFlowError::Validation(errors))
        }
    }

    /// Reserve stock for every line, building the frozen line-item snapshots from the reservation results. If any
    /// line fails, all earlier reservations are released before the error propagates.
    async fn reserve_lines(&self, request: &NewOrder) -> Result<(Vec<LineItem>, Vec<(ProductId, i64)>), OrderFlowError> {
        let mut items = Vec::with_capacity(request.items.len());
        let mut reserved: Vec<(ProductId, i64)> = Vec::with_capacity(request.items.len());
        for line in &request.items {
            match self.db.reserve_stock(&line.product_id, line.quantity).await {
                Ok(product) => {
                    items.push(LineItem {
                        product_id: product.id,
                        name: product.name,
                        quantity: line.quantity,
                        unit_price: product.unit_price,
                        line_total: product.unit_price * line.quantity,
                    });
                    reserved.push((line.product_id.clone(), line.quantity));
                },
                Err(e) => {
                    debug!("📦️ Reservation failed on product {}: {e}. Rolling back {} line(s)", line.product_id, reserved.len());
                    self.release_reservations(&reserved).await;
                    return Err(e.into());
                },
            }
        }
        Ok((items, reserved))
    }

    /// The compensating rollback for a partially-reserved request. A release that fails here leaves stock
    /// under-counted with no further recourse, so it is logged loudly.
    async fn release_reservations(&self, reserved: &[(ProductId, i64)]) {
        for (product_id, qty) in reserved {
            if let Err(e) = self.db.release_stock(product_id, *qty).await {
                error!("📦️ Failed to release {qty} reserved unit(s) of {product_id}: {e}. Stock needs reconciliation.");
            }
        }
    }

    fn publish_order_event(&self, event_type: NotificationType, order: &Order, room: &RoomKey) {
        match serde_json::to_value(order) {
            Ok(payload) => {
                let event = NotificationEvent::new(event_type, order.order_id.clone(), payload);
                self.fanout.publish(room, &event);
            },
            Err(e) => error!("📦️ Could not serialize order {} for fan-out: {e}", order.order_id),
        }
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producers {
            trace!("📦️ Notifying order-created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
    }

    async fn call_status_changed_hook(&self, order: &Order, old_status: OrderStatusType) {
        for emitter in &self.producers.status_changed_producers {
            trace!("📦️ Notifying status-changed hook subscribers");
            emitter.publish_event(OrderStatusChangedEvent::new(order.clone(), old_status)).await;
        }
    }
}
