use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    cart::PricingPolicy,
    db_types::{Money, Order, PaymentMethod, UserId},
};

/// Everything the order flow needs to price and schedule an order: the delivery-fee knobs shared with the cart, and
/// the fixed offset applied to `estimated_delivery_at` when a supplier accepts.
#[derive(Debug, Clone, Copy)]
pub struct OrderPolicy {
    pub pricing: PricingPolicy,
    pub estimated_delivery_offset: Duration,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self { pricing: PricingPolicy::default(), estimated_delivery_offset: Duration::hours(24) }
    }
}

/// The delivery and payment details shared by every order group in a checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub address: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// The outcome of one supplier group that could not be committed. The group's items are untouched in the catalog;
/// the caller may fix the listed reasons and resubmit just that group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupFailure {
    pub supplier_id: UserId,
    pub reasons: Vec<String>,
}

/// The result of checking out a multi-supplier cart. Order groups commit independently, so partial success is a
/// normal outcome, not an error: the committed orders stand regardless of how the other groups fared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub orders: Vec<Order>,
    pub failures: Vec<GroupFailure>,
}

impl CheckoutResult {
    pub fn all_committed(&self) -> bool {
        self.failures.is_empty()
    }

    /// The combined total of the orders that did commit.
    pub fn committed_total(&self) -> Money {
        self.orders.iter().map(|o| o.total).sum()
    }
}
