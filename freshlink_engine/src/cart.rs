//! The client-resident shopping cart.
//!
//! The cart holds line items for any number of suppliers at once. Derived figures (subtotal, delivery fee, grand
//! total) are always recomputed from the item list, so they cannot drift from it. At checkout the cart is split into
//! one [`SupplierGroup`] per distinct supplier; each group is exactly the unit the order flow consumes.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{LineRequest, Money, Product, ProductId, UserId};

/// The delivery-fee knobs shared by the cart and the order flow. A supplier group whose subtotal reaches the
/// free-delivery threshold ships free; every other group carries the flat fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub flat_delivery_fee: Money,
    pub free_delivery_threshold: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { flat_delivery_fee: Money::from_cents(5_000), free_delivery_threshold: Money::from_cents(50_000) }
    }
}

impl PricingPolicy {
    pub fn delivery_fee_for(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_delivery_threshold {
            Money::from_cents(0)
        } else {
            self.flat_delivery_fee
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Product has no identity and cannot be added to the cart")]
    MissingProductId,
    #[error("Product {0} has no supplier reference and cannot be added to the cart")]
    MissingSupplier(ProductId),
    #[error("Quantity must be at least 1")]
    ZeroQuantity,
}

/// One cart line. The unit price here is only used for the running totals the buyer sees; the authoritative price
/// is re-read from the catalog when the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub supplier_id: UserId,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// The items destined for one supplier, produced by [`Cart::split_by_supplier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierGroup {
    pub supplier_id: UserId,
    pub items: Vec<CartItem>,
}

impl SupplierGroup {
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// The line requests this group contributes to an order request.
    pub fn line_requests(&self) -> Vec<LineRequest> {
        self.items.iter().map(|i| LineRequest { product_id: i.product_id.clone(), quantity: i.quantity }).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    policy: PricingPolicy,
}

impl Cart {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { items: Vec::new(), policy }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `qty` units of a product. Adding a product already in the cart merges quantities. Products without an
    /// identity or a supplier reference are rejected outright.
    pub fn add_item(&mut self, product: &Product, qty: i64) -> Result<(), CartError> {
        if product.id.as_str().trim().is_empty() {
            return Err(CartError::MissingProductId);
        }
        if product.supplier_id.as_str().trim().is_empty() {
            return Err(CartError::MissingSupplier(product.id.clone()));
        }
        if qty < 1 {
            return Err(CartError::ZeroQuantity);
        }
        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(item) => item.quantity += qty,
            None => self.items.push(CartItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                quantity: qty,
                unit_price: product.unit_price,
                supplier_id: product.supplier_id.clone(),
            }),
        }
        Ok(())
    }

    /// Set the quantity for a line. A quantity of zero (or less) removes the line rather than keeping a zero line.
    pub fn update_qty(&mut self, product_id: &ProductId, qty: i64) {
        if qty <= 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = qty;
        }
    }

    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.items.retain(|i| &i.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total delivery fee across the cart: one flat fee per supplier group under the free-delivery threshold.
    pub fn delivery_fee(&self) -> Money {
        self.split_by_supplier().iter().map(|g| self.policy.delivery_fee_for(g.subtotal())).sum()
    }

    pub fn grand_total(&self) -> Money {
        self.subtotal() + self.delivery_fee()
    }

    /// Partition the cart into one group per distinct supplier, in first-seen order. Items with no resolvable
    /// supplier id are dropped with a warning; they are never merged into another supplier's group.
    pub fn split_by_supplier(&self) -> Vec<SupplierGroup> {
        split_items(self.items.iter().cloned())
    }
}

/// Partition loose cart items into supplier groups. Exposed for callers (such as the checkout endpoint) that receive
/// a client-held cart rather than building one up through [`Cart`]; the grouping and orphan-dropping rules are the
/// same as [`Cart::split_by_supplier`].
pub fn split_items<I: IntoIterator<Item = CartItem>>(items: I) -> Vec<SupplierGroup> {
    let mut groups: Vec<SupplierGroup> = Vec::new();
    for item in items {
        if item.supplier_id.as_str().trim().is_empty() {
            warn!("🛒️ Dropping cart item {} with no resolvable supplier id", item.product_id);
            continue;
        }
        match groups.iter_mut().find(|g| g.supplier_id == item.supplier_id) {
            Some(group) => group.items.push(item),
            None => groups.push(SupplierGroup { supplier_id: item.supplier_id.clone(), items: vec![item] }),
        }
    }
    groups
}
