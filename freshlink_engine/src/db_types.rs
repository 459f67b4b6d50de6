use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fl_common::Money;

//--------------------------------------       UserId        ---------------------------------------------------------
/// A lightweight wrapper around the identity string issued by the auth system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      ProductId       --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for ProductId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       OrderId        --------------------------------------------------------
/// The human-readable order number. Globally unique; duplicates are rejected by the store's unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Role          --------------------------------------------------------
/// The two sides of the marketplace. Vendors buy; suppliers sell and fulfil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Vendor,
    Supplier,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Vendor => write!(f, "vendor"),
            Role::Supplier => write!(f, "supplier"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid role: {0}")]
pub struct RoleConversionError(String);

impl FromStr for Role {
    type Err = RoleConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendor" => Ok(Self::Vendor),
            "supplier" => Ok(Self::Supplier),
            s => Err(RoleConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        User          --------------------------------------------------------
/// A marketplace participant as seen by this subsystem. Registration and credentials live upstream; all we keep is
/// the identity and the side of the market the user acts on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

//--------------------------------------       Actor          --------------------------------------------------------
/// The already-authenticated caller of an operation, as handed to us by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new<I: Into<UserId>>(id: I, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}

//--------------------------------------      Product         --------------------------------------------------------
/// A supplier-owned catalog entry. `quantity` is live on-hand stock and is only ever mutated through the
/// reserve/release pair on the storage trait. `is_available` is false whenever `quantity` is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub supplier_id: UserId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub is_available: bool,
}

//--------------------------------------      LineItem        --------------------------------------------------------
/// An immutable snapshot of one ordered line. The unit price is captured at order time and never recomputed from
/// the live product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

//--------------------------------------   OrderStatusType    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatusType {
    /// Newly created; awaiting the supplier's decision.
    Pending,
    /// Accepted by the supplier. An estimated delivery time has been set.
    Accepted,
    /// Declined by the supplier. Terminal.
    Rejected,
    /// The supplier is assembling the order.
    Preparing,
    /// Out for delivery.
    InTransit,
    /// Delivered to the vendor. Terminal; the only state in which a rating may be added.
    Delivered,
    /// Cancelled by the vendor. Terminal.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Accepted => write!(f, "accepted"),
            OrderStatusType::Rejected => write!(f, "rejected"),
            OrderStatusType::Preparing => write!(f, "preparing"),
            OrderStatusType::InTransit => write!(f, "in-transit"),
            OrderStatusType::Delivered => write!(f, "delivered"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatusType {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "preparing" => Ok(Self::Preparing),
            "in-transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 7] = [
        OrderStatusType::Pending,
        OrderStatusType::Accepted,
        OrderStatusType::Rejected,
        OrderStatusType::Preparing,
        OrderStatusType::InTransit,
        OrderStatusType::Delivered,
        OrderStatusType::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Rejected | OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    /// The full legal-transition table. Returns the role that may drive `self -> to`, or `None` when the transition
    /// is illegal. Suppliers decide pending orders and drive the fulfilment progression; vendors may only cancel,
    /// and only before preparation starts.
    pub fn transition_role(&self, to: OrderStatusType) -> Option<Role> {
        use OrderStatusType::*;
        match (*self, to) {
            (Pending, Accepted) | (Pending, Rejected) => Some(Role::Supplier),
            (Accepted, Preparing) | (Preparing, InTransit) | (InTransit, Delivered) => Some(Role::Supplier),
            (Pending, Cancelled) | (Accepted, Cancelled) => Some(Role::Vendor),
            (_, _) => None,
        }
    }

    /// True when entering this status requires a non-empty reason string.
    pub fn requires_reason(&self) -> bool {
        matches!(self, OrderStatusType::Rejected | OrderStatusType::Cancelled)
    }
}

//--------------------------------------    PaymentMethod     --------------------------------------------------------
/// How the vendor intends to pay. Recorded on the order as a tag only; payment processing happens outside this
/// system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Transfer => write!(f, "transfer"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

//--------------------------------------       Rating         --------------------------------------------------------
/// A vendor's once-off rating of a delivered order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub stars: u8,
    pub review: Option<String>,
    pub rated_at: DateTime<Utc>,
}

//--------------------------------------        Order         --------------------------------------------------------
/// One order per (vendor, supplier, checkout event). The order is the sole source of truth for its committed line
/// items and pricing; the live product no longer affects it once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub vendor_id: UserId,
    pub supplier_id: UserId,
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub status: OrderStatusType,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_address: String,
    pub delivery_date: NaiveDate,
    pub delivery_time: Option<String>,
    pub notes: Option<String>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub rating: Option<Rating>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// True if the given user is one of the two parties to this order.
    pub fn involves(&self, user: &UserId) -> bool {
        &self.vendor_id == user || &self.supplier_id == user
    }

    /// The opposite party to `user`, if `user` is a party to this order at all.
    pub fn counterparty(&self, user: &UserId) -> Option<&UserId> {
        if &self.vendor_id == user {
            Some(&self.supplier_id)
        } else if &self.supplier_id == user {
            Some(&self.vendor_id)
        } else {
            None
        }
    }
}

//--------------------------------------      NewOrder        --------------------------------------------------------
/// A single line of an order request: what the vendor wants, before validation and pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// An order request for a single supplier, as submitted at checkout. Prices are deliberately absent; they are read
/// from the live catalog at reservation time and frozen into the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub supplier_id: UserId,
    pub items: Vec<LineRequest>,
    pub delivery_address: String,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

//--------------------------------------     OrderUpdate      --------------------------------------------------------
/// A sparse update applied to an order in a single store write. Only status transitions and their side-effect
/// timestamps flow through here; pricing and line items are immutable after creation.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatusType>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl OrderUpdate {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_estimated_delivery_at(mut self, at: DateTime<Utc>) -> Self {
        self.estimated_delivery_at = Some(at);
        self
    }

    pub fn with_delivered_at(mut self, at: DateTime<Utc>) -> Self {
        self.delivered_at = Some(at);
        self
    }

    pub fn with_cancellation_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.cancellation_reason = Some(reason.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() &&
            self.estimated_delivery_at.is_none() &&
            self.delivered_at.is_none() &&
            self.cancellation_reason.is_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_string_round_trip() {
        for status in OrderStatusType::ALL {
            let s = status.to_string();
            assert_eq!(s.parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn status_serde_uses_kebab_case() {
        let json = serde_json::to_string(&OrderStatusType::InTransit).unwrap();
        assert_eq!(json, r#""in-transit""#);
        let status: OrderStatusType = serde_json::from_str(r#""delivered""#).unwrap();
        assert_eq!(status, OrderStatusType::Delivered);
    }

    #[test]
    fn transition_table_is_closed() {
        use OrderStatusType::*;
        let legal = [
            (Pending, Accepted, Role::Supplier),
            (Pending, Rejected, Role::Supplier),
            (Pending, Cancelled, Role::Vendor),
            (Accepted, Preparing, Role::Supplier),
            (Accepted, Cancelled, Role::Vendor),
            (Preparing, InTransit, Role::Supplier),
            (InTransit, Delivered, Role::Supplier),
        ];
        for from in OrderStatusType::ALL {
            for to in OrderStatusType::ALL {
                let expected = legal.iter().find(|(f, t, _)| *f == from && *t == to).map(|(_, _, r)| *r);
                assert_eq!(from.transition_role(to), expected, "transition {from} -> {to}");
            }
        }
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for from in OrderStatusType::ALL.into_iter().filter(OrderStatusType::is_terminal) {
            for to in OrderStatusType::ALL {
                assert!(from.transition_role(to).is_none(), "{from} is terminal but allows {to}");
            }
        }
    }

    #[test]
    fn counterparty_resolution() {
        let order = Order {
            order_id: OrderId("FL-1".into()),
            vendor_id: "v-1".into(),
            supplier_id: "s-1".into(),
            items: vec![],
            subtotal: Money::default(),
            delivery_fee: Money::default(),
            total: Money::default(),
            status: OrderStatusType::Pending,
            payment_method: PaymentMethod::default(),
            payment_status: PaymentStatus::default(),
            delivery_address: "12 Harbour Rd".into(),
            delivery_date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
            delivery_time: None,
            notes: None,
            estimated_delivery_at: None,
            delivered_at: None,
            rating: None,
            cancellation_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.counterparty(&"v-1".into()), Some(&UserId::from("s-1")));
        assert_eq!(order.counterparty(&"s-1".into()), Some(&UserId::from("v-1")));
        assert!(order.counterparty(&"someone-else".into()).is_none());
        assert!(order.involves(&"v-1".into()));
        assert!(!order.involves(&"x".into()));
    }
}
