use std::fmt::Display;

use chrono::NaiveDate;
use freshlink_engine::{
    cart::CartItem,
    db_types::{OrderStatusType, PaymentMethod},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The client-held cart, submitted as-is at checkout. The server re-groups the items by supplier and prices each
/// group against the live catalog; the unit prices in the cart items are display figures only and are not trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    pub delivery_address: String,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub new_status: OrderStatusType,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRequest {
    pub stars: u8,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSendRequest {
    pub body: String,
}
