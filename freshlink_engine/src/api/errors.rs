use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, ProductId, UserId},
    traits::StorageError,
};

/// The cumulative list of field-level problems with a request. Callers receive every violation in one response
/// rather than fixing them one 400 at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single<S: Into<String>>(message: S) -> Self {
        Self(vec![message.into()])
    }

    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    /// One or more preconditions failed. Fix the listed problems and resubmit; no retry is needed beyond that.
    #[error("Order request failed validation: {0}")]
    Validation(ValidationErrors),
    /// Terminal: the order does not exist.
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    /// Terminal: the product does not exist.
    #[error("The requested product {0} does not exist")]
    ProductNotFound(ProductId),
    /// Retryable: another checkout won the stock. Re-read the catalog and try again.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    /// Retryable: the generated order number collided with an existing one.
    #[error("Order number {0} is already taken. Retry the request.")]
    DuplicateOrderNumber(OrderId),
    /// Terminal for the given input: the caller must re-derive a legal next status rather than retry as-is.
    #[error("Illegal status transition {from} -> {to}")]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("A non-empty reason is required when moving an order to {0}")]
    ReasonRequired(OrderStatusType),
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),
    #[error("Order {0} has already been rated")]
    AlreadyRated(OrderId),
    #[error("Rating not allowed: {0}")]
    RatingNotAllowed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrderFlowError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(ValidationErrors::single(message))
    }

    /// Conflicts may be retried by the caller with fresh data; everything else is terminal for the given input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InsufficientStock { .. } | Self::DuplicateOrderNumber(_))
    }

    /// The human-readable reasons behind this error, as handed back to checkout callers.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) => errors.clone().into_vec(),
            other => vec![other.to_string()],
        }
    }
}

impl From<StorageError> for OrderFlowError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::ProductNotFound(id) => Self::ProductNotFound(id),
            StorageError::InsufficientStock { product_id, requested, available } => {
                Self::InsufficientStock { product_id, requested, available }
            },
            StorageError::DuplicateOrderId(id) => Self::DuplicateOrderNumber(id),
            StorageError::OrderNotFound(id) => Self::OrderNotFound(id),
            StorageError::AlreadyRated(id) => Self::AlreadyRated(id),
            StorageError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// Convenience for permission failures tied to an order party.
pub(crate) fn not_a_party(user: &UserId, order_id: &OrderId) -> OrderFlowError {
    OrderFlowError::NotPermitted(format!("User {user} is not a party to order {order_id}"))
}
