use thiserror::Error;

use crate::db_types::{
    Order,
    OrderId,
    OrderUpdate,
    Product,
    ProductId,
    Rating,
    Role,
    User,
    UserId,
};

/// The document store this subsystem runs against. The persistence technology behind it is an external concern; the
/// trait only demands the query/update primitives the order flow needs, the most important of which is the
/// compare-and-swap stock decrement in [`Self::reserve_stock`].
///
/// Implementations must be cheap to clone (a handle over shared state), since one instance is shared across
/// request handlers.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + Send + Sync {
    /// Fetch a user by id, or `None` if no such user is registered.
    async fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StorageError>;

    /// Create or replace a user record.
    async fn upsert_user(&self, user: User) -> Result<(), StorageError>;

    /// Fetch a catalog entry by id, or `None` if it does not exist.
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, StorageError>;

    /// Create or replace a catalog entry. Availability is reconciled with the stock level on every write.
    async fn upsert_product(&self, product: Product) -> Result<(), StorageError>;

    /// Atomically decrement the product's stock by `qty` **iff** the product is available and holds at least `qty`
    /// units — "decrement iff current value >= requested" as a single read-modify-write, never a read followed by a
    /// separate write. Flips `is_available` off when the stock reaches zero.
    ///
    /// Returns the product as it stood at the moment of the decrement (the price in this snapshot is the price the
    /// order captures). Fails with [`StorageError::InsufficientStock`] when the condition does not hold.
    async fn reserve_stock(&self, id: &ProductId, qty: i64) -> Result<Product, StorageError>;

    /// The compensating credit for [`Self::reserve_stock`]: add `qty` units back and flip `is_available` on when the
    /// stock rises above zero. Used to roll back partially-reserved multi-line requests.
    async fn release_stock(&self, id: &ProductId, qty: i64) -> Result<(), StorageError>;

    /// Insert a brand-new order. The order number is unique across the store; inserting a duplicate fails with
    /// [`StorageError::DuplicateOrderId`] and the caller retries with a fresh number.
    async fn insert_order(&self, order: Order) -> Result<(), StorageError>;

    /// Fetch an order by its order number.
    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, StorageError>;

    /// All orders in which the user participates on the given side (vendor or supplier), oldest first.
    async fn fetch_orders_for_user(&self, user: &UserId, role: Role) -> Result<Vec<Order>, StorageError>;

    /// Apply a sparse [`OrderUpdate`] (status, timestamps, cancellation reason) as one write, returning the updated
    /// order.
    async fn update_order(&self, id: &OrderId, update: OrderUpdate) -> Result<Order, StorageError>;

    /// Attach the one-and-only rating to an order. Fails with [`StorageError::AlreadyRated`] if a rating exists; the
    /// existing rating is left untouched.
    async fn set_rating(&self, id: &OrderId, rating: Rating) -> Result<Order, StorageError>;
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("The requested product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("Cannot insert order, since it already exists with order number {0}")]
    DuplicateOrderId(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} has already been rated")]
    AlreadyRated(OrderId),
    #[error("Internal storage error: {0}")]
    Internal(String),
}
