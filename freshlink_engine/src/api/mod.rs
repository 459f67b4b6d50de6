//! # Freshlink engine public API
//!
//! The programmatic surface of the order core. An API instance is created by supplying a storage backend that
//! implements [`MarketplaceDatabase`](crate::traits::MarketplaceDatabase), plus the event producers and fan-out
//! handle the flow publishes through:
//!
//! ```rust,ignore
//! use freshlink_engine::{FanoutService, InMemoryDatabase, OrderFlowApi, OrderPolicy};
//! let db = InMemoryDatabase::new();
//! let api = OrderFlowApi::new(db, OrderPolicy::default(), producers, FanoutService::default());
//! let order = api.create_order(&vendor, request).await?;
//! ```

pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
