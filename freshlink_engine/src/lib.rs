//! Freshlink Order Engine
//!
//! The core of the Freshlink marketplace: the path from a multi-supplier shopping cart to committed orders, the
//! order lifecycle state machine, and the room-based fan-out layer that keeps both parties informed and carries
//! order-scoped chat.
//!
//! The library is divided into four main sections:
//! 1. Data types and the cart aggregator ([`mod@db_types`], [`mod@cart`]). The cart is client-held state; the engine
//!    provides the aggregation and supplier-split rules so every client computes them the same way.
//! 2. The storage seam ([`mod@traits`]) and the in-memory reference backend ([`mod@mem_store`]). Persistence proper
//!    is an external collaborator; backends need only the document primitives the trait demands, chief among them
//!    the conditional stock decrement.
//! 3. The order flow API ([`mod@api`]): validation, stock reservation with compensating rollback, frozen pricing,
//!    the status state machine and ratings.
//! 4. Real-time propagation ([`mod@fanout`], [`mod@events`]): best-effort room broadcast with no durable backlog,
//!    the order-scoped chat relay, and the fire-and-forget hooks external notifiers subscribe to.

pub mod api;
pub mod cart;
pub mod db_types;
pub mod events;
pub mod fanout;
pub mod helpers;
pub mod mem_store;
pub mod traits;

pub use api::{
    errors::{OrderFlowError, ValidationErrors},
    order_flow_api::OrderFlowApi,
    order_objects::{CheckoutResult, DeliveryDetails, GroupFailure, OrderPolicy},
};
pub use fanout::{ChatRelay, FanoutService};
pub use mem_store::InMemoryDatabase;
pub use traits::{MarketplaceDatabase, StorageError};
