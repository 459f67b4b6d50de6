//! # Freshlink server
//! This crate hosts the HTTP surface of the Freshlink order core. It is responsible for:
//! * Accepting checkout and per-supplier order requests from vendors.
//! * Driving the order lifecycle (accept/reject/progress/cancel) and ratings.
//! * Holding the long-lived `/api/connect` event streams that realize the room-based fan-out, and relaying
//!   order-scoped chat through them.
//!
//! ## Configuration
//! The server is configured via `FL_*` environment variables. See [config](config/index.html) for details.
//!
//! ## Authentication
//! Credential verification happens upstream; requests arrive with an `fl_auth_token` header carrying an
//! already-verified `user_id:role` identity, which [auth](auth/index.html) parses and nothing more.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
