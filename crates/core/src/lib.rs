//! StoreGPT Core - Shared domain types.
//!
//! This crate provides the common types used across the StoreGPT components:
//! - `storefront` - Client-side cart engine, assistant chat, and API access
//! - `integration-tests` - Cross-module scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Everything here is plain data with serde support so it can cross the wire
//! to the remote API or be mirrored into durable local storage.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, catalog items, carts, and chat messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
