//! StoreGPT Storefront engine library.
//!
//! The client-side cart engine: a pure reducer owns cart contents, a diff
//! engine compares cart snapshots, and a reconciliation coordinator gates
//! assistant-proposed cart replacements behind explicit user consent. The
//! catalog and cart both sit on top of a TTL-cached fetch layer and a
//! durable key-value storage mirror.
//!
//! # Data flow
//!
//! Fetcher -> cart hydration -> user actions or assistant proposals ->
//! diff engine -> reconciliation -> confirmation -> cart commit ->
//! storage mirror.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod chat;
pub mod checkout;
pub mod config;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod reconcile;
pub mod storage;
