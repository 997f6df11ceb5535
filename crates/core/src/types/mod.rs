//! Core types for StoreGPT.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod chat;
pub mod id;
pub mod item;
pub mod price;

pub use cart::{Cart, CartDiff, LineItem, QuantityChange, SimplifiedCart, SimplifiedLineItem};
pub use chat::{ChatMessage, ChatRole};
pub use id::*;
pub use item::CatalogItem;
pub use price::{CurrencyCode, Price};
