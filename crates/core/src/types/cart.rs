//! Cart, line item, and wire-format types.
//!
//! A [`Cart`] is an ordered sequence of [`LineItem`]s, unique by product id.
//! Insertion order carries no meaning but is preserved for display
//! stability. The serialized form is a plain JSON array so the durable
//! mirror stays human-readable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::item::CatalogItem;
use super::price::Price;

/// One product entry in the cart with its chosen quantity.
///
/// Invariant: `quantity >= 1`. An item whose quantity would drop to zero is
/// removed from the cart, never stored as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique product key.
    pub id: ProductId,
    /// Display name, copied from the catalog at add time.
    pub name: String,
    /// Unit price, copied from the catalog at add time.
    pub price: Price,
    /// Product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
    /// Chosen quantity, always >= 1.
    pub quantity: u32,
}

impl LineItem {
    /// Build a line item from a catalog item and a quantity.
    #[must_use]
    pub fn from_catalog(item: &CatalogItem, quantity: u32) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price,
            image_src: item.image_src.clone(),
            quantity,
        }
    }

    /// Line total (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.amount * Decimal::from(self.quantity)
    }
}

/// An ordered cart of line items, unique by product id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from line items.
    ///
    /// Callers are responsible for id uniqueness; the reducer is the only
    /// production writer and maintains it.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    /// Line items in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Find a line item by product id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of line items (not total quantity).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Convert to the minimal `{id, qty}` wire form.
    #[must_use]
    pub fn to_simplified(&self) -> SimplifiedCart {
        SimplifiedCart {
            items: self
                .items
                .iter()
                .map(|item| SimplifiedLineItem {
                    id: item.id,
                    qty: item.quantity,
                })
                .collect(),
        }
    }
}

impl From<Vec<LineItem>> for Cart {
    fn from(items: Vec<LineItem>) -> Self {
        Self::from_items(items)
    }
}

/// The minimal wire form of a cart line, exchanged with the assistant and
/// checkout services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedLineItem {
    /// Unique product key.
    pub id: ProductId,
    /// Chosen quantity, always >= 1.
    pub qty: u32,
}

/// The minimal wire form of a cart.
///
/// A simplified cart must be resolved against a known product catalog to
/// become a full [`Cart`]; ids with no catalog match are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimplifiedCart {
    /// Cart lines in wire order.
    pub items: Vec<SimplifiedLineItem>,
}

/// A structural comparison of two cart snapshots.
///
/// Every line item of either side is classified as added, removed, or
/// quantity-changed; items present on both sides with equal quantity are
/// omitted entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CartDiff {
    /// Items present only in the new cart, in new-cart order.
    pub added: Vec<LineItem>,
    /// Items present only in the old cart, in old-cart order.
    pub removed: Vec<LineItem>,
    /// Items present on both sides with differing quantities, in new-cart
    /// order.
    pub changed: Vec<QuantityChange>,
}

impl CartDiff {
    /// True when the two snapshots carry no meaningful difference.
    ///
    /// Downstream reconciliation treats an empty diff as auto-approved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// A quantity change for an item present in both cart snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityChange {
    /// The item as it appears in the new cart.
    pub item: LineItem,
    /// Quantity in the old snapshot.
    pub old_quantity: u32,
    /// Quantity in the new snapshot.
    pub new_quantity: u32,
}
