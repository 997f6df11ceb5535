//! Cart state engine.
//!
//! The cart is owned by a pure reducer: every transition is a function of
//! the current cart and a [`CartAction`]. Persistence, diffing, and
//! reconciliation live in sibling modules; nothing in the reducer performs
//! I/O.

pub mod diff;
pub mod store;

pub use diff::diff;
pub use store::{CartHandle, CartStore};

use storegpt_core::{Cart, CatalogItem, LineItem, ProductId, SimplifiedCart};

/// A cart state transition.
///
/// Quantities are a caller contract: `Add` and `Change` require
/// `quantity >= 1`, clamped at the input boundary (forms, wire decoding),
/// not checked here.
#[derive(Debug, Clone)]
pub enum CartAction {
    /// Replace the cart wholesale. Used for reconciled commits and
    /// hydration; the caller is trusted.
    Set(Cart),
    /// Add `quantity` of a product, merging with an existing line.
    Add { item: CatalogItem, quantity: u32 },
    /// Overwrite the quantity of a product, appending if absent.
    Change { item: CatalogItem, quantity: u32 },
    /// Remove a product. Removing an absent id is a no-op.
    Remove(ProductId),
    /// Reset to an empty cart.
    Clear,
    /// Resolve a simplified wire cart against the catalog. Unknown ids are
    /// dropped.
    FromSimplified {
        simplified: SimplifiedCart,
        catalog: Vec<CatalogItem>,
    },
}

/// Apply an action to a cart, returning the new cart.
///
/// Pure: no side effects, inputs are not mutated.
#[must_use]
pub fn reduce(cart: &Cart, action: CartAction) -> Cart {
    match action {
        CartAction::Set(new_cart) => new_cart,

        CartAction::Add { item, quantity } => {
            if cart.get(item.id).is_some() {
                map_quantity(cart, item.id, |current| current + quantity)
            } else {
                append(cart, LineItem::from_catalog(&item, quantity))
            }
        }

        CartAction::Change { item, quantity } => {
            if cart.get(item.id).is_some() {
                map_quantity(cart, item.id, |_| quantity)
            } else {
                append(cart, LineItem::from_catalog(&item, quantity))
            }
        }

        CartAction::Remove(id) => Cart::from_items(
            cart.items()
                .iter()
                .filter(|line| line.id != id)
                .cloned()
                .collect(),
        ),

        CartAction::Clear => Cart::new(),

        CartAction::FromSimplified {
            simplified,
            catalog,
        } => resolve_simplified(&simplified, &catalog).cart,
    }
}

/// Result of resolving a simplified cart against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCart {
    /// The resolved full cart, in wire order.
    pub cart: Cart,
    /// Ids that had no catalog match and were dropped.
    pub skipped: Vec<ProductId>,
}

/// Resolve a simplified `{id, qty}` cart to full line items by catalog
/// lookup.
///
/// Entries with no catalog match are excluded from the result; the skipped
/// ids are reported so callers can surface a partial-failure notice.
#[must_use]
pub fn resolve_simplified(simplified: &SimplifiedCart, catalog: &[CatalogItem]) -> ResolvedCart {
    let mut items = Vec::with_capacity(simplified.items.len());
    let mut skipped = Vec::new();

    for entry in &simplified.items {
        match catalog.iter().find(|item| item.id == entry.id) {
            Some(item) => items.push(LineItem::from_catalog(item, entry.qty)),
            None => skipped.push(entry.id),
        }
    }

    ResolvedCart {
        cart: Cart::from_items(items),
        skipped,
    }
}

fn map_quantity(cart: &Cart, id: ProductId, f: impl Fn(u32) -> u32) -> Cart {
    Cart::from_items(
        cart.items()
            .iter()
            .map(|line| {
                if line.id == id {
                    let mut updated = line.clone();
                    updated.quantity = f(line.quantity);
                    updated
                } else {
                    line.clone()
                }
            })
            .collect(),
    )
}

fn append(cart: &Cart, line: LineItem) -> Cart {
    let mut items = cart.items().to_vec();
    items.push(line);
    Cart::from_items(items)
}
