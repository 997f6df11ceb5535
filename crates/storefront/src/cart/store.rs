//! Cart ownership and the durable storage mirror.
//!
//! [`CartStore`] is the single dispatch point for cart transitions. The
//! storage mirror is derived state: it seeds the initial cart on load and
//! is overwritten after every transition. Mirror writes are best-effort;
//! failures are logged and never block or surface to the user.

use std::sync::{Arc, Mutex};

use storegpt_core::Cart;
use tracing::warn;

use crate::storage::{CART_KEY, KeyValueStore};

use super::{CartAction, reduce};

/// Owns the cart, its transition version, and the storage mirror.
pub struct CartStore {
    cart: Cart,
    version: u64,
    storage: Arc<dyn KeyValueStore>,
}

impl CartStore {
    /// Load the cart from the storage mirror.
    ///
    /// Missing or corrupt mirror data is treated as "no prior state" and
    /// yields an empty cart.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let cart = match storage.get(CART_KEY) {
            Some(raw) => match serde_json::from_str::<Cart>(&raw) {
                Ok(cart) => cart,
                Err(e) => {
                    warn!(error = %e, "Failed to read shopping cart mirror, starting empty");
                    Cart::new()
                }
            },
            None => Cart::new(),
        };

        Self {
            cart,
            version: 0,
            storage,
        }
    }

    /// Current cart snapshot.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Transition counter, bumped on every dispatch.
    ///
    /// Reconciliation stamps proposals with this value to detect manual
    /// edits that interleave with a pending confirmation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Apply an action through the reducer and overwrite the mirror.
    pub fn dispatch(&mut self, action: CartAction) {
        self.cart = reduce(&self.cart, action);
        self.version += 1;
        self.persist();
    }

    fn persist(&self) {
        match serde_json::to_string(&self.cart) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(CART_KEY, &raw) {
                    warn!(error = %e, "Failed to save shopping cart mirror");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize shopping cart"),
        }
    }
}

/// Cheaply clonable handle serializing all cart access through one lock.
///
/// The lock is only ever held across synchronous reducer transitions,
/// never across an await point.
#[derive(Clone)]
pub struct CartHandle {
    inner: Arc<Mutex<CartStore>>,
}

impl CartHandle {
    /// Load a handle backed by `storage`.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CartStore::load(storage))),
        }
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock().cart().clone()
    }

    /// Snapshot of the cart together with its version stamp.
    #[must_use]
    pub fn versioned_snapshot(&self) -> (Cart, u64) {
        let store = self.lock();
        (store.cart().clone(), store.version())
    }

    /// Current transition version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.lock().version()
    }

    /// Dispatch an action.
    pub fn dispatch(&self, action: CartAction) {
        self.lock().dispatch(action);
    }

    /// Commit a reconciled cart only if no transition happened since the
    /// proposal was stamped with `expected_version`.
    ///
    /// Returns `false` (leaving the cart untouched) when a manual edit
    /// superseded the proposal.
    #[must_use]
    pub fn commit_if_unchanged(&self, cart: Cart, expected_version: u64) -> bool {
        let mut store = self.lock();
        if store.version() != expected_version {
            return false;
        }
        store.dispatch(CartAction::Set(cart));
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CartStore> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
