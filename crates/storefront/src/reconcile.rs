//! Reconciliation of externally-proposed cart replacements.
//!
//! This is the only path by which a mutation that did not originate from a
//! direct user action can reach the cart. Every proposal is diffed against
//! the cart as it stood when the proposal arrived; a non-empty diff
//! suspends on user confirmation before anything is committed.
//!
//! The cart version is stamped when the snapshot is taken. If the user
//! manually edits the cart while the confirmation is pending, an approval
//! no longer commits: the proposal was reviewed against a cart that no
//! longer exists, so it is reported as superseded and dropped.

use storegpt_core::Cart;
use tracing::{debug, instrument};

use crate::cart::{CartHandle, diff};
use crate::notify::{ConfirmSpec, Notifier};

/// How a proposed cart replacement was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The proposal matched the current cart; committed without a dialog.
    AutoApproved,
    /// The user approved the diff and the proposal was committed.
    Committed,
    /// The user rejected the diff; the cart is untouched.
    Rejected,
    /// A manual cart edit interleaved with the pending confirmation; the
    /// approval was discarded and the cart reflects the manual edit.
    SupersededByUserEdit,
}

/// Gates assistant-proposed cart replacements behind user review.
#[derive(Clone)]
pub struct Reconciler {
    cart: CartHandle,
    notifier: Notifier,
}

impl Reconciler {
    /// Create a reconciler over the cart handle and notification center.
    #[must_use]
    pub const fn new(cart: CartHandle, notifier: Notifier) -> Self {
        Self { cart, notifier }
    }

    /// Reconcile a proposed cart replacement.
    ///
    /// An empty diff is a trivial accept: no dialog is shown and the cart
    /// is left as-is. Otherwise the diff is presented for confirmation and
    /// this call suspends until the user decides (there is no timeout;
    /// dismissal counts as rejection).
    #[instrument(skip(self, proposed), fields(proposed_len = proposed.len()))]
    pub async fn reconcile(&self, proposed: Cart) -> ReconcileOutcome {
        let (current, version) = self.cart.versioned_snapshot();
        let changes = diff(&current, &proposed);

        if changes.is_empty() {
            debug!("Proposal matches current cart, auto-approving");
            return ReconcileOutcome::AutoApproved;
        }

        let spec = ConfirmSpec::new(
            "Recommendations:",
            "The assistant suggests the following cart changes.",
        )
        .with_labels("Accept", "Deny")
        .with_diff(changes);

        let approved = self.notifier.enqueue_confirm(spec).await;

        if !approved {
            return ReconcileOutcome::Rejected;
        }

        if self.cart.commit_if_unchanged(proposed, version) {
            ReconcileOutcome::Committed
        } else {
            debug!("Cart changed while confirmation was pending, dropping proposal");
            ReconcileOutcome::SupersededByUserEdit
        }
    }
}
