//! Confirmation and toast notification center.
//!
//! An explicit context object passed to whoever needs it; there is no
//! process-global state. At most one confirmation is active at a time:
//! requests arriving while one is pending are queued in FIFO order and
//! promoted when the active one resolves, so no caller's future is ever
//! orphaned.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use storegpt_core::{CartDiff, ConfirmId, ToastId};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

/// How long a toast stays visible before auto-dismissal.
pub const TOAST_DURATION: Duration = Duration::from_millis(2500);

/// Errors raised when resolving confirmations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// The given id is not the active confirmation.
    #[error("confirmation {0} is not active")]
    NotActive(ConfirmId),

    /// No confirmation is currently active.
    #[error("no active confirmation")]
    Idle,
}

/// What a confirmation dialog should display.
#[derive(Debug, Clone)]
pub struct ConfirmSpec {
    pub title: String,
    pub message: String,
    /// Optional rich content: the cart diff under review.
    pub diff: Option<CartDiff>,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl ConfirmSpec {
    /// A plain confirmation with default labels.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            diff: None,
            confirm_label: "Confirm".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }

    /// Attach a cart diff for display.
    #[must_use]
    pub fn with_diff(mut self, diff: CartDiff) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Override the confirm/cancel button labels.
    #[must_use]
    pub fn with_labels(
        mut self,
        confirm_label: impl Into<String>,
        cancel_label: impl Into<String>,
    ) -> Self {
        self.confirm_label = confirm_label.into();
        self.cancel_label = cancel_label.into();
        self
    }
}

/// Toast severity, mirrored by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A transient notification awaiting display or expiry.
#[derive(Debug, Clone)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    expires_at: Instant,
}

struct PendingConfirm {
    id: ConfirmId,
    spec: ConfirmSpec,
    responder: oneshot::Sender<bool>,
}

/// Confirmation state machine.
enum ConfirmState {
    Idle,
    Pending(PendingConfirm),
}

struct NotifierInner {
    state: ConfirmState,
    queue: VecDeque<PendingConfirm>,
    toasts: Vec<Toast>,
    next_confirm_id: i64,
    next_toast_id: i64,
}

/// Cheaply clonable notification center.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Mutex<NotifierInner>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Create a notification center with no pending state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(NotifierInner {
                state: ConfirmState::Idle,
                queue: VecDeque::new(),
                toasts: Vec::new(),
                next_confirm_id: 1,
                next_toast_id: 1,
            })),
        }
    }

    // =========================================================================
    // Confirmations
    // =========================================================================

    /// Enqueue a confirmation request.
    ///
    /// Resolves `true` on confirm and `false` on cancel or dismissal. If
    /// another confirmation is pending, this one waits its turn rather than
    /// replacing it.
    pub fn enqueue_confirm(&self, spec: ConfirmSpec) -> impl Future<Output = bool> + use<> {
        let (tx, rx) = oneshot::channel();

        {
            let mut inner = self.lock();
            let id = ConfirmId::new(inner.next_confirm_id);
            inner.next_confirm_id += 1;
            let pending = PendingConfirm {
                id,
                spec,
                responder: tx,
            };
            match inner.state {
                ConfirmState::Idle => {
                    debug!(%id, "Confirmation active");
                    inner.state = ConfirmState::Pending(pending);
                }
                ConfirmState::Pending(_) => {
                    debug!(%id, queued = inner.queue.len() + 1, "Confirmation queued");
                    inner.queue.push_back(pending);
                }
            }
        }

        async move {
            // A dropped notifier cancels the dialog, which is a rejection.
            rx.await.unwrap_or(false)
        }
    }

    /// The confirmation a UI should currently render, if any.
    #[must_use]
    pub fn active_confirm(&self) -> Option<(ConfirmId, ConfirmSpec)> {
        match &self.lock().state {
            ConfirmState::Idle => None,
            ConfirmState::Pending(pending) => Some((pending.id, pending.spec.clone())),
        }
    }

    /// Resolve the active confirmation with the user's decision and promote
    /// the next queued request.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` when `id` is not the active confirmation.
    pub fn resolve_confirm(&self, id: ConfirmId, decision: bool) -> Result<(), NotifyError> {
        let mut inner = self.lock();

        match &inner.state {
            ConfirmState::Idle => return Err(NotifyError::Idle),
            ConfirmState::Pending(pending) if pending.id != id => {
                return Err(NotifyError::NotActive(id));
            }
            ConfirmState::Pending(_) => {}
        }

        let ConfirmState::Pending(active) =
            std::mem::replace(&mut inner.state, ConfirmState::Idle)
        else {
            return Err(NotifyError::Idle);
        };

        // The caller may have stopped waiting; that is not an error here.
        let _ = active.responder.send(decision);

        if let Some(next) = inner.queue.pop_front() {
            debug!(id = %next.id, "Promoting queued confirmation");
            inner.state = ConfirmState::Pending(next);
        }

        Ok(())
    }

    /// Dismiss the active confirmation. Equivalent to resolving `false`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Idle` when nothing is pending.
    pub fn dismiss_active(&self) -> Result<(), NotifyError> {
        let id = self
            .active_confirm()
            .map(|(id, _)| id)
            .ok_or(NotifyError::Idle)?;
        self.resolve_confirm(id, false)
    }

    // =========================================================================
    // Toasts
    // =========================================================================

    /// Enqueue a transient notification. Fire-and-forget.
    pub fn show_toast(&self, message: impl Into<String>, kind: ToastKind) {
        let mut inner = self.lock();
        let id = ToastId::new(inner.next_toast_id);
        inner.next_toast_id += 1;
        inner.toasts.push(Toast {
            id,
            message: message.into(),
            kind,
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    /// Toasts still visible at `now`, sweeping out expired ones.
    #[must_use]
    pub fn visible_toasts(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.toasts.retain(|toast| toast.expires_at > now);
        inner.toasts.clone()
    }

    /// Dismiss a toast by explicit user action.
    pub fn dismiss_toast(&self, id: ToastId) {
        self.lock().toasts.retain(|toast| toast.id != id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NotifierInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
