//! Conversational assistant session.
//!
//! The assistant is an opaque remote service: it receives the user's
//! message plus the cart in wire form and answers with text and a proposed
//! cart. Proposals never touch the cart directly; they go through the
//! reconciler. The transcript is persisted under a session-scoped key on
//! every change, and failures surface as synthetic assistant messages so
//! the transcript stays consistent.

use std::sync::Arc;

use storegpt_core::{ChatMessage, ChatRole};
use tracing::{instrument, warn};

use crate::api::{ApiClient, IdentityProvider};
use crate::cart::{CartHandle, resolve_simplified};
use crate::fetch::CachedFetcher;
use crate::notify::{Notifier, ToastKind};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::storage::{CHAT_KEY, KeyValueStore};

const SIGN_IN_PROMPT: &str = "You have to be signed in to chat with StoreGPT.";
const GENERIC_FAILURE: &str = "Sorry, something went wrong. Please try again.";
const CLEAR_FAILURE: &str =
    "Sorry, something went wrong when creating a new chat. Please try again.";
const CANCELLED: &str = "Cancelled suggested changes.";
const SUPERSEDED: &str =
    "Your cart changed while the suggestions were under review, so they were discarded.";

/// A chat session with the storefront assistant.
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    storage: Arc<dyn KeyValueStore>,
    api: ApiClient,
    fetcher: CachedFetcher,
    identity: Arc<dyn IdentityProvider>,
    cart: CartHandle,
    reconciler: Reconciler,
    notifier: Notifier,
}

impl ChatSession {
    /// Open a session, restoring any persisted transcript.
    #[must_use]
    pub fn open(
        storage: Arc<dyn KeyValueStore>,
        api: ApiClient,
        fetcher: CachedFetcher,
        identity: Arc<dyn IdentityProvider>,
        cart: CartHandle,
        notifier: Notifier,
    ) -> Self {
        let messages = match storage.get(CHAT_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(error = %e, "Corrupt chat transcript, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let reconciler = Reconciler::new(cart.clone(), notifier.clone());

        Self {
            messages,
            storage,
            api,
            fetcher,
            identity,
            cart,
            reconciler,
            notifier,
        }
    }

    /// The transcript in display order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a message to the assistant and reconcile its cart proposal
    /// against the session's cart.
    ///
    /// A blank message is a no-op. An unauthenticated user gets a sign-in
    /// prompt instead of a network call. Any remote failure appends a
    /// synthetic assistant message rather than returning an error.
    #[instrument(skip(self, message))]
    pub async fn send(&mut self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }
        if !self.identity.is_authenticated() {
            self.push(ChatMessage::assistant(SIGN_IN_PROMPT));
            return;
        }

        self.push(ChatMessage::user(message));

        let wire = self.cart.snapshot().to_simplified();
        let reply = match self.api.ask_assistant(message, &wire).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Assistant call failed");
                self.push(ChatMessage::assistant(GENERIC_FAILURE));
                return;
            }
        };

        let catalog = match self.fetcher.catalog().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "Catalog fetch failed while resolving proposal");
                self.push(ChatMessage::assistant(GENERIC_FAILURE));
                return;
            }
        };

        let resolved = resolve_simplified(&reply.cart, &catalog);
        if !resolved.skipped.is_empty() {
            self.notifier.show_toast(
                format!(
                    "{} suggested item(s) are no longer available.",
                    resolved.skipped.len()
                ),
                ToastKind::Error,
            );
        }

        match self.reconciler.reconcile(resolved.cart).await {
            ReconcileOutcome::AutoApproved | ReconcileOutcome::Committed => {
                self.push(ChatMessage::assistant(reply.answer));
            }
            ReconcileOutcome::Rejected => {
                self.push(ChatMessage::assistant(CANCELLED));
            }
            ReconcileOutcome::SupersededByUserEdit => {
                self.push(ChatMessage::assistant(SUPERSEDED));
            }
        }
    }

    /// Clear the transcript here and on the server.
    ///
    /// A no-op when unauthenticated. A failed server call leaves the local
    /// transcript intact and appends a synthetic assistant message.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) {
        if !self.identity.is_authenticated() {
            return;
        }

        match self.api.clear_assistant_history().await {
            Ok(()) => {
                self.messages.clear();
                self.storage.remove(CHAT_KEY);
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear assistant history");
                self.push(ChatMessage::assistant(CLEAR_FAILURE));
            }
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.persist();
    }

    fn persist(&self) {
        match serde_json::to_string(&self.messages) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(CHAT_KEY, &raw) {
                    warn!(error = %e, "Failed to persist chat transcript");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize chat transcript"),
        }
    }
}

/// Count of assistant turns in a transcript, used by presentation code to
/// decide whether to show the empty-chat hint.
#[must_use]
pub fn assistant_turns(messages: &[ChatMessage]) -> usize {
    messages
        .iter()
        .filter(|m| m.role == ChatRole::Assistant)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    use crate::api::StaticIdentity;
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStore;

    fn unreachable_api(identity: Arc<dyn IdentityProvider>) -> ApiClient {
        let config = StorefrontConfig {
            api_base_url: "http://127.0.0.1:9/".parse().expect("url"),
            api_token: None,
            cache_ttl: std::time::Duration::from_secs(900),
            storage_path: None,
        };
        ApiClient::new(&config, identity)
    }

    fn session(identity: StaticIdentity) -> (ChatSession, CartHandle, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let identity: Arc<dyn IdentityProvider> = Arc::new(identity);
        let api = unreachable_api(identity.clone());
        let fetcher = CachedFetcher::new(
            api.clone(),
            storage.clone(),
            std::time::Duration::from_secs(900),
        );
        let cart = CartHandle::load(storage.clone());
        let chat = ChatSession::open(
            storage.clone(),
            api,
            fetcher,
            identity,
            cart.clone(),
            Notifier::new(),
        );
        (chat, cart, storage)
    }

    #[tokio::test]
    async fn test_blank_message_is_noop() {
        let (mut chat, _cart, _storage) = session(StaticIdentity::anonymous());
        chat.send("   ").await;
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_send_prompts_sign_in() {
        let (mut chat, _cart, _storage) = session(StaticIdentity::anonymous());
        chat.send("hello").await;
        assert_eq!(
            chat.messages(),
            &[ChatMessage::assistant(SIGN_IN_PROMPT)]
        );
    }

    #[tokio::test]
    async fn test_failed_assistant_call_appends_synthetic_message() {
        let identity = StaticIdentity::authenticated(SecretString::from("tok".to_string()));
        let (mut chat, cart, _storage) = session(identity);

        chat.send("add a mug").await;

        assert_eq!(chat.messages().len(), 2);
        assert_eq!(
            chat.messages().last(),
            Some(&ChatMessage::assistant(GENERIC_FAILURE))
        );
        // The cart was never touched
        assert!(cart.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_transcript_persists_and_restores() {
        let identity = StaticIdentity::anonymous();
        let (mut chat, cart, storage) = session(identity);
        chat.send("hello").await;
        drop(chat);

        let restored = ChatSession::open(
            storage.clone(),
            unreachable_api(Arc::new(StaticIdentity::anonymous())),
            CachedFetcher::new(
                unreachable_api(Arc::new(StaticIdentity::anonymous())),
                storage.clone(),
                std::time::Duration::from_secs(900),
            ),
            Arc::new(StaticIdentity::anonymous()),
            cart,
            Notifier::new(),
        );
        assert_eq!(
            restored.messages(),
            &[ChatMessage::assistant(SIGN_IN_PROMPT)]
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_clear_is_noop() {
        let (mut chat, _cart, _storage) = session(StaticIdentity::anonymous());
        chat.send("hello").await;
        chat.clear().await;
        // Transcript untouched without a server round-trip
        assert_eq!(chat.messages().len(), 1);
    }

    #[test]
    fn test_assistant_turns() {
        let transcript = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::assistant("anything else?"),
        ];
        assert_eq!(assistant_turns(&transcript), 2);
    }
}
