//! Remote storefront API client.
//!
//! Thin typed wrapper over the JSON API consumed by the storefront:
//! catalog listing, assistant chat, and checkout session creation. All
//! calls may carry an optional bearer credential obtained from the
//! [`IdentityProvider`]; "not authenticated" is a precondition callers
//! check, not an error this client invents.
//!
//! Failures are never retried here; callers decide how to surface them.

mod identity;

pub use identity::{IdentityProvider, StaticIdentity};

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use storegpt_core::{CatalogItem, SimplifiedCart};

use crate::config::StorefrontConfig;

/// Errors that can occur when calling the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, TLS, connection reset).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The endpoint path could not be joined onto the base URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Request body for `POST /assistant/ask/`.
#[derive(Debug, Serialize)]
struct AssistantRequest<'a> {
    message: &'a str,
    cart: &'a SimplifiedCart,
}

/// Response body of `POST /assistant/ask/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantReply {
    /// Natural-language answer to show in the transcript.
    pub answer: String,
    /// The cart the assistant proposes, in wire form.
    pub cart: SimplifiedCart,
}

/// Response body of `POST /create-checkout-session/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Payment-provider redirect target.
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ItemsEnvelope {
    items: Vec<CatalogItem>,
}

/// Client for the remote storefront API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    identity: Arc<dyn IdentityProvider>,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: &StorefrontConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.clone(),
                identity,
            }),
        }
    }

    /// Fetch the product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not parse.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>, ApiError> {
        let body = self.request(reqwest::Method::GET, "/items/", None).await?;
        let envelope: ItemsEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.items)
    }

    /// Send a message to the conversational assistant with the current
    /// cart in wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not parse.
    #[instrument(skip(self, message, cart))]
    pub async fn ask_assistant(
        &self,
        message: &str,
        cart: &SimplifiedCart,
    ) -> Result<AssistantReply, ApiError> {
        let payload = serde_json::to_string(&AssistantRequest { message, cart })?;
        let body = self
            .request(reqwest::Method::POST, "/assistant/ask/", Some(payload))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Clear the server-side chat history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_assistant_history(&self) -> Result<(), ApiError> {
        self.request(reqwest::Method::DELETE, "/assistant/ask/", None)
            .await?;
        Ok(())
    }

    /// Create a checkout session for the given cart, returning the
    /// payment redirect target.
    ///
    /// The wire payload is the bare array of `{id, qty}` lines, not an
    /// `{items: [...]}` envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not parse.
    #[instrument(skip(self, cart))]
    pub async fn create_checkout_session(
        &self,
        cart: &SimplifiedCart,
    ) -> Result<CheckoutSession, ApiError> {
        let payload = serde_json::to_string(&cart.items)?;
        let body = self
            .request(
                reqwest::Method::POST,
                "/create-checkout-session/",
                Some(payload),
            )
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch a raw JSON body from an arbitrary endpoint.
    ///
    /// Used by the cache-backed fetcher, which extracts a named field from
    /// the envelope itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not parse.
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn get_json(&self, endpoint: &str) -> Result<serde_json::Value, ApiError> {
        let body = self.request(reqwest::Method::GET, endpoint, None).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Execute a request, attaching the bearer credential when present.
    async fn request(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        json_body: Option<String>,
    ) -> Result<String, ApiError> {
        let url = self.inner.base_url.join(endpoint.trim_start_matches('/'))?;

        let mut builder = self
            .inner
            .client
            .request(method, url)
            .header("Content-Type", "application/json");

        if let Some(token) = self.inner.identity.access_token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }

        if let Some(body) = json_body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_reply_parses() {
        let body = r#"{"answer":"Added a mug.","cart":{"items":[{"id":1,"qty":2}]}}"#;
        let reply: AssistantReply = serde_json::from_str(body).expect("parse");
        assert_eq!(reply.answer, "Added a mug.");
        assert_eq!(reply.cart.items.len(), 1);
    }

    #[test]
    fn test_checkout_session_parses() {
        let body = r#"{"url":"https://pay.example.com/session/abc"}"#;
        let session: CheckoutSession = serde_json::from_str(body).expect("parse");
        assert_eq!(session.url, "https://pay.example.com/session/abc");
    }

    #[test]
    fn test_checkout_payload_is_bare_line_array() {
        use storegpt_core::{ProductId, SimplifiedLineItem};

        let cart = SimplifiedCart {
            items: vec![SimplifiedLineItem {
                id: ProductId::new(1),
                qty: 2,
            }],
        };
        let payload = serde_json::to_string(&cart.items).expect("serialize");
        assert_eq!(payload, r#"[{"id":1,"qty":2}]"#);
    }

    #[test]
    fn test_items_envelope_parses() {
        let body = r#"{"items":[{"id":1,"name":"Mug","price":{"amount":"9.99","currency_code":"USD"}}]}"#;
        let envelope: ItemsEnvelope = serde_json::from_str(body).expect("parse");
        assert_eq!(envelope.items.len(), 1);
    }

    #[test]
    fn test_api_client_is_clone_send_sync() {
        fn assert_clone<T: Clone>() {}
        fn assert_send_sync<T: Send + Sync>() {}
        assert_clone::<ApiClient>();
        assert_send_sync::<ApiClient>();
    }
}
