//! Integration test support for StoreGPT.
//!
//! # Test Categories
//!
//! - `assistant_reconciliation` - End-to-end propose/diff/confirm/commit
//! - `cart_persistence` - Durable cart mirror across engine restarts
//! - `cache_ttl` - Cache staleness windows on the fetch layer
//!
//! The remote API is stood in for by [`spawn_json_server`], a minimal
//! fixed-response HTTP listener; no external services are required.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use storegpt_storefront::api::{ApiClient, IdentityProvider, StaticIdentity};
use storegpt_storefront::config::StorefrontConfig;
use storegpt_storefront::fetch::CachedFetcher;
use storegpt_storefront::storage::{KeyValueStore, MemoryStore};

/// Catalog cache TTL used across tests.
pub const TEST_TTL: Duration = Duration::from_millis(10_000);

/// Serve the same JSON body to every request on an ephemeral port.
///
/// Good enough for an engine that issues one request per scenario; the
/// listener runs until the test's runtime shuts down.
///
/// # Panics
///
/// Panics if no ephemeral port can be bound.
pub async fn spawn_json_server(body: &str) -> SocketAddr {
    spawn_delayed_json_server(body, Duration::ZERO).await
}

/// Like [`spawn_json_server`], but holds each response for `delay` before
/// answering. Used to race an in-flight fetch against invalidation.
///
/// # Panics
///
/// Panics if no ephemeral port can be bound.
pub async fn spawn_delayed_json_server(body: &str, delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let body = body.to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                // Drain the request head; the response does not depend on it
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Engine configuration pointed at a test server address.
#[must_use]
pub fn test_config(addr: SocketAddr) -> StorefrontConfig {
    StorefrontConfig {
        api_base_url: format!("http://{addr}/").parse().expect("base url"),
        api_token: None,
        cache_ttl: TEST_TTL,
        storage_path: None,
    }
}

/// An authenticated identity for assistant and checkout flows.
#[must_use]
pub fn signed_in() -> Arc<dyn IdentityProvider> {
    Arc::new(StaticIdentity::authenticated(SecretString::from(
        "test-token".to_string(),
    )))
}

/// API client and fetcher wired to a test server and shared storage.
#[must_use]
pub fn api_stack(
    addr: SocketAddr,
    storage: Arc<MemoryStore>,
    identity: Arc<dyn IdentityProvider>,
) -> (ApiClient, CachedFetcher) {
    let api = ApiClient::new(&test_config(addr), identity);
    let fetcher = CachedFetcher::new(api.clone(), storage, TEST_TTL);
    (api, fetcher)
}

/// Seed a cache entry `age_ms` old so a fetch can be steered to or away
/// from the network.
pub fn seed_cache_entry(storage: &dyn KeyValueStore, key: &str, payload: &str, age_ms: i64) {
    // Spin to the start of a fresh millisecond so truncation on the reader's
    // clock cannot age the entry by an extra millisecond.
    let start = chrono::Utc::now().timestamp_millis();
    let mut now = start;
    while now == start {
        now = chrono::Utc::now().timestamp_millis();
    }
    let fetched_at = now - age_ms;
    storage.set(key, payload).expect("seed payload");
    storage
        .set(&format!("{key}_time"), &fetched_at.to_string())
        .expect("seed timestamp");
}
