//! Identity provider boundary.
//!
//! The storefront treats authentication as an external collaborator that
//! supplies an access token on demand. Assistant interaction and checkout
//! are disabled while no token is available.

use secrecy::SecretString;

/// Supplies authentication state and an access-token accessor.
pub trait IdentityProvider: Send + Sync {
    /// The current access token, or `None` when not authenticated.
    fn access_token(&self) -> Option<SecretString>;

    /// Whether a user is currently authenticated.
    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}

/// Fixed identity loaded from configuration, or anonymous when no token is
/// configured.
#[derive(Clone, Default)]
pub struct StaticIdentity {
    token: Option<SecretString>,
}

impl StaticIdentity {
    /// An identity holding the given token.
    #[must_use]
    pub const fn authenticated(token: SecretString) -> Self {
        Self { token: Some(token) }
    }

    /// An anonymous identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { token: None }
    }

    /// Build from the configured deploy-time credential.
    #[must_use]
    pub fn from_config(config: &crate::config::StorefrontConfig) -> Self {
        Self {
            token: config.api_token.clone(),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn access_token(&self) -> Option<SecretString> {
        self.token.clone()
    }
}
