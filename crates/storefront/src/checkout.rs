//! Checkout session creation.
//!
//! Payment correctness is entirely the provider's concern; this module
//! only simplifies the cart to wire form and asks the remote API for a
//! redirect target.

use tracing::instrument;

use crate::api::{ApiClient, IdentityProvider};
use crate::cart::CartHandle;
use crate::error::{AppError, Result};

/// Create a checkout session for the current cart and return the payment
/// redirect URL.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` when no user is signed in, and
/// `AppError::Api` when the session cannot be created.
#[instrument(skip(api, identity, cart))]
pub async fn begin_checkout(
    api: &ApiClient,
    identity: &dyn IdentityProvider,
    cart: &CartHandle,
) -> Result<String> {
    if !identity.is_authenticated() {
        return Err(AppError::NotAuthenticated);
    }

    let wire = cart.snapshot().to_simplified();
    let session = api.create_checkout_session(&wire).await?;
    Ok(session.url)
}
