//! Session establishment and teardown.
//!
//! The backend's identity provider is opaque to this client: sign-in
//! is a browser redirect, and the only queryable surface is "who does
//! this session belong to". A failed check is a routine outcome (the
//! anonymous state), never an error the user sees.

mod store;

pub use store::{clear_cookie, load_cookie, save_cookie};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::api::{ApiClient, ApiError};
use crate::models::User;

/// Identity operations the session guard needs from the backend.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Look up the account the current session belongs to.
    async fn me(&self) -> Result<User, ApiError>;
    /// Terminate the current session.
    async fn logout(&self) -> Result<(), ApiError>;
}

#[async_trait]
impl IdentitySource for ApiClient {
    async fn me(&self) -> Result<User, ApiError> {
        self.me().await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout().await
    }
}

/// Ask the backend who the stored session belongs to.
///
/// Every failure, whether a network error or a 401, resolves to
/// anonymous: startup must never be blocked on a session that does not
/// exist.
pub async fn check(identity: &dyn IdentitySource) -> Option<User> {
    match identity.me().await {
        Ok(user) => Some(user),
        Err(err) => {
            tracing::debug!(error = %err, "no active session");
            None
        }
    }
}

/// Hand the caller off to the external sign-in page.
///
/// Navigation happens in the system browser and nothing about the
/// result is observable here; the issued cookie comes back through
/// `login --cookie` or `FORMLO_SESSION`.
pub fn open_login(api: &ApiClient) -> Result<()> {
    let url = api.login_url();
    open::that(&url).with_context(|| format!("Failed to open {url}"))?;
    Ok(())
}
