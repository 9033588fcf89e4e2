//! User model representing the signed-in account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in user, as reported by the session endpoint.
///
/// Absence of a `User` is itself a valid application state: the caller
/// is anonymous and sees the landing view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque account identifier assigned by the backend.
    pub id: String,
    /// Account email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar image URL, when the identity provider supplies one.
    #[serde(default)]
    pub picture: Option<String>,
    /// When the account was first seen.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
