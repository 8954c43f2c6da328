//! The contract every identity provider implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::identity::AuthIdentity;

use crate::error::AuthError;

/// An issued bearer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token. Only the provider can map it back to a user.
    pub token: String,
    pub user_id: String,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Identity provider used by the HTTP layer.
///
/// `validate` returns who the token belongs to. The role is not the
/// provider's concern: callers resolve it from the role store afterwards.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Resolve a bearer token to an identity.
    async fn validate(&self, token: &str) -> Result<AuthIdentity, AuthError>;

    /// Invalidate a bearer token. Unknown tokens are not an error.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;
}
