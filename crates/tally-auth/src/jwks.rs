//! Clerk-backed [`AuthProvider`]: bearer tokens are Clerk session JWTs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use clerk_rs::ClerkConfiguration;
use clerk_rs::clerk::Clerk;
use clerk_rs::validators::authorizer::validate_jwt;
use clerk_rs::validators::jwks::MemoryCacheJwksProvider;
use tally_core::identity::AuthIdentity;

use crate::claims::{ClerkClaims, decode_expiry};
use crate::error::AuthError;
use crate::provider::{AuthProvider, Session};

/// Validates Clerk JWTs against the instance's JWKS.
///
/// Public keys are fetched through the Clerk backend API and cached in memory
/// by `MemoryCacheJwksProvider`. Sign-in happens in Clerk's hosted UI, so
/// [`AuthProvider::sign_in`] is unsupported here.
pub struct ClerkJwksProvider {
    jwks: Arc<MemoryCacheJwksProvider>,
}

impl ClerkJwksProvider {
    #[must_use]
    pub fn new(secret_key: &str) -> Self {
        let config = ClerkConfiguration::new(None, None, Some(secret_key.to_string()), None);
        Self {
            jwks: Arc::new(MemoryCacheJwksProvider::new(Clerk::new(config))),
        }
    }

    /// Validate a JWT and extract its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for a stale `exp`, and
    /// `AuthError::JwksValidation` if the signature check fails or the JWKS
    /// endpoint is unreachable.
    pub async fn claims(&self, jwt: &str) -> Result<ClerkClaims, AuthError> {
        if let Ok(expires_at) = decode_expiry(jwt)
            && expires_at <= Utc::now()
        {
            return Err(AuthError::TokenExpired);
        }

        let clerk_jwt = validate_jwt(jwt, Arc::clone(&self.jwks))
            .await
            .map_err(|e| AuthError::JwksValidation(e.to_string()))?;

        let expires_at = chrono::DateTime::from_timestamp(i64::from(clerk_jwt.exp), 0)
            .ok_or_else(|| AuthError::JwksValidation("invalid exp timestamp".into()))?;

        Ok(ClerkClaims {
            user_id: clerk_jwt.sub,
            expires_at,
        })
    }
}

#[async_trait]
impl AuthProvider for ClerkJwksProvider {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        Err(AuthError::Unsupported(
            "password sign-in; use the Clerk hosted sign-in page".into(),
        ))
    }

    async fn validate(&self, token: &str) -> Result<AuthIdentity, AuthError> {
        let claims = self.claims(token).await?;
        tracing::debug!(user_id = %claims.user_id, expires_at = %claims.expires_at, "clerk token validated");
        Ok(claims.to_identity())
    }

    async fn sign_out(&self, _token: &str) -> Result<(), AuthError> {
        // Clerk sessions are revoked client-side.
        Ok(())
    }
}
