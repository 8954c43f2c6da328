//! Local account auth backed by the `users` and `sessions` tables.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tally_auth::password::verify_password;
use tally_auth::token::{hash_token, mint_token};
use tally_auth::{AuthError, AuthProvider, Session};
use tally_core::identity::AuthIdentity;

use crate::error::DatabaseError;
use crate::service::TallyService;

fn store_err(err: DatabaseError) -> AuthError {
    AuthError::Store(err.to_string())
}

/// Email/password sign-in with opaque bearer tokens.
///
/// Only the SHA-256 of a token is stored. An expired session is deleted when
/// it is presented, and every sign-in sweeps the rest.
pub struct DbAuthProvider {
    service: Arc<TallyService>,
    ttl: TimeDelta,
}

impl DbAuthProvider {
    #[must_use]
    pub const fn new(service: Arc<TallyService>, ttl: TimeDelta) -> Self {
        Self { service, ttl }
    }

    /// TTL from a number of seconds, saturating on absurd values.
    #[must_use]
    pub fn with_ttl_secs(service: Arc<TallyService>, secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        let ttl = TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX);
        Self::new(service, ttl)
    }
}

#[async_trait]
impl AuthProvider for DbAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let Some((account, stored_hash)) = self
            .service
            .credentials_for(email)
            .await
            .map_err(store_err)?
        else {
            tracing::warn!("sign-in for unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &stored_hash) {
            tracing::warn!(user_id = %account.id, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = mint_token()?;
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Other("session TTL out of range".into()))?;
        self.service
            .open_session(&account.id, &hash_token(&token), expires_at)
            .await
            .map_err(store_err)?;

        tracing::info!(user_id = %account.id, "signed in");
        Ok(Session {
            token,
            user_id: account.id,
            email: Some(account.email),
            expires_at,
        })
    }

    async fn validate(&self, token: &str) -> Result<AuthIdentity, AuthError> {
        let token_hash = hash_token(token);
        let session = self
            .service
            .find_session(&token_hash)
            .await
            .map_err(store_err)?
            .ok_or(AuthError::NotAuthenticated)?;

        if session.expires_at <= Utc::now() {
            self.service
                .drop_session(&token_hash)
                .await
                .map_err(store_err)?;
            return Err(AuthError::TokenExpired);
        }

        let role = self
            .service
            .role_for(&session.user_id)
            .await
            .map_err(store_err)?;
        Ok(AuthIdentity {
            user_id: session.user_id,
            email: Some(session.email),
            role,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        match self
            .service
            .close_session(&hash_token(token))
            .await
            .map_err(store_err)?
        {
            Some(user_id) => {
                tracing::info!(%user_id, "signed out");
                Ok(())
            }
            None => Err(AuthError::NotAuthenticated),
        }
    }
}
