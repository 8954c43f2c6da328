//! Bearer-token authentication and role checks.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tally_auth::AuthError;
use tally_auth::token::bearer_from_header;
use tally_core::enums::Role;
use tally_core::identity::AuthIdentity;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller. Extracting it rejects requests without a valid
/// bearer token with 401.
///
/// Providers that do not know roles (Clerk) get theirs from the role store.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthIdentity);

impl CurrentUser {
    /// Require `role` (admin always passes).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] when the caller lacks the role.
    pub fn require_role(&self, role: Role) -> Result<&AuthIdentity, ApiError> {
        if self.0.has_role(role) {
            Ok(&self.0)
        } else {
            tracing::warn!(user_id = %self.0.user_id, required = %role, "role check failed");
            Err(ApiError::Forbidden { required: role })
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let mut identity = state.auth.validate(token).await.inspect_err(|err| {
            tracing::warn!(error = %err, "bearer token rejected");
        })?;
        if identity.role.is_none() {
            identity.role = state.service.role_for(&identity.user_id).await?;
        }
        Ok(Self(identity))
    }
}

/// Raw bearer token of the current request, for sign-out.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_from_header)
        .ok_or(ApiError::Auth(AuthError::NotAuthenticated))
}
