//! Sign-in, sign-out, and the current identity.

use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use tally_core::responses::{MeResponse, SessionResponse};

use crate::auth::{CurrentUser, bearer_token};
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/me", get(me))
}

#[derive(Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

/// POST /api/auth/sign-in
async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(body) = payload?;
    let session = state
        .auth
        .sign_in(&body.email, &body.password)
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "sign-in rejected"))?;
    let role = state.service.role_for(&session.user_id).await?;

    Ok(Json(SessionResponse {
        token: session.token,
        user_id: session.user_id,
        email: session.email,
        role,
        expires_at: session.expires_at,
    }))
}

/// POST /api/auth/sign-out
async fn sign_out(
    State(state): State<AppState>,
    _user: CurrentUser,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state.auth.sign_out(bearer_token(&headers)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
async fn me(user: CurrentUser) -> Json<MeResponse> {
    let CurrentUser(identity) = user;
    Json(MeResponse {
        user_id: identity.user_id,
        email: identity.email,
        role: identity.role,
    })
}
