//! HTTP error type.
//!
//! Every handler returns `Result<_, ApiError>`. The response body is always
//! `{"error": {"code": "...", "message": "..."}}`.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tally_auth::AuthError;
use tally_core::enums::Role;
use tally_db::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request.
    #[error("{0}")]
    BadRequest(String),

    /// Upload over the configured size limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authenticated, but the role does not allow the operation.
    #[error("this action requires the {required} role")]
    Forbidden { required: Role },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("blob store: {0}")]
    Storage(#[from] object_store::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Auth(err) => match err {
                AuthError::NotAuthenticated
                | AuthError::InvalidCredentials
                | AuthError::TokenExpired
                | AuthError::JwksValidation(_) => StatusCode::UNAUTHORIZED,
                AuthError::Unsupported(_) => StatusCode::BAD_REQUEST,
                AuthError::Store(_) | AuthError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Database(err) => match err {
                DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
                DatabaseError::Validation(_) => StatusCode::BAD_REQUEST,
                DatabaseError::InvalidTransition(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the body.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "bad_request",
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::CONFLICT => "invalid_transition",
            StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
            _ => "internal",
        }
    }

    /// Failure of the database or blob store rather than of the request.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.is_upstream() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (
            status,
            Json(json!({ "error": { "code": self.code(), "message": message } })),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}
