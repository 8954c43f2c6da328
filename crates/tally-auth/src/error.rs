use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated: missing or unknown bearer token")]
    NotAuthenticated,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session expired; sign in again")]
    TokenExpired,

    #[error("JWKS validation failed: {0}")]
    JwksValidation(String),

    #[error("not supported by this auth provider: {0}")]
    Unsupported(String),

    #[error("credential store error: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}
