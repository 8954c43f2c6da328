//! Authentication provider configuration.

use serde::{Deserialize, Serialize};

/// Default session lifetime: 12 hours.
const fn default_session_ttl_secs() -> u64 {
    43_200
}

/// Which identity provider validates bearer tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderKind {
    /// Accounts and sessions stored in the tally database.
    #[default]
    Local,
    /// Clerk-issued JWTs verified against Clerk's JWKS.
    Clerk,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub provider: AuthProviderKind,

    /// Lifetime of local sessions, in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Clerk secret key, required when `provider = "clerk"`.
    #[serde(default)]
    pub clerk_secret_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: AuthProviderKind::default(),
            session_ttl_secs: default_session_ttl_secs(),
            clerk_secret_key: String::new(),
        }
    }
}

impl AuthConfig {
    pub fn is_clerk_configured(&self) -> bool {
        !self.clerk_secret_key.is_empty()
    }
}
