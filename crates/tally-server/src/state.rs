//! Shared application state for request handlers.

use std::sync::Arc;

use tally_auth::{AuthProvider, ClerkJwksProvider};
use tally_config::{AuthProviderKind, TallyConfig};
use tally_db::{DbAuthProvider, TallyService};

use crate::storage::LogoStore;

/// Cloned into every handler; all fields are shared.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TallyService>,
    pub auth: Arc<dyn AuthProvider>,
    pub logos: Arc<LogoStore>,
    /// Upper bound for a multipart logo upload.
    pub max_logo_bytes: usize,
}

impl AppState {
    #[must_use]
    pub fn new(
        service: Arc<TallyService>,
        auth: Arc<dyn AuthProvider>,
        logos: LogoStore,
        max_logo_bytes: usize,
    ) -> Self {
        Self {
            service,
            auth,
            logos: Arc::new(logos),
            max_logo_bytes,
        }
    }

    /// Open the database and wire the configured auth provider and logo store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the logo store
    /// cannot be built.
    pub async fn from_config(config: &TallyConfig) -> anyhow::Result<Self> {
        let service = if config.database.is_remote() {
            tracing::info!(url = %config.database.url, "opening remote database");
            TallyService::new_remote(&config.database.url, &config.database.auth_token).await?
        } else {
            tracing::info!(path = %config.database.path, "opening local database");
            TallyService::new_local(&config.database.path).await?
        };
        let service = Arc::new(service.with_audit_limit(config.general.audit_log_limit));

        let auth: Arc<dyn AuthProvider> = match config.auth.provider {
            AuthProviderKind::Local => Arc::new(DbAuthProvider::with_ttl_secs(
                Arc::clone(&service),
                config.auth.session_ttl_secs,
            )),
            AuthProviderKind::Clerk => {
                Arc::new(ClerkJwksProvider::new(&config.auth.clerk_secret_key))
            }
        };
        tracing::info!(provider = ?config.auth.provider, "auth provider ready");

        let logos = LogoStore::from_config(&config.storage)?;
        Ok(Self::new(service, auth, logos, config.general.max_logo_bytes))
    }
}
