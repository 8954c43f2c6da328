//! # tally-config
//!
//! Layered configuration loading for Medal Tally using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TALLY_*` prefix, `__` as separator)
//! 2. Project-level `.medal-tally/config.toml`
//! 3. User-level `~/.config/medal-tally/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `TALLY_SERVER__PORT` -> `server.port`,
//! `TALLY_STORAGE__BUCKET` -> `storage.bucket`, and so on.
//!
//! ```no_run
//! use tally_config::TallyConfig;
//!
//! let config = TallyConfig::load_with_dotenv().expect("config");
//! config.validate().expect("usable config");
//! println!("listening on {}", config.server.address());
//! ```

mod auth;
mod database;
mod error;
mod general;
mod server;
mod storage;

pub use auth::{AuthConfig, AuthProviderKind};
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use server::ServerConfig;
pub use storage::{StorageBackend, StorageConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TALLY_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TallyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl TallyConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source cannot be parsed or a
    /// value has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load `.env` from the workspace root, then every other source.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".medal-tally/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Cross-field checks that serde alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when the selected auth provider or
    /// storage backend lacks its credentials, and [`ConfigError::InvalidValue`]
    /// for zero limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.provider == AuthProviderKind::Clerk && !self.auth.is_clerk_configured() {
            return Err(ConfigError::NotConfigured {
                section: "auth.clerk_secret_key".into(),
            });
        }
        if self.storage.backend == StorageBackend::S3 && !self.storage.is_s3_configured() {
            return Err(ConfigError::NotConfigured {
                section: "storage".into(),
            });
        }
        if self.auth.session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.session_ttl_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.general.audit_log_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.audit_log_limit".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("medal-tally").join("config.toml"))
    }

    /// Walks up from `CARGO_MANIFEST_DIR` (crate -> crates/ -> root) looking for
    /// `.env`, then falls back to the current directory.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TallyConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.provider, AuthProviderKind::Local);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn clerk_without_secret_is_rejected() {
        let mut config = TallyConfig::default();
        config.auth.provider = AuthProviderKind::Clerk;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotConfigured { .. })
        ));
        config.auth.clerk_secret_key = "sk_test_x".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn s3_without_bucket_is_rejected() {
        let mut config = TallyConfig::default();
        config.storage.backend = StorageBackend::S3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut config = TallyConfig::default();
        config.auth.session_ttl_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
