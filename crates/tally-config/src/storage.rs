//! Blob storage configuration for team logos.

use serde::{Deserialize, Serialize};

fn default_logo_prefix() -> String {
    "logos".into()
}

fn default_local_dir() -> String {
    "uploads".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on restart. Default for development and tests.
    #[default]
    Memory,
    /// A directory on the local filesystem.
    Local,
    /// S3-compatible object storage (AWS S3, Cloudflare R2, `MinIO`).
    S3,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the `local` backend.
    #[serde(default = "default_local_dir")]
    pub local_dir: String,

    #[serde(default)]
    pub bucket: String,

    /// Custom endpoint (R2 / `MinIO`). Empty means AWS.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    /// Prefix for public logo URLs. Stored URL = `{public_base_url}/{key}`.
    #[serde(default)]
    pub public_base_url: String,

    /// Object key prefix for uploaded logos.
    #[serde(default = "default_logo_prefix")]
    pub logo_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_dir: default_local_dir(),
            bucket: String::new(),
            endpoint: String::new(),
            region: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            public_base_url: String::new(),
            logo_prefix: default_logo_prefix(),
        }
    }
}

impl StorageConfig {
    /// Check if the S3 backend has the minimum required fields.
    pub fn is_s3_configured(&self) -> bool {
        !self.bucket.is_empty()
            && !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
    }
}
