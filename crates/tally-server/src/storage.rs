//! Team logo blob store.
//!
//! Logos are written under `<prefix>/<unix millis>_<sanitized filename>` and
//! served from `public_base_url`. The store itself is any `object_store`
//! backend: in-memory for tests, a local directory, or S3-compatible (R2).

use std::sync::Arc;

use chrono::Utc;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use tally_config::{StorageBackend, StorageConfig};

pub struct LogoStore {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    public_base_url: String,
}

impl LogoStore {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str, public_base_url: &str) -> Self {
        Self {
            store,
            prefix: prefix.trim_matches('/').to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// In-memory store with relative URLs.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "logos", "")
    }

    /// Build the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the local directory cannot be created or the S3
    /// client cannot be built.
    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn ObjectStore> = match config.backend {
            StorageBackend::Memory => Arc::new(InMemory::new()),
            StorageBackend::Local => {
                std::fs::create_dir_all(&config.local_dir)?;
                Arc::new(LocalFileSystem::new_with_prefix(&config.local_dir)?)
            }
            StorageBackend::S3 => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&config.bucket)
                    .with_access_key_id(&config.access_key_id)
                    .with_secret_access_key(&config.secret_access_key);
                if !config.region.is_empty() {
                    builder = builder.with_region(&config.region);
                }
                if !config.endpoint.is_empty() {
                    builder = builder.with_endpoint(&config.endpoint);
                }
                Arc::new(builder.build()?)
            }
        };
        tracing::info!(backend = ?config.backend, "logo store ready");
        Ok(Self::new(store, &config.logo_prefix, &config.public_base_url))
    }

    /// Store a logo and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `object_store::Error` if the write fails.
    pub async fn put_logo(&self, filename: &str, bytes: Vec<u8>) -> Result<String, object_store::Error> {
        let key = self.key_for(filename, Utc::now().timestamp_millis());
        self.store.put(&key, PutPayload::from(bytes)).await?;
        tracing::info!(key = %key, "logo stored");
        Ok(self.public_url(&key))
    }

    /// Delete the logo behind a URL this store produced. Other URLs are ignored.
    pub async fn remove_by_url(&self, url: &str) {
        let Some(key) = url
            .strip_prefix(&self.public_base_url)
            .map(|k| k.trim_start_matches('/'))
            .filter(|k| k.starts_with(&format!("{}/", self.prefix)))
        else {
            return;
        };
        if let Err(err) = self.store.delete(&Path::from(key)).await {
            tracing::warn!(key, error = %err, "failed to delete old logo");
        }
    }

    /// Read back a logo by the file name in its URL (the part after the
    /// prefix). Names that [`sanitize_filename`] would not produce are
    /// treated as missing, so a request can never leave the prefix.
    ///
    /// # Errors
    ///
    /// Returns `object_store::Error` if the backend read fails for a reason
    /// other than a missing object.
    pub async fn get_logo(&self, name: &str) -> Result<Option<Vec<u8>>, object_store::Error> {
        if name.is_empty() || sanitize_filename(name) != name {
            return Ok(None);
        }
        let key = Path::from(format!("{}/{name}", self.prefix));
        match self.store.get(&key).await {
            Ok(found) => Ok(Some(found.bytes().await?.to_vec())),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Key prefix logos live under, without surrounding slashes.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key_for(&self, filename: &str, millis: i64) -> Path {
        Path::from(format!("{}/{millis}_{}", self.prefix, sanitize_filename(filename)))
    }

    fn public_url(&self, key: &Path) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}

/// Keep ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "logo".to_string()
    } else {
        cleaned.to_string()
    }
}
