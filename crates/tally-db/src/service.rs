//! Service layer orchestrating database mutations with audit.
//!
//! `TallyService` wraps `TallyDb`. All repo methods are implemented as
//! `impl TallyService` blocks in `repos/`.
//!
//! Every mutation method follows this protocol:
//! 1. Acquire the write lock
//! 2. Begin transaction
//! 3. Validate against current rows and execute SQL
//! 4. Append audit entry (inside transaction)
//! 5. Commit, or roll back on any error
//! 6. Invalidate the event catalog if events, categories, or results were
//!    touched, after commit or rollback alike

use tally_core::enums::EventStatus;
use tally_core::responses::CategoryWithEvents;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::TallyDb;
use crate::error::DatabaseError;

const DEFAULT_AUDIT_LIMIT: u32 = 20;

/// Cached catalog plus a generation that every invalidation bumps. A load
/// that started before an invalidation is not stored.
#[derive(Default)]
struct CatalogCache {
    generation: u64,
    entries: Option<Vec<CategoryWithEvents>>,
}

pub struct TallyService {
    db: TallyDb,
    write_lock: Mutex<()>,
    catalog: RwLock<CatalogCache>,
    audit_limit: u32,
}

impl TallyService {
    /// Open a local database (file path or `":memory:"`).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        Ok(Self::from_db(TallyDb::open_local(db_path).await?))
    }

    /// Open a remote libSQL database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection or migrations fail.
    pub async fn new_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        Ok(Self::from_db(TallyDb::open_remote(url, auth_token).await?))
    }

    #[must_use]
    pub fn from_db(db: TallyDb) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
            catalog: RwLock::new(CatalogCache::default()),
            audit_limit: DEFAULT_AUDIT_LIMIT,
        }
    }

    /// Default number of entries returned by audit queries without a limit.
    #[must_use]
    pub const fn with_audit_limit(mut self, limit: u32) -> Self {
        self.audit_limit = limit;
        self
    }

    #[must_use]
    pub const fn db(&self) -> &TallyDb {
        &self.db
    }

    #[must_use]
    pub const fn audit_limit(&self) -> u32 {
        self.audit_limit
    }

    /// Serialize mutations. Held for the whole transaction.
    pub(crate) async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    pub(crate) async fn begin(&self) -> Result<libsql::Transaction, DatabaseError> {
        Ok(self.db.writer().transaction().await?)
    }

    // -----------------------------------------------------------------------
    // Event catalog cache
    // -----------------------------------------------------------------------

    /// The cached catalog, or the generation a fresh load must present to
    /// [`Self::store_catalog`].
    pub(crate) async fn cached_catalog(&self) -> Result<Vec<CategoryWithEvents>, u64> {
        let cache = self.catalog.read().await;
        cache.entries.clone().ok_or(cache.generation)
    }

    pub(crate) async fn store_catalog(&self, generation: u64, catalog: Vec<CategoryWithEvents>) {
        let mut cache = self.catalog.write().await;
        if cache.generation == generation {
            cache.entries = Some(catalog);
        } else {
            tracing::debug!("discarding event catalog loaded before an invalidation");
        }
    }

    /// Drop the cached event catalog; the next read reloads it.
    pub async fn invalidate_catalog(&self) {
        let mut cache = self.catalog.write().await;
        cache.generation = cache.generation.wrapping_add(1);
        if cache.entries.take().is_some() {
            tracing::debug!("event catalog cache invalidated");
        }
    }

    /// Whether the catalog is currently cached.
    pub async fn catalog_is_cached(&self) -> bool {
        self.catalog.read().await.entries.is_some()
    }

    /// [`finish`] for mutations that touch the catalog. The cache is
    /// invalidated whether the transaction committed or rolled back.
    pub(crate) async fn finish_catalog<T>(
        &self,
        tx: libsql::Transaction,
        outcome: Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let settled = finish(tx, outcome).await;
        self.invalidate_catalog().await;
        settled
    }
}

/// Commit on success, roll back on failure.
///
/// A rollback error is logged and the original error is returned.
pub(crate) async fn finish<T>(
    tx: libsql::Transaction,
    outcome: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::error!(error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Count result rows for an event.
pub(crate) async fn result_count(
    conn: &libsql::Connection,
    event_id: &str,
) -> Result<u64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COUNT(*) FROM results WHERE event_id = ?1", [event_id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    let count = row.get::<i64>(0)?;
    u64::try_from(count).map_err(|_| DatabaseError::InvalidState(format!("negative count {count}")))
}

/// Load an event's status inside a transaction.
pub(crate) async fn event_status(
    conn: &libsql::Connection,
    event_id: &str,
) -> Result<Option<(String, EventStatus)>, DatabaseError> {
    let mut rows = conn
        .query("SELECT name, status FROM events WHERE id = ?1", [event_id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some((
            row.get::<String>(0)?,
            crate::helpers::parse_enum(&row.get::<String>(1)?)?,
        ))),
        None => Ok(None),
    }
}
