//! # tally-db
//!
//! libSQL persistence for Medal Tally: teams, categories, events, results,
//! accounts, sessions, roles, and the append-only audit log.
//!
//! [`TallyDb`] owns the connections and schema. [`service::TallyService`]
//! layers the status workflow, write serialization, and the event catalog
//! cache on top; every repo method is an `impl TallyService` block under
//! [`repos`].

pub mod auth_provider;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

pub use auth_provider::DbAuthProvider;
pub use error::DatabaseError;
pub use service::TallyService;

use libsql::Builder;

/// Central database handle.
///
/// Reads go through `conn`; transactions run on `writer`, so readers only
/// ever see committed rows. In-memory databases have a single connection
/// (each new connection to `:memory:` would be a separate, empty database).
pub struct TallyDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    writer: libsql::Connection,
}

impl TallyDb {
    /// Open a local database file (or `:memory:`), running migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let in_memory = path.is_empty() || path == ":memory:";
        let tally_db = Self::init(db, !in_memory).await?;
        if !in_memory {
            tally_db.use_wal().await?;
        }
        Ok(tally_db)
    }

    /// Open a remote libSQL database (Turso) over the network.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection or migrations fail.
    pub async fn open_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await?;
        Self::init(db, true).await
    }

    async fn init(db: libsql::Database, separate_writer: bool) -> Result<Self, DatabaseError> {
        let conn = db.connect()?;
        enable_foreign_keys(&conn).await?;

        let writer = if separate_writer {
            let writer = db.connect()?;
            enable_foreign_keys(&writer).await?;
            writer
        } else {
            conn.clone()
        };

        let tally_db = Self { db, conn, writer };
        tally_db.run_migrations().await?;
        Ok(tally_db)
    }

    /// WAL lets the reader connection run while a write transaction is open;
    /// the busy timeout covers the short checkpoint windows.
    async fn use_wal(&self) -> Result<(), DatabaseError> {
        for (conn, pragma) in [
            (&self.writer, "PRAGMA journal_mode = WAL"),
            (&self.writer, "PRAGMA busy_timeout = 5000"),
            (&self.conn, "PRAGMA busy_timeout = 5000"),
        ] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DatabaseError::Migration(format!("{pragma}: {e}")))?;
            rows.next().await?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Connection that owns write transactions.
    #[must_use]
    pub const fn writer(&self) -> &libsql::Connection {
        &self.writer
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"evt-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

/// Foreign keys are off by default and must be enabled per connection.
async fn enable_foreign_keys(conn: &libsql::Connection) -> Result<(), DatabaseError> {
    conn.execute("PRAGMA foreign_keys = ON", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;
    Ok(())
}
