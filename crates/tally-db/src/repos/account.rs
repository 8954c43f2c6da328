//! Accounts, role assignments, and sessions.
//!
//! Roles are keyed by provider user ID and have no foreign key to `users`, so
//! Clerk subjects can hold a role without a local account.

use chrono::{DateTime, Utc};
use tally_auth::password::hash_password;
use tally_core::entities::Account;
use tally_core::enums::{AuditAction, EntityType, Role};
use tally_core::ids::PREFIX_USER;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, require_text};
use crate::repos::audit::insert_audit;
use crate::service::{TallyService, finish};

const MIN_PASSWORD_LEN: usize = 8;

const SELECT_COLS: &str = "u.id, u.email, r.role, u.created_at";

fn row_to_account(row: &libsql::Row) -> Result<Account, DatabaseError> {
    let role = get_opt_string(row, 2)?
        .map(|s| parse_enum::<Role>(&s))
        .transpose()?;
    Ok(Account {
        id: row.get(0)?,
        email: row.get(1)?,
        role,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

/// A live session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl TallyService {
    /// Create a local account and assign its role.
    ///
    /// `actor_id` is `None` when bootstrapping from the command line.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a malformed email, a password
    /// shorter than eight characters, or an email already in use.
    pub async fn create_account(
        &self,
        actor_id: Option<&str>,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Account, DatabaseError> {
        let email = require_text("email", email)?;
        if !email.contains('@') {
            return Err(DatabaseError::Validation(format!(
                "\"{email}\" is not an email address"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DatabaseError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let password_hash =
            hash_password(password).map_err(|e| DatabaseError::Other(anyhow::anyhow!(e)))?;

        let _guard = self.write_guard().await;
        let now = Utc::now();
        let tx = self.begin().await?;
        let outcome: Result<Account, DatabaseError> = async {
            let mut existing = tx
                .query("SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE", [email])
                .await?;
            if existing.next().await?.is_some() {
                return Err(DatabaseError::Validation(format!(
                    "an account for {email} already exists"
                )));
            }

            let id = self.db().generate_id(PREFIX_USER).await?;
            tx.execute(
                "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), email, password_hash.as_str(), now.to_rfc3339()],
            )
            .await?;
            upsert_role(&tx, &id, role).await?;

            let entry = self
                .new_audit(
                    actor_id,
                    AuditAction::AssignRole,
                    Some((EntityType::Account, &id)),
                    format!("Created account {email} ({role})"),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await?;

            Ok(Account {
                id,
                email: email.to_string(),
                role: Some(role),
                created_at: now,
            })
        }
        .await;
        let account = finish(tx, outcome).await?;

        tracing::info!(user_id = %account.id, role = %role, "account created");
        Ok(account)
    }

    /// Assign (or replace) the role of any provider user ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank user ID.
    pub async fn assign_role(
        &self,
        actor_id: Option<&str>,
        user_id: &str,
        role: Role,
    ) -> Result<(), DatabaseError> {
        let user_id = require_text("user_id", user_id)?;

        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<(), DatabaseError> = async {
            upsert_role(&tx, user_id, role).await?;
            let entry = self
                .new_audit(
                    actor_id,
                    AuditAction::AssignRole,
                    Some((EntityType::Account, user_id)),
                    format!("Assigned role {role} to {user_id}"),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await
        }
        .await;
        finish(tx, outcome).await?;

        tracing::info!(user_id, role = %role, "role assigned");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or the stored role is unknown.
    pub async fn role_for(&self, user_id: &str) -> Result<Option<Role>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT role FROM user_roles WHERE user_id = ?1", [user_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_enum(&row.get::<String>(0)?)?)),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID.
    pub async fn get_account(&self, id: &str) -> Result<Account, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM users u LEFT JOIN user_roles r ON r.user_id = u.id
                     WHERE u.id = ?1"
                ),
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_account(&row),
            None => Err(DatabaseError::not_found(EntityType::Account, id)),
        }
    }

    /// Account plus its stored password hash, for credential checks.
    pub(crate) async fn credentials_for(
        &self,
        email: &str,
    ) -> Result<Option<(Account, String)>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS}, u.password_hash
                     FROM users u LEFT JOIN user_roles r ON r.user_id = u.id
                     WHERE u.email = ?1 COLLATE NOCASE"
                ),
                [email.trim()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some((row_to_account(&row)?, row.get::<String>(4)?))),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Store a session (by token hash) and record the sign-in. Sessions that
    /// have already expired are swept first.
    pub(crate) async fn open_session(
        &self,
        user_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<u64, DatabaseError> = async {
            let swept = tx
                .execute(
                    "DELETE FROM sessions WHERE julianday(expires_at) <= julianday(?1)",
                    [Utc::now().to_rfc3339()],
                )
                .await?;
            tx.execute(
                "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    token_hash,
                    user_id,
                    Utc::now().to_rfc3339(),
                    expires_at.to_rfc3339()
                ],
            )
            .await?;
            let entry = self
                .new_audit(
                    Some(user_id),
                    AuditAction::SignIn,
                    Some((EntityType::Account, user_id)),
                    "Signed in".to_string(),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await?;
            Ok(swept)
        }
        .await;
        let swept = finish(tx, outcome).await?;
        if swept > 0 {
            tracing::debug!(swept, "expired sessions removed");
        }
        Ok(())
    }

    pub(crate) async fn find_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT s.user_id, u.email, s.expires_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token_hash = ?1",
                [token_hash],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(SessionRecord {
                user_id: row.get(0)?,
                email: row.get(1)?,
                expires_at: parse_datetime(&row.get::<String>(2)?)?,
            })),
            None => Ok(None),
        }
    }

    /// Remove an expired session. Not audited: nobody acted.
    pub(crate) async fn drop_session(&self, token_hash: &str) -> Result<(), DatabaseError> {
        let _guard = self.write_guard().await;
        self.db()
            .writer()
            .execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])
            .await?;
        Ok(())
    }

    /// Delete a session and record the sign-out. Returns the session's user,
    /// or `None` if no such session existed.
    pub(crate) async fn close_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<Option<String>, DatabaseError> = async {
            let mut rows = tx
                .query(
                    "SELECT user_id FROM sessions WHERE token_hash = ?1",
                    [token_hash],
                )
                .await?;
            let Some(row) = rows.next().await? else {
                return Ok(None);
            };
            let user_id = row.get::<String>(0)?;

            tx.execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])
                .await?;
            let entry = self
                .new_audit(
                    Some(&user_id),
                    AuditAction::SignOut,
                    Some((EntityType::Account, &user_id)),
                    "Signed out".to_string(),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await?;
            Ok(Some(user_id))
        }
        .await;
        finish(tx, outcome).await
    }
}

async fn upsert_role(
    conn: &libsql::Connection,
    user_id: &str,
    role: Role,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO user_roles (user_id, role, assigned_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET role = excluded.role, assigned_at = excluded.assigned_at",
        libsql::params![user_id, role.as_str(), Utc::now().to_rfc3339()],
    )
    .await?;
    Ok(())
}
