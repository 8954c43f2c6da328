//! Audit log repository.
//!
//! Append-only entries recording every mutation. The table rejects UPDATE and
//! DELETE through triggers.

use chrono::Utc;
use tally_core::audit_detail::FailedActionDetail;
use tally_core::entities::AuditEntry;
use tally_core::enums::{AuditAction, EntityType};
use tally_core::ids::PREFIX_AUDIT;
use tally_core::responses::AuditLogView;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json, to_json};
use crate::service::TallyService;

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    /// Falls back to the service's configured audit limit.
    pub limit: Option<u32>,
}

/// Insert an entry on `conn`, which may be an open transaction.
pub(crate) async fn insert_audit(
    conn: &libsql::Connection,
    entry: &AuditEntry,
) -> Result<(), DatabaseError> {
    let data = entry
        .data
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::Other(e.into()))?;
    conn.execute(
        "INSERT INTO audit_log (id, actor_id, action, entity_type, entity_id, detail, data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        libsql::params![
            entry.id.as_str(),
            entry.actor_id.as_deref(),
            entry.action.as_str(),
            entry.entity_type.map(EntityType::as_str),
            entry.entity_id.as_deref(),
            entry.detail.as_str(),
            data,
            entry.created_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

impl TallyService {
    /// Build an entry with a fresh ID and the current time.
    pub(crate) async fn new_audit(
        &self,
        actor_id: Option<&str>,
        action: AuditAction,
        entity: Option<(EntityType, &str)>,
        detail: String,
        data: Option<serde_json::Value>,
    ) -> Result<AuditEntry, DatabaseError> {
        Ok(AuditEntry {
            id: self.db().generate_id(PREFIX_AUDIT).await?,
            actor_id: actor_id.map(String::from),
            action,
            entity_type: entity.map(|(t, _)| t),
            entity_id: entity.map(|(_, id)| id.to_string()),
            detail,
            data,
            created_at: Utc::now(),
        })
    }

    /// Append a standalone audit entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_audit(&self, entry: &AuditEntry) -> Result<(), DatabaseError> {
        let _guard = self.write_guard().await;
        insert_audit(self.db().writer(), entry).await
    }

    /// Record a failed mutation as `Failed action "<action>": <message>`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn record_failure(
        &self,
        actor_id: Option<&str>,
        action: &str,
        message: &str,
    ) -> Result<(), DatabaseError> {
        let detail = FailedActionDetail {
            action: action.to_string(),
            message: message.to_string(),
        };
        let entry = self
            .new_audit(
                actor_id,
                AuditAction::Error,
                None,
                format!("Failed action \"{action}\": {message}"),
                Some(to_json(&detail)?),
            )
            .await?;
        self.append_audit(&entry).await
    }

    /// Newest-first audit entries with the actor's email resolved.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(
        &self,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditLogView>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("a.action = ?{}", params.len()));
        }
        if let Some(entity_type) = filter.entity_type {
            params.push(libsql::Value::Text(entity_type.as_str().to_string()));
            conditions.push(format!("a.entity_type = ?{}", params.len()));
        }
        if let Some(ref entity_id) = filter.entity_id {
            params.push(libsql::Value::Text(entity_id.clone()));
            conditions.push(format!("a.entity_id = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(self.audit_limit());
        let sql = format!(
            "SELECT a.id, a.actor_id, a.action, a.entity_type, a.entity_id, a.detail, a.data, a.created_at, u.email
             FROM audit_log a LEFT JOIN users u ON u.id = a.actor_id
             {where_clause}
             ORDER BY a.created_at DESC, a.rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let entity_type = get_opt_string(&row, 3)?
                .map(|s| parse_enum::<EntityType>(&s))
                .transpose()?;
            entries.push(AuditLogView {
                entry: AuditEntry {
                    id: row.get::<String>(0)?,
                    actor_id: get_opt_string(&row, 1)?,
                    action: parse_enum(&row.get::<String>(2)?)?,
                    entity_type,
                    entity_id: get_opt_string(&row, 4)?,
                    detail: row.get::<String>(5)?,
                    data: parse_optional_json(get_opt_string(&row, 6)?.as_deref())?,
                    created_at: parse_datetime(&row.get::<String>(7)?)?,
                },
                actor_email: get_opt_string(&row, 8)?,
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn newest_first_with_default_limit() {
        let svc = test_service().await.with_audit_limit(3);
        for i in 0..5 {
            svc.record_failure(None, "addTeam", &format!("boom {i}"))
                .await
                .unwrap();
        }

        let entries = svc.query_audit(&AuditFilter::default()).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].entry.detail, "Failed action \"addTeam\": boom 4");
        assert_eq!(entries[2].entry.detail, "Failed action \"addTeam\": boom 2");
    }

    #[tokio::test]
    async fn failure_carries_structured_data() {
        let svc = test_service().await;
        svc.record_failure(Some("usr-x"), "submitResults", "db down")
            .await
            .unwrap();

        let entries = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::Error),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0].entry;
        assert_eq!(entry.actor_id.as_deref(), Some("usr-x"));
        assert_eq!(
            entry.data,
            Some(serde_json::json!({"action": "submitResults", "message": "db down"}))
        );
        assert_eq!(entries[0].actor_email, None);
    }

    #[tokio::test]
    async fn filter_by_action() {
        let svc = test_service().await;
        svc.record_failure(None, "a", "x").await.unwrap();
        let entries = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::AddTeam),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(entries.is_empty());
    }
}
