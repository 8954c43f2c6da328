use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{AuditAction, EntityType};

/// An append-only audit log entry recording a mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    /// User who performed the action. `None` for system actions (e.g. bootstrap).
    pub actor_id: Option<String>,
    pub action: AuditAction,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    /// Human-readable description, e.g. `Added new team: Engineering (COE)`.
    pub detail: String,
    /// Structured payload (see `audit_detail`).
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
