//! Typed audit data payloads.
//!
//! Every audit entry carries free-text `detail`; some actions also attach a
//! structured `data` JSON blob with one of these shapes.

use serde::{Deserialize, Serialize};

/// Data for `AuditAction::StatusChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: String,
    pub to: String,
}

/// Data for `AuditAction::SubmitResults`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultsSubmittedDetail {
    pub previous_status: String,
    pub replaced: u32,
    pub inserted: u32,
}

/// Data for `AuditAction::Error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedActionDetail {
    pub action: String,
    pub message: String,
}
