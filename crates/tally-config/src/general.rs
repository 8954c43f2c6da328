//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default number of audit entries returned.
const fn default_audit_log_limit() -> u32 {
    20
}

/// Largest accepted logo upload: 5 MiB.
const fn default_max_logo_bytes() -> usize {
    5 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default limit for the audit log listing.
    #[serde(default = "default_audit_log_limit")]
    pub audit_log_limit: u32,

    #[serde(default = "default_max_logo_bytes")]
    pub max_logo_bytes: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audit_log_limit: default_audit_log_limit(),
            max_logo_bytes: default_max_logo_bytes(),
        }
    }
}
