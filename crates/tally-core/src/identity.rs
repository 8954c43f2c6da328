use serde::{Deserialize, Serialize};

use crate::enums::Role;

/// Lightweight authenticated user identity for cross-crate passing.
///
/// Produced by an auth provider, enriched with the role from the role store,
/// and consumed by request handlers and the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    /// Stable user ID (local `usr-…` or the Clerk `sub` claim).
    pub user_id: String,
    /// Email, when the provider knows it.
    pub email: Option<String>,
    /// Role from the role store. `None` = authenticated but unassigned.
    pub role: Option<Role>,
}

impl AuthIdentity {
    /// Whether this identity may act where `required` is demanded.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.role.is_some_and(|role| role.satisfies(required))
    }
}
