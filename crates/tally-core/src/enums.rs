//! Status enums, roles, entity types, and audit actions for Medal Tally.
//!
//! Enums serialize in `snake_case` except [`Role`], which keeps the
//! `camelCase` names (`tabHead`) that existing role assignments use.
//! [`EventStatus`] provides `allowed_next_states()` so that every status change
//! is checked against one table.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EventStatus
// ---------------------------------------------------------------------------

/// Status of an event through its publication lifecycle.
///
/// ```text
/// ongoing → for_review → approved → published → locked
///
/// corrections: approved  → for_review
///              published → for_review | approved
/// unlock:      locked    → published
/// ```
///
/// Only `published` results count toward the medal tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Ongoing,
    #[serde(alias = "for review")]
    ForReview,
    Approved,
    Published,
    Locked,
}

impl EventStatus {
    pub const ALL: [Self; 5] = [
        Self::Ongoing,
        Self::ForReview,
        Self::Approved,
        Self::Published,
        Self::Locked,
    ];

    /// Valid `set_status` targets from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Ongoing => &[Self::ForReview],
            Self::ForReview => &[Self::Approved],
            Self::Approved => &[Self::ForReview, Self::Published],
            Self::Published => &[Self::ForReview, Self::Approved, Self::Locked],
            Self::Locked => &[Self::Published],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether a committee may (re)submit results while the event is in this state.
    #[must_use]
    pub const fn accepts_submissions(self) -> bool {
        matches!(self, Self::Ongoing | Self::ForReview | Self::Approved)
    }

    /// Entering this state requires at least one submitted result.
    #[must_use]
    pub const fn requires_results(self) -> bool {
        matches!(self, Self::ForReview | Self::Approved | Self::Published)
    }

    /// Whether results of an event in this state count toward the medal tally.
    #[must_use]
    pub const fn counts_toward_tally(self) -> bool {
        matches!(self, Self::Published)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::ForReview => "for_review",
            Self::Approved => "approved",
            Self::Published => "published",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role assigned to an account. Determines which operations a user may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Admin,
    /// Tabulation head: configures teams, categories, and events; moves events
    /// through review and publication.
    TabHead,
    /// Committee member: submits ranked results.
    Committee,
}

impl Role {
    /// Whether a user holding `self` may act where `required` is demanded.
    ///
    /// `Admin` satisfies every requirement.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self == Self::Admin || self == required
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::TabHead => "tabHead",
            Self::Committee => "committee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Type of action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AddTeam,
    UpdateTeam,
    DeleteTeam,
    AddCategory,
    AddEvent,
    UpdateEvent,
    DeleteEvent,
    SubmitResults,
    StatusChanged,
    AssignRole,
    SignIn,
    SignOut,
    Error,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddTeam => "add_team",
            Self::UpdateTeam => "update_team",
            Self::DeleteTeam => "delete_team",
            Self::AddCategory => "add_category",
            Self::AddEvent => "add_event",
            Self::UpdateEvent => "update_event",
            Self::DeleteEvent => "delete_event",
            Self::SubmitResults => "submit_results",
            Self::StatusChanged => "status_changed",
            Self::AssignRole => "assign_role",
            Self::SignIn => "sign_in",
            Self::SignOut => "sign_out",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of entity, used in the audit log and in not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Team,
    Category,
    Event,
    Result,
    Account,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Category => "category",
            Self::Event => "event",
            Self::Result => "result",
            Self::Account => "account",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EventStatus::Ongoing, EventStatus::ForReview)]
    #[case(EventStatus::ForReview, EventStatus::Approved)]
    #[case(EventStatus::Approved, EventStatus::ForReview)]
    #[case(EventStatus::Approved, EventStatus::Published)]
    #[case(EventStatus::Published, EventStatus::ForReview)]
    #[case(EventStatus::Published, EventStatus::Approved)]
    #[case(EventStatus::Published, EventStatus::Locked)]
    #[case(EventStatus::Locked, EventStatus::Published)]
    fn event_valid_transitions(#[case] from: EventStatus, #[case] to: EventStatus) {
        assert!(from.can_transition_to(to), "{from} -> {to} should be allowed");
    }

    #[rstest]
    #[case(EventStatus::Ongoing, EventStatus::Approved)]
    #[case(EventStatus::Ongoing, EventStatus::Published)]
    #[case(EventStatus::Ongoing, EventStatus::Locked)]
    #[case(EventStatus::ForReview, EventStatus::Published)]
    #[case(EventStatus::ForReview, EventStatus::Ongoing)]
    #[case(EventStatus::Approved, EventStatus::Locked)]
    #[case(EventStatus::Published, EventStatus::Ongoing)]
    #[case(EventStatus::Locked, EventStatus::Ongoing)]
    #[case(EventStatus::Locked, EventStatus::ForReview)]
    fn event_invalid_transitions(#[case] from: EventStatus, #[case] to: EventStatus) {
        assert!(!from.can_transition_to(to), "{from} -> {to} should be rejected");
    }

    #[test]
    fn nothing_returns_to_ongoing() {
        for status in EventStatus::ALL {
            assert!(!status.can_transition_to(EventStatus::Ongoing));
        }
    }

    #[test]
    fn only_published_counts_toward_tally() {
        let counted: Vec<_> = EventStatus::ALL
            .into_iter()
            .filter(|s| s.counts_toward_tally())
            .collect();
        assert_eq!(counted, vec![EventStatus::Published]);
    }

    #[test]
    fn submissions_closed_once_published() {
        assert!(EventStatus::Ongoing.accepts_submissions());
        assert!(EventStatus::Approved.accepts_submissions());
        assert!(!EventStatus::Published.accepts_submissions());
        assert!(!EventStatus::Locked.accepts_submissions());
    }

    #[test]
    fn for_review_accepts_legacy_spelling() {
        let spaced: EventStatus = serde_json::from_str("\"for review\"").unwrap();
        let snake: EventStatus = serde_json::from_str("\"for_review\"").unwrap();
        assert_eq!(spaced, EventStatus::ForReview);
        assert_eq!(snake, EventStatus::ForReview);
        assert_eq!(
            serde_json::to_string(&EventStatus::ForReview).unwrap(),
            "\"for_review\""
        );
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::TabHead).unwrap(), "\"tabHead\"");
        let role: Role = serde_json::from_str("\"committee\"").unwrap();
        assert_eq!(role, Role::Committee);
    }

    #[test]
    fn admin_satisfies_every_role() {
        assert!(Role::Admin.satisfies(Role::TabHead));
        assert!(Role::Admin.satisfies(Role::Committee));
        assert!(Role::TabHead.satisfies(Role::TabHead));
        assert!(!Role::Committee.satisfies(Role::TabHead));
        assert!(!Role::TabHead.satisfies(Role::Admin));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(format!("{}", EventStatus::ForReview), "for_review");
        assert_eq!(format!("{}", Role::TabHead), "tabHead");
        assert_eq!(format!("{}", AuditAction::SubmitResults), "submit_results");
        assert_eq!(format!("{}", EntityType::Category), "category");
        for action in [AuditAction::StatusChanged, AuditAction::AddTeam] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
