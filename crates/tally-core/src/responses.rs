//! Read-model shapes returned by the query side of the service.
//!
//! These are assembled from joins in `tally-db` and serialized unchanged by the
//! HTTP layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{AuditEntry, TeamSummary};
use crate::enums::{EventStatus, Role};
use crate::tally::MedalCount;

/// Event listing item nested under its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBrief {
    pub id: String,
    pub name: String,
    pub status: EventStatus,
    pub medal_value: u32,
}

/// A category with all of its events: the "all events" catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWithEvents {
    pub id: String,
    pub name: String,
    pub events: Vec<EventBrief>,
}

/// One row of an event's current ranking, joined with the team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResultView {
    pub rank: u32,
    pub team: TeamSummary,
    pub gold_awarded: u32,
    pub silver_awarded: u32,
    pub bronze_awarded: u32,
}

/// Medals a team earned in one published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMedals {
    pub event_name: String,
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

/// A team's published results grouped by category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamBreakdown {
    pub team: TeamSummary,
    pub totals: MedalCount,
    pub categories: BTreeMap<String, Vec<EventMedals>>,
}

impl TeamBreakdown {
    #[must_use]
    pub fn new(team: TeamSummary) -> Self {
        Self {
            team,
            totals: MedalCount::default(),
            categories: BTreeMap::new(),
        }
    }

    /// Record one published result under `category`.
    pub fn push(&mut self, category: String, medals: EventMedals) {
        self.totals
            .add(MedalCount::new(medals.gold, medals.silver, medals.bronze));
        self.categories.entry(category).or_default().push(medals);
    }
}

/// Count of events per status within one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub ongoing: u32,
    pub for_review: u32,
    pub approved: u32,
    pub published: u32,
    pub locked: u32,
}

impl StatusCounts {
    pub fn bump(&mut self, status: EventStatus) {
        let slot = match status {
            EventStatus::Ongoing => &mut self.ongoing,
            EventStatus::ForReview => &mut self.for_review,
            EventStatus::Approved => &mut self.approved,
            EventStatus::Published => &mut self.published,
            EventStatus::Locked => &mut self.locked,
        };
        *slot = slot.saturating_add(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStatusSummary {
    pub id: String,
    pub name: String,
    pub counts: StatusCounts,
}

/// Audit entry with the actor's email resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogView {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub actor_email: Option<String>,
}

/// Returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub expires_at: DateTime<Utc>,
}

/// `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
}
