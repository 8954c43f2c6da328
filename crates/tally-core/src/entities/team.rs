use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A competing team (department).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub acronym: String,
    /// Public URL of the uploaded logo, if any.
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public identity of a team, embedded in leaderboards and result listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
    pub acronym: String,
    pub logo_url: Option<String>,
}

impl From<Team> for TeamSummary {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            acronym: team.acronym,
            logo_url: team.logo_url,
        }
    }
}
