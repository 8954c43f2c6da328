use serde::{Deserialize, Serialize};

/// One team's placement in an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventResult {
    pub id: String,
    pub event_id: String,
    pub team_id: String,
    pub rank: u32,
    pub gold_awarded: u32,
    pub silver_awarded: u32,
    pub bronze_awarded: u32,
}

/// A row of a result submission, before it is stored.
///
/// A submission is the complete result set for an event; it replaces whatever
/// was there before.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultSubmission {
    pub team_id: String,
    pub rank: u32,
    #[serde(default)]
    pub gold_awarded: u32,
    #[serde(default)]
    pub silver_awarded: u32,
    #[serde(default)]
    pub bronze_awarded: u32,
}
