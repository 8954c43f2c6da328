use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::EventStatus;

/// A single contest within a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub category_id: String,
    /// Medals awarded to each podium place (gold to rank 1, silver to 2, bronze to 3).
    pub medal_value: u32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
