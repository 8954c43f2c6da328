//! Event update builder. Status is not here: it only changes through
//! `set_status` and result submission.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medal_value: Option<u32>,
}

impl EventUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.category_id.is_none() && self.medal_value.is_none()
    }
}

#[derive(Default)]
pub struct EventUpdateBuilder(EventUpdate);

impl EventUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(EventUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: impl Into<String>) -> Self {
        self.0.category_id = Some(category_id.into());
        self
    }

    #[must_use]
    pub fn medal_value(mut self, medal_value: u32) -> Self {
        self.0.medal_value = Some(medal_value);
        self
    }

    #[must_use]
    pub fn build(self) -> EventUpdate {
        self.0
    }
}
