//! Team update builder.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acronym: Option<String>,
    /// `Some(None)` clears the logo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<Option<String>>,
}

impl TeamUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.acronym.is_none() && self.logo_url.is_none()
    }
}

#[derive(Default)]
pub struct TeamUpdateBuilder(TeamUpdate);

impl TeamUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(TeamUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn acronym(mut self, acronym: impl Into<String>) -> Self {
        self.0.acronym = Some(acronym.into());
        self
    }

    #[must_use]
    pub fn logo_url(mut self, logo_url: Option<String>) -> Self {
        self.0.logo_url = Some(logo_url);
        self
    }

    #[must_use]
    pub fn build(self) -> TeamUpdate {
        self.0
    }
}
