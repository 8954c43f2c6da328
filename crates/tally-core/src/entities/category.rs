use serde::{Deserialize, Serialize};

/// A competition category (academics, music, athletics, ...). Groups events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}
