//! ID prefix constants.
//!
//! IDs are generated by the database as `{prefix}-{8 hex chars}`, e.g. `evt-a3f8b2c1`.

pub const PREFIX_TEAM: &str = "tm";
pub const PREFIX_CATEGORY: &str = "cat";
pub const PREFIX_EVENT: &str = "evt";
pub const PREFIX_RESULT: &str = "res";
pub const PREFIX_AUDIT: &str = "aud";
pub const PREFIX_USER: &str = "usr";

/// Every prefix in use, for tests that exercise ID generation.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_TEAM,
    PREFIX_CATEGORY,
    PREFIX_EVENT,
    PREFIX_RESULT,
    PREFIX_AUDIT,
    PREFIX_USER,
];
