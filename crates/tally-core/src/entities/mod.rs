//! Entity structs for all Medal Tally domain objects.
//!
//! Each entity maps to a table in the libSQL database (see
//! `tally-db/migrations/001_initial.sql`). All structs derive `Serialize` and
//! `Deserialize` so they double as JSON response bodies.

mod account;
mod audit;
mod category;
mod event;
mod result;
mod team;

pub use account::Account;
pub use audit::AuditEntry;
pub use category::Category;
pub use event::Event;
pub use result::{EventResult, ResultSubmission};
pub use team::{Team, TeamSummary};
