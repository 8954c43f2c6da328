//! Repository modules implementing operations for all Medal Tally entities.
//!
//! Each module adds methods to `TallyService` via `impl TallyService` blocks.

pub mod account;
pub mod audit;
pub mod category;
pub mod event;
pub mod result;
pub mod tally;
pub mod team;
