//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some` fields
//! generate SET clauses in the dynamic UPDATE SQL. The update is also stored as
//! the audit `data` payload (changed fields only).

pub mod event;
pub mod team;
