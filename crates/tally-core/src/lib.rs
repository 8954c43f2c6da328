//! # tally-core
//!
//! Core types, status workflow, and medal aggregation for Medal Tally.
//!
//! This crate provides the foundational types shared across all tally crates:
//! - Entity structs for teams, categories, events, results, and the audit log
//! - The event status state machine and role enums
//! - Workflow checks (the single authority on legal status changes)
//! - Ranking rules for turning an ordered podium into awarded medals
//! - The pure medal tally aggregation and its leaderboard ordering
//! - ID prefix constants and cross-cutting error types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod ranking;
pub mod responses;
pub mod tally;
pub mod workflow;
