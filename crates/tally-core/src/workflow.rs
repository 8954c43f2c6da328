//! Guards for the event status workflow.
//!
//! These are the checks the database layer runs inside its transactions
//! before touching any rows. They are pure so the rules can be tested
//! without storage.

use std::collections::HashSet;

use crate::entities::ResultSubmission;
use crate::enums::EventStatus;
use crate::errors::CoreError;

/// Outcome of a status change request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event is already in the requested status.
    NoOp,
    /// The event moves `from` → `to`.
    Change { from: EventStatus, to: EventStatus },
}

/// Validate the shape of a result submission.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] for an empty list, a blank team ID, a
/// team listed twice, or rank 0.
pub fn validate_results(results: &[ResultSubmission]) -> Result<(), CoreError> {
    if results.is_empty() {
        return Err(CoreError::Validation(
            "at least one result is required".into(),
        ));
    }

    let mut seen = HashSet::with_capacity(results.len());
    for row in results {
        if row.team_id.trim().is_empty() {
            return Err(CoreError::Validation("every result needs a team_id".into()));
        }
        if row.rank == 0 {
            return Err(CoreError::Validation(format!(
                "rank for team {} must be 1 or greater",
                row.team_id
            )));
        }
        if !seen.insert(row.team_id.as_str()) {
            return Err(CoreError::Validation(format!(
                "team {} is listed more than once",
                row.team_id
            )));
        }
    }

    Ok(())
}

/// Check that an event in `status` still accepts a result submission.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTransition`] once the event is published or locked.
pub fn check_submission(event_id: &str, status: EventStatus) -> Result<(), CoreError> {
    if status.accepts_submissions() {
        Ok(())
    } else {
        Err(CoreError::event_transition(
            event_id,
            status,
            EventStatus::ForReview,
        ))
    }
}

/// Decide whether `from` → `to` may happen given how many results exist.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTransition`] when the table forbids the move,
/// and [`CoreError::Validation`] when the target needs results and there are none.
pub fn check_transition(
    event_id: &str,
    from: EventStatus,
    to: EventStatus,
    result_count: u64,
) -> Result<Transition, CoreError> {
    if from == to {
        return Ok(Transition::NoOp);
    }
    if !from.can_transition_to(to) {
        return Err(CoreError::event_transition(event_id, from, to));
    }
    if to.requires_results() && result_count == 0 {
        return Err(CoreError::Validation(format!(
            "event {event_id} has no results; a ranking must exist before it can be {to}"
        )));
    }
    Ok(Transition::Change { from, to })
}
