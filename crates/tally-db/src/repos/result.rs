//! Result submission.
//!
//! A submission is the complete ranking for an event. Inside one transaction
//! it replaces every previous row for the event and moves the event to
//! `for_review`, so a published tally never sees a half-written ranking.

use chrono::Utc;
use tally_core::audit_detail::ResultsSubmittedDetail;
use tally_core::entities::{EventResult, ResultSubmission};
use tally_core::enums::{AuditAction, EntityType, EventStatus};
use tally_core::ids::PREFIX_RESULT;
use tally_core::ranking::{build_ranked_results, parse_tie_groups};
use tally_core::workflow::{check_submission, validate_results};

use crate::error::DatabaseError;
use crate::helpers::{get_u32, to_json};
use crate::repos::audit::insert_audit;
use crate::repos::event::load_event;
use crate::service::{TallyService, event_status, result_count};

const SELECT_COLS: &str =
    "id, event_id, team_id, rank, gold_awarded, silver_awarded, bronze_awarded";

fn row_to_result(row: &libsql::Row) -> Result<EventResult, DatabaseError> {
    Ok(EventResult {
        id: row.get(0)?,
        event_id: row.get(1)?,
        team_id: row.get(2)?,
        rank: get_u32(row, 3)?,
        gold_awarded: get_u32(row, 4)?,
        silver_awarded: get_u32(row, 5)?,
        bronze_awarded: get_u32(row, 6)?,
    })
}

async fn unknown_teams(
    conn: &libsql::Connection,
    results: &[ResultSubmission],
) -> Result<Vec<String>, DatabaseError> {
    let mut missing = Vec::new();
    for row in results {
        let mut rows = conn
            .query("SELECT 1 FROM teams WHERE id = ?1", [row.team_id.as_str()])
            .await?;
        if rows.next().await?.is_none() {
            missing.push(row.team_id.clone());
        }
    }
    Ok(missing)
}

impl TallyService {
    /// Replace an event's results and move it to `for_review`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an empty list, rank 0, a team
    /// listed twice, or an unknown team; `DatabaseError::NotFound` for an
    /// unknown event; and `DatabaseError::InvalidTransition` once the event is
    /// published or locked. Nothing is written on error.
    pub async fn submit_results(
        &self,
        actor_id: &str,
        event_id: &str,
        results: Vec<ResultSubmission>,
    ) -> Result<Vec<EventResult>, DatabaseError> {
        let _guard = self.write_guard().await;
        self.submit_results_locked(actor_id, event_id, results).await
    }

    /// Rank `team_ids` by position, applying `tie_spec` (e.g. `"1-2, 4-6"`),
    /// award the event's medal value to the podium, and submit.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit_results`].
    pub async fn submit_ranking(
        &self,
        actor_id: &str,
        event_id: &str,
        team_ids: &[String],
        tie_spec: &str,
    ) -> Result<Vec<EventResult>, DatabaseError> {
        let _guard = self.write_guard().await;
        let event = load_event(self.db().conn(), event_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Event, event_id))?;

        let results = build_ranked_results(team_ids, &parse_tie_groups(tie_spec), event.medal_value);
        self.submit_results_locked(actor_id, event_id, results).await
    }

    /// Stored results for an event, rank ascending.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_results(&self, event_id: &str) -> Result<Vec<EventResult>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM results WHERE event_id = ?1 ORDER BY rank, team_id"
                ),
                [event_id],
            )
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_result(&row)?);
        }
        Ok(results)
    }

    /// Caller holds the write guard.
    async fn submit_results_locked(
        &self,
        actor_id: &str,
        event_id: &str,
        results: Vec<ResultSubmission>,
    ) -> Result<Vec<EventResult>, DatabaseError> {
        validate_results(&results)?;

        let tx = self.begin().await?;
        let outcome: Result<(Vec<EventResult>, String), DatabaseError> = async {
            let (name, previous) = event_status(&tx, event_id)
                .await?
                .ok_or_else(|| DatabaseError::not_found(EntityType::Event, event_id))?;
            check_submission(event_id, previous)?;

            let missing = unknown_teams(&tx, &results).await?;
            if !missing.is_empty() {
                return Err(DatabaseError::Validation(format!(
                    "unknown team(s): {}",
                    missing.join(", ")
                )));
            }

            let replaced = result_count(&tx, event_id).await?;
            tx.execute("DELETE FROM results WHERE event_id = ?1", [event_id])
                .await?;

            let mut stored = Vec::with_capacity(results.len());
            for row in &results {
                let id = self.db().generate_id(PREFIX_RESULT).await?;
                tx.execute(
                    "INSERT INTO results (id, event_id, team_id, rank, gold_awarded, silver_awarded, bronze_awarded)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    libsql::params![
                        id.as_str(),
                        event_id,
                        row.team_id.as_str(),
                        i64::from(row.rank),
                        i64::from(row.gold_awarded),
                        i64::from(row.silver_awarded),
                        i64::from(row.bronze_awarded)
                    ],
                )
                .await?;
                stored.push(EventResult {
                    id,
                    event_id: event_id.to_string(),
                    team_id: row.team_id.clone(),
                    rank: row.rank,
                    gold_awarded: row.gold_awarded,
                    silver_awarded: row.silver_awarded,
                    bronze_awarded: row.bronze_awarded,
                });
            }

            tx.execute(
                "UPDATE events SET status = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![
                    EventStatus::ForReview.as_str(),
                    Utc::now().to_rfc3339(),
                    event_id
                ],
            )
            .await?;

            let verb = if replaced == 0 { "Submitted" } else { "Updated" };
            let detail = ResultsSubmittedDetail {
                previous_status: previous.to_string(),
                replaced: u32::try_from(replaced).unwrap_or(u32::MAX),
                inserted: u32::try_from(stored.len()).unwrap_or(u32::MAX),
            };
            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::SubmitResults,
                    Some((EntityType::Event, event_id)),
                    format!("{verb} results for event \"{name}\""),
                    Some(to_json(&detail)?),
                )
                .await?;
            insert_audit(&tx, &entry).await?;

            stored.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.team_id.cmp(&b.team_id)));
            Ok((stored, name))
        }
        .await;
        let (stored, name) = self.finish_catalog(tx, outcome).await?;

        tracing::info!(event_id, event = %name, rows = stored.len(), "results submitted");
        Ok(stored)
    }
}
