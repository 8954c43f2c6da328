//! Event repository and status workflow.
//!
//! Status changes go through [`TallyService::set_status`], which consults the
//! transition table in `tally_core::workflow`. Result submission moves events
//! to `for_review` separately (see `repos::result`).

use chrono::Utc;
use tally_core::audit_detail::StatusChangedDetail;
use tally_core::entities::{Event, TeamSummary};
use tally_core::enums::{AuditAction, EntityType, EventStatus};
use tally_core::ids::PREFIX_EVENT;
use tally_core::responses::{CategoryWithEvents, EventBrief, EventResultView};
use tally_core::workflow::{Transition, check_transition};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_u32, parse_datetime, parse_enum, require_text, to_json};
use crate::repos::audit::insert_audit;
use crate::repos::category::category_exists;
use crate::service::{TallyService, event_status, finish, result_count};
use crate::updates::event::EventUpdate;

const SELECT_COLS: &str = "id, name, category_id, medal_value, status, created_at, updated_at";

fn row_to_event(row: &libsql::Row) -> Result<Event, DatabaseError> {
    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        category_id: row.get(2)?,
        medal_value: get_u32(row, 3)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

pub(crate) async fn load_event(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<Event>, DatabaseError> {
    let mut rows = conn
        .query(&format!("SELECT {SELECT_COLS} FROM events WHERE id = ?1"), [id])
        .await?;
    rows.next().await?.map(|row| row_to_event(&row)).transpose()
}

async fn require_category(conn: &libsql::Connection, id: &str) -> Result<(), DatabaseError> {
    if category_exists(conn, id).await? {
        Ok(())
    } else {
        Err(DatabaseError::Validation(format!(
            "category {id} does not exist"
        )))
    }
}

impl TallyService {
    /// Create an event in `ongoing` status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank name or unknown category.
    pub async fn create_event(
        &self,
        actor_id: &str,
        name: &str,
        category_id: &str,
        medal_value: u32,
    ) -> Result<Event, DatabaseError> {
        let name = require_text("name", name)?;
        let category_id = require_text("category_id", category_id)?;

        let _guard = self.write_guard().await;
        let now = Utc::now();
        let tx = self.begin().await?;
        let outcome: Result<Event, DatabaseError> = async {
            require_category(&tx, category_id).await?;

            let id = self.db().generate_id(PREFIX_EVENT).await?;
            tx.execute(
                "INSERT INTO events (id, name, category_id, medal_value, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    name,
                    category_id,
                    i64::from(medal_value),
                    EventStatus::Ongoing.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::AddEvent,
                    Some((EntityType::Event, &id)),
                    format!("Created new event: \"{name}\""),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await?;

            Ok(Event {
                id,
                name: name.to_string(),
                category_id: category_id.to_string(),
                medal_value,
                status: EventStatus::Ongoing,
                created_at: now,
                updated_at: now,
            })
        }
        .await;
        let event = self.finish_catalog(tx, outcome).await?;

        tracing::info!(event_id = %event.id, name = %event.name, "event created");
        Ok(event)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID.
    pub async fn get_event(&self, id: &str) -> Result<Event, DatabaseError> {
        load_event(self.db().conn(), id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Event, id))
    }

    /// Apply a partial update to name, category, or medal value.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID and
    /// `DatabaseError::Validation` for a blank name or unknown category.
    pub async fn update_event(
        &self,
        actor_id: &str,
        event_id: &str,
        update: EventUpdate,
    ) -> Result<Event, DatabaseError> {
        if update.is_empty() {
            return self.get_event(event_id).await;
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref name) = update.name {
            sets.push(format!("name = ?{idx}"));
            params.push(require_text("name", name)?.into());
            idx += 1;
        }
        if let Some(ref category_id) = update.category_id {
            sets.push(format!("category_id = ?{idx}"));
            params.push(require_text("category_id", category_id)?.into());
            idx += 1;
        }
        if let Some(medal_value) = update.medal_value {
            sets.push(format!("medal_value = ?{idx}"));
            params.push(i64::from(medal_value).into());
            idx += 1;
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(Utc::now().to_rfc3339().into());
        idx += 1;
        params.push(event_id.into());
        let sql = format!("UPDATE events SET {} WHERE id = ?{idx}", sets.join(", "));

        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<Event, DatabaseError> = async {
            if load_event(&tx, event_id).await?.is_none() {
                return Err(DatabaseError::not_found(EntityType::Event, event_id));
            }
            if let Some(ref category_id) = update.category_id {
                require_category(&tx, category_id.trim()).await?;
            }

            tx.execute(&sql, libsql::params_from_iter(params)).await?;
            let event = load_event(&tx, event_id)
                .await?
                .ok_or(DatabaseError::NoResult)?;

            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::UpdateEvent,
                    Some((EntityType::Event, event_id)),
                    format!("Updated event: \"{}\"", event.name),
                    Some(to_json(&update)?),
                )
                .await?;
            insert_audit(&tx, &entry).await?;
            Ok(event)
        }
        .await;
        let event = self.finish_catalog(tx, outcome).await?;

        tracing::info!(event_id, "event updated");
        Ok(event)
    }

    /// Delete an event together with its results.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID.
    pub async fn delete_event(&self, actor_id: &str, event_id: &str) -> Result<Event, DatabaseError> {
        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<Event, DatabaseError> = async {
            let event = load_event(&tx, event_id)
                .await?
                .ok_or_else(|| DatabaseError::not_found(EntityType::Event, event_id))?;

            // Explicit so the cascade does not depend on the connection's PRAGMA.
            tx.execute("DELETE FROM results WHERE event_id = ?1", [event_id])
                .await?;
            tx.execute("DELETE FROM events WHERE id = ?1", [event_id])
                .await?;

            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::DeleteEvent,
                    Some((EntityType::Event, event_id)),
                    format!("Deleted event ID: {event_id}"),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await?;
            Ok(event)
        }
        .await;
        let event = self.finish_catalog(tx, outcome).await?;

        tracing::info!(event_id, "event deleted");
        Ok(event)
    }

    /// All categories with their events, served from the catalog cache.
    ///
    /// Categories without events are included with an empty list.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the catalog has to be loaded and the query fails.
    pub async fn list_events_by_category(&self) -> Result<Vec<CategoryWithEvents>, DatabaseError> {
        let generation = match self.cached_catalog().await {
            Ok(catalog) => return Ok(catalog),
            Err(generation) => generation,
        };

        let mut catalog: Vec<CategoryWithEvents> = self
            .list_categories()
            .await?
            .into_iter()
            .map(|c| CategoryWithEvents {
                id: c.id,
                name: c.name,
                events: Vec::new(),
            })
            .collect();

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, status, medal_value, category_id FROM events ORDER BY name, id",
                (),
            )
            .await?;
        while let Some(row) = rows.next().await? {
            let category_id = row.get::<String>(4)?;
            let brief = EventBrief {
                id: row.get(0)?,
                name: row.get(1)?,
                status: parse_enum(&row.get::<String>(2)?)?,
                medal_value: get_u32(&row, 3)?,
            };
            if let Some(group) = catalog.iter_mut().find(|c| c.id == category_id) {
                group.events.push(brief);
            }
        }

        tracing::debug!(categories = catalog.len(), "event catalog loaded");
        self.store_catalog(generation, catalog.clone()).await;
        Ok(catalog)
    }

    /// Move an event to `status`.
    ///
    /// Requesting the current status succeeds without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown event,
    /// `DatabaseError::InvalidTransition` when the workflow forbids the move,
    /// and `DatabaseError::Validation` when the target status needs results
    /// that do not exist.
    pub async fn set_status(
        &self,
        actor_id: &str,
        event_id: &str,
        status: EventStatus,
    ) -> Result<Event, DatabaseError> {
        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<(Event, bool), DatabaseError> = async {
            let (name, current) = event_status(&tx, event_id)
                .await?
                .ok_or_else(|| DatabaseError::not_found(EntityType::Event, event_id))?;
            let count = result_count(&tx, event_id).await?;

            let (from, to) = match check_transition(event_id, current, status, count)? {
                Transition::NoOp => {
                    let event = load_event(&tx, event_id)
                        .await?
                        .ok_or(DatabaseError::NoResult)?;
                    return Ok((event, false));
                }
                Transition::Change { from, to } => (from, to),
            };

            tx.execute(
                "UPDATE events SET status = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![to.as_str(), Utc::now().to_rfc3339(), event_id],
            )
            .await?;

            let detail = StatusChangedDetail {
                from: from.to_string(),
                to: to.to_string(),
            };
            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::StatusChanged,
                    Some((EntityType::Event, event_id)),
                    format!("Set event \"{name}\" status: {from} → {to}"),
                    Some(to_json(&detail)?),
                )
                .await?;
            insert_audit(&tx, &entry).await?;

            let event = load_event(&tx, event_id)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            Ok((event, true))
        }
        .await;
        let settled = finish(tx, outcome).await;
        if !matches!(settled, Ok((_, false))) {
            self.invalidate_catalog().await;
        }
        let (event, changed) = settled?;

        if changed {
            tracing::info!(event_id, status = %event.status, "event status changed");
        }
        Ok(event)
    }

    /// Current ranking of an event, rank ascending, with team identity.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown event.
    pub async fn event_results(&self, event_id: &str) -> Result<Vec<EventResultView>, DatabaseError> {
        let conn = self.db().conn();
        if load_event(conn, event_id).await?.is_none() {
            return Err(DatabaseError::not_found(EntityType::Event, event_id));
        }

        let mut rows = conn
            .query(
                "SELECT r.rank, r.gold_awarded, r.silver_awarded, r.bronze_awarded,
                        t.id, t.name, t.acronym, t.logo_url
                 FROM results r JOIN teams t ON t.id = r.team_id
                 WHERE r.event_id = ?1
                 ORDER BY r.rank, t.name, t.id",
                [event_id],
            )
            .await?;

        let mut views = Vec::new();
        while let Some(row) = rows.next().await? {
            views.push(EventResultView {
                rank: get_u32(&row, 0)?,
                gold_awarded: get_u32(&row, 1)?,
                silver_awarded: get_u32(&row, 2)?,
                bronze_awarded: get_u32(&row, 3)?,
                team: TeamSummary {
                    id: row.get(4)?,
                    name: row.get(5)?,
                    acronym: row.get(6)?,
                    logo_url: get_opt_string(&row, 7)?,
                },
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{seed_category, seed_team, submit_simple, test_service};
    use crate::updates::event::EventUpdateBuilder;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[tokio::test]
    async fn create_starts_ongoing() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let event = svc.create_event("usr-1", "Choir", &cat.id, 2).await.unwrap();
        assert_eq!(event.status, EventStatus::Ongoing);
        assert_eq!(event.medal_value, 2);
        assert_eq!(svc.get_event(&event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn create_with_unknown_category_rejected() {
        let svc = test_service().await;
        let err = svc
            .create_event("usr-1", "Choir", "cat-missing", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn update_moves_category_and_value() {
        let svc = test_service().await;
        let music = seed_category(&svc, "Music").await;
        let dance = seed_category(&svc, "Dance").await;
        let event = svc.create_event("usr-1", "Hip-hop", &music.id, 1).await.unwrap();

        let updated = svc
            .update_event(
                "usr-1",
                &event.id,
                EventUpdateBuilder::new()
                    .category_id(dance.id.clone())
                    .medal_value(3)
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.category_id, dance.id);
        assert_eq!(updated.medal_value, 3);
        assert_eq!(updated.name, "Hip-hop");
    }

    #[tokio::test]
    async fn update_to_unknown_category_rejected() {
        let svc = test_service().await;
        let music = seed_category(&svc, "Music").await;
        let event = svc.create_event("usr-1", "Choir", &music.id, 1).await.unwrap();
        let err = svc
            .update_event(
                "usr-1",
                &event.id,
                EventUpdateBuilder::new().category_id("cat-nope").build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert_eq!(svc.get_event(&event.id).await.unwrap().category_id, music.id);
    }

    #[tokio::test]
    async fn delete_removes_results() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let team = seed_team(&svc, "Arts", "CAS").await;
        let event = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        submit_simple(&svc, &event.id, &[&team.id]).await;

        svc.delete_event("usr-1", &event.id).await.unwrap();
        assert!(matches!(
            svc.get_event(&event.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        let mut rows = svc
            .db()
            .conn()
            .query("SELECT COUNT(*) FROM results", ())
            .await
            .unwrap();
        assert_eq!(rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap(), 0);
    }

    #[tokio::test]
    async fn catalog_groups_and_caches() {
        let svc = test_service().await;
        let music = seed_category(&svc, "Music").await;
        seed_category(&svc, "Athletics").await;
        svc.create_event("usr-1", "Solo", &music.id, 1).await.unwrap();
        svc.create_event("usr-1", "Choir", &music.id, 1).await.unwrap();

        assert!(!svc.catalog_is_cached().await);
        let catalog = svc.list_events_by_category().await.unwrap();
        assert!(svc.catalog_is_cached().await);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].name, "Athletics");
        assert!(catalog[0].events.is_empty());
        let names: Vec<_> = catalog[1].events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Choir", "Solo"]);
    }

    #[tokio::test]
    async fn status_change_invalidates_catalog() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let team = seed_team(&svc, "Arts", "CAS").await;
        let event = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        submit_simple(&svc, &event.id, &[&team.id]).await;

        svc.list_events_by_category().await.unwrap();
        svc.set_status("usr-1", &event.id, EventStatus::Approved)
            .await
            .unwrap();
        assert!(!svc.catalog_is_cached().await);

        let catalog = svc.list_events_by_category().await.unwrap();
        assert_eq!(catalog[0].events[0].status, EventStatus::Approved);
    }

    #[tokio::test]
    async fn set_status_writes_audit_with_data() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let team = seed_team(&svc, "Arts", "CAS").await;
        let event = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        submit_simple(&svc, &event.id, &[&team.id]).await;

        svc.set_status("usr-1", &event.id, EventStatus::Approved)
            .await
            .unwrap();

        let log = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::StatusChanged),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(
            log[0].entry.detail,
            "Set event \"Choir\" status: for_review → approved"
        );
        assert_eq!(
            log[0].entry.data,
            Some(serde_json::json!({"from": "for_review", "to": "approved"}))
        );
    }

    #[tokio::test]
    async fn same_status_is_silent() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let event = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        let before = svc.query_audit(&AuditFilter::default()).await.unwrap().len();

        let same = svc
            .set_status("usr-1", &event.id, EventStatus::Ongoing)
            .await
            .unwrap();
        assert_eq!(same.status, EventStatus::Ongoing);
        assert_eq!(
            svc.query_audit(&AuditFilter::default()).await.unwrap().len(),
            before
        );
    }

    #[rstest]
    #[case(EventStatus::Published)]
    #[case(EventStatus::Approved)]
    #[case(EventStatus::Locked)]
    #[tokio::test]
    async fn ongoing_cannot_skip_ahead(#[case] target: EventStatus) {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let event = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        let err = svc.set_status("usr-1", &event.id, target).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidTransition(_)));
        assert_eq!(
            svc.get_event(&event.id).await.unwrap().status,
            EventStatus::Ongoing
        );
    }

    #[tokio::test]
    async fn for_review_without_results_rejected() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let event = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        let err = svc
            .set_status("usr-1", &event.id, EventStatus::ForReview)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_event_status_change_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .set_status("usr-1", "evt-nope", EventStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn results_preview_in_rank_order() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let a = seed_team(&svc, "Arts", "CAS").await;
        let b = seed_team(&svc, "Business", "CBA").await;
        let event = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        submit_simple(&svc, &event.id, &[&b.id, &a.id]).await;

        let preview = svc.event_results(&event.id).await.unwrap();
        let order: Vec<_> = preview.iter().map(|r| (r.rank, r.team.acronym.as_str())).collect();
        assert_eq!(order, vec![(1, "CBA"), (2, "CAS")]);

        assert!(matches!(
            svc.event_results("evt-nope").await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
