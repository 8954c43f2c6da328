//! Read-only tally queries.
//!
//! Only results of published events qualify. Every call reads a fresh
//! snapshot and runs the pure aggregation in `tally_core::tally`.

use tally_core::entities::TeamSummary;
use tally_core::enums::{EntityType, EventStatus};
use tally_core::responses::{CategoryStatusSummary, EventMedals, StatusCounts, TeamBreakdown};
use tally_core::tally::{MedalCount, QualifyingResult, TallyEntry, compute_tally, without_empty};

use crate::error::DatabaseError;
use crate::helpers::{get_u32, parse_enum};
use crate::service::TallyService;

fn row_to_qualifying(row: &libsql::Row) -> Result<QualifyingResult, DatabaseError> {
    Ok(QualifyingResult {
        team_id: row.get(0)?,
        medals: MedalCount::new(get_u32(row, 1)?, get_u32(row, 2)?, get_u32(row, 3)?),
    })
}

impl TallyService {
    async fn qualifying_results(
        &self,
        category_id: Option<&str>,
    ) -> Result<Vec<QualifyingResult>, DatabaseError> {
        let published = EventStatus::Published.as_str();
        let mut rows = match category_id {
            Some(category_id) => {
                self.db()
                    .conn()
                    .query(
                        "SELECT r.team_id, r.gold_awarded, r.silver_awarded, r.bronze_awarded
                         FROM results r JOIN events e ON e.id = r.event_id
                         WHERE e.status = ?1 AND e.category_id = ?2",
                        libsql::params![published, category_id],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        "SELECT r.team_id, r.gold_awarded, r.silver_awarded, r.bronze_awarded
                         FROM results r JOIN events e ON e.id = r.event_id
                         WHERE e.status = ?1",
                        [published],
                    )
                    .await?
            }
        };

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_qualifying(&row)?);
        }
        Ok(results)
    }

    /// The overall leaderboard. Every team appears, including those without medals.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn medal_tally(&self) -> Result<Vec<TallyEntry>, DatabaseError> {
        let teams = self.team_summaries().await?;
        let results = self.qualifying_results(None).await?;
        Ok(compute_tally(teams, results))
    }

    /// Leaderboard for one category, without teams that earned nothing there.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown category.
    pub async fn category_tally(&self, category_id: &str) -> Result<Vec<TallyEntry>, DatabaseError> {
        self.get_category(category_id).await?;
        let teams = self.team_summaries().await?;
        let results = self.qualifying_results(Some(category_id)).await?;
        Ok(without_empty(compute_tally(teams, results)))
    }

    /// Published medals of one team grouped by category name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown team.
    pub async fn team_breakdown(&self, team_id: &str) -> Result<TeamBreakdown, DatabaseError> {
        let team = self.get_team(team_id).await?;
        let mut breakdown = TeamBreakdown::new(TeamSummary::from(team));

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT c.name, e.name, r.gold_awarded, r.silver_awarded, r.bronze_awarded
                 FROM results r
                 JOIN events e ON e.id = r.event_id
                 JOIN categories c ON c.id = e.category_id
                 WHERE r.team_id = ?1 AND e.status = ?2
                 ORDER BY c.name, e.name",
                libsql::params![team_id, EventStatus::Published.as_str()],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            breakdown.push(
                row.get::<String>(0)?,
                EventMedals {
                    event_name: row.get(1)?,
                    gold: get_u32(&row, 2)?,
                    silver: get_u32(&row, 3)?,
                    bronze: get_u32(&row, 4)?,
                },
            );
        }
        Ok(breakdown)
    }

    /// Per category, how many events sit in each status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn category_status_summary(
        &self,
    ) -> Result<Vec<CategoryStatusSummary>, DatabaseError> {
        let mut summary: Vec<CategoryStatusSummary> = self
            .list_categories()
            .await?
            .into_iter()
            .map(|c| CategoryStatusSummary {
                id: c.id,
                name: c.name,
                counts: StatusCounts::default(),
            })
            .collect();

        let mut rows = self
            .db()
            .conn()
            .query("SELECT category_id, status FROM events", ())
            .await?;
        while let Some(row) = rows.next().await? {
            let category_id = row.get::<String>(0)?;
            let status: EventStatus = parse_enum(&row.get::<String>(1)?)?;
            match summary.iter_mut().find(|s| s.id == category_id) {
                Some(entry) => entry.counts.bump(status),
                None => {
                    return Err(DatabaseError::not_found(EntityType::Category, &category_id));
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{publish, seed_category, seed_team, submit_simple, test_service};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn only_published_events_count() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let a = seed_team(&svc, "Arts", "CAS").await;
        let choir = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        let solo = svc.create_event("usr-1", "Solo", &cat.id, 1).await.unwrap();

        submit_simple(&svc, &choir.id, &[&a.id]).await;
        submit_simple(&svc, &solo.id, &[&a.id]).await;
        publish(&svc, &choir.id).await;

        let tally = svc.medal_tally().await.unwrap();
        assert_eq!(tally.len(), 1);
        assert_eq!(tally[0].gold, 1);
    }

    #[tokio::test]
    async fn locked_events_drop_out() {
        let svc = test_service().await;
        let cat = seed_category(&svc, "Music").await;
        let a = seed_team(&svc, "Arts", "CAS").await;
        let choir = svc.create_event("usr-1", "Choir", &cat.id, 1).await.unwrap();
        submit_simple(&svc, &choir.id, &[&a.id]).await;
        publish(&svc, &choir.id).await;
        svc.set_status("usr-t", &choir.id, EventStatus::Locked)
            .await
            .unwrap();

        assert_eq!(svc.medal_tally().await.unwrap()[0].total, 0);
    }

    #[tokio::test]
    async fn category_tally_filters_and_drops_empty() {
        let svc = test_service().await;
        let music = seed_category(&svc, "Music").await;
        let sports = seed_category(&svc, "Sports").await;
        let a = seed_team(&svc, "Arts", "CAS").await;
        let b = seed_team(&svc, "Business", "CBA").await;
        let choir = svc.create_event("usr-1", "Choir", &music.id, 1).await.unwrap();
        let relay = svc.create_event("usr-1", "Relay", &sports.id, 1).await.unwrap();
        submit_simple(&svc, &choir.id, &[&a.id]).await;
        submit_simple(&svc, &relay.id, &[&b.id]).await;
        publish(&svc, &choir.id).await;
        publish(&svc, &relay.id).await;

        let music_tally = svc.category_tally(&music.id).await.unwrap();
        assert_eq!(music_tally.len(), 1);
        assert_eq!(music_tally[0].team.id, a.id);

        assert!(matches!(
            svc.category_tally("cat-nope").await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn breakdown_groups_by_category() {
        let svc = test_service().await;
        let music = seed_category(&svc, "Music").await;
        let sports = seed_category(&svc, "Sports").await;
        let a = seed_team(&svc, "Arts", "CAS").await;
        let b = seed_team(&svc, "Business", "CBA").await;
        let choir = svc.create_event("usr-1", "Choir", &music.id, 1).await.unwrap();
        let relay = svc.create_event("usr-1", "Relay", &sports.id, 2).await.unwrap();
        submit_simple(&svc, &choir.id, &[&a.id, &b.id]).await;
        submit_simple(&svc, &relay.id, &[&b.id, &a.id]).await;
        publish(&svc, &choir.id).await;
        publish(&svc, &relay.id).await;

        let breakdown = svc.team_breakdown(&a.id).await.unwrap();
        assert_eq!(breakdown.totals, MedalCount::new(1, 2, 0));
        assert_eq!(breakdown.categories.len(), 2);
        assert_eq!(breakdown.categories["Sports"][0].event_name, "Relay");
        assert_eq!(breakdown.categories["Sports"][0].silver, 2);
    }

    #[tokio::test]
    async fn status_summary_counts_every_event() {
        let svc = test_service().await;
        let music = seed_category(&svc, "Music").await;
        seed_category(&svc, "Sports").await;
        let a = seed_team(&svc, "Arts", "CAS").await;
        let choir = svc.create_event("usr-1", "Choir", &music.id, 1).await.unwrap();
        svc.create_event("usr-1", "Solo", &music.id, 1).await.unwrap();
        submit_simple(&svc, &choir.id, &[&a.id]).await;

        let summary = svc.category_status_summary().await.unwrap();
        assert_eq!(summary[0].name, "Music");
        assert_eq!(summary[0].counts.ongoing, 1);
        assert_eq!(summary[0].counts.for_review, 1);
        assert_eq!(summary[1].counts, StatusCounts::default());
    }
}
