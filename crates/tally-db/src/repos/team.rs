//! Team repository.

use chrono::Utc;
use tally_core::entities::{Team, TeamSummary};
use tally_core::enums::{AuditAction, EntityType};
use tally_core::ids::PREFIX_TEAM;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, require_text, to_json};
use crate::repos::audit::insert_audit;
use crate::service::{TallyService, finish};
use crate::updates::team::TeamUpdate;

const SELECT_COLS: &str = "id, name, acronym, logo_url, created_at, updated_at";

fn row_to_team(row: &libsql::Row) -> Result<Team, DatabaseError> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        acronym: row.get(2)?,
        logo_url: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        updated_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

async fn load_team(conn: &libsql::Connection, id: &str) -> Result<Option<Team>, DatabaseError> {
    let mut rows = conn
        .query(&format!("SELECT {SELECT_COLS} FROM teams WHERE id = ?1"), [id])
        .await?;
    rows.next().await?.map(|row| row_to_team(&row)).transpose()
}

impl TallyService {
    /// Register a team. `logo_url` is the public URL of an already-stored logo.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank name or acronym.
    pub async fn create_team(
        &self,
        actor_id: &str,
        name: &str,
        acronym: &str,
        logo_url: Option<&str>,
    ) -> Result<Team, DatabaseError> {
        let name = require_text("name", name)?;
        let acronym = require_text("acronym", acronym)?;

        let _guard = self.write_guard().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_TEAM).await?;
        let team = Team {
            id: id.clone(),
            name: name.to_string(),
            acronym: acronym.to_string(),
            logo_url: logo_url.map(String::from),
            created_at: now,
            updated_at: now,
        };

        let tx = self.begin().await?;
        let outcome = async {
            tx.execute(
                "INSERT INTO teams (id, name, acronym, logo_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    name,
                    acronym,
                    logo_url,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::AddTeam,
                    Some((EntityType::Team, &id)),
                    format!("Added new team: {name} ({acronym})"),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await
        }
        .await;
        finish(tx, outcome).await?;

        tracing::info!(team_id = %team.id, name = %team.name, "team created");
        Ok(team)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID.
    pub async fn get_team(&self, id: &str) -> Result<Team, DatabaseError> {
        load_team(self.db().conn(), id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Team, id))
    }

    /// All teams ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_teams(&self) -> Result<Vec<Team>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM teams ORDER BY name, id"),
                (),
            )
            .await?;
        let mut teams = Vec::new();
        while let Some(row) = rows.next().await? {
            teams.push(row_to_team(&row)?);
        }
        Ok(teams)
    }

    pub(crate) async fn team_summaries(&self) -> Result<Vec<TeamSummary>, DatabaseError> {
        Ok(self
            .list_teams()
            .await?
            .into_iter()
            .map(TeamSummary::from)
            .collect())
    }

    /// Apply a partial update. An empty update returns the team unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID and
    /// `DatabaseError::Validation` for a blank name or acronym.
    pub async fn update_team(
        &self,
        actor_id: &str,
        team_id: &str,
        update: TeamUpdate,
    ) -> Result<Team, DatabaseError> {
        if update.is_empty() {
            return self.get_team(team_id).await;
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref name) = update.name {
            sets.push(format!("name = ?{idx}"));
            params.push(require_text("name", name)?.into());
            idx += 1;
        }
        if let Some(ref acronym) = update.acronym {
            sets.push(format!("acronym = ?{idx}"));
            params.push(require_text("acronym", acronym)?.into());
            idx += 1;
        }
        if let Some(ref logo_url) = update.logo_url {
            sets.push(format!("logo_url = ?{idx}"));
            params.push(logo_url.clone().map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }

        let now = Utc::now();
        sets.push(format!("updated_at = ?{idx}"));
        params.push(now.to_rfc3339().into());
        idx += 1;
        params.push(team_id.into());
        let sql = format!("UPDATE teams SET {} WHERE id = ?{idx}", sets.join(", "));

        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<Team, DatabaseError> = async {
            let changed = tx.execute(&sql, libsql::params_from_iter(params)).await?;
            if changed == 0 {
                return Err(DatabaseError::not_found(EntityType::Team, team_id));
            }
            let team = load_team(&tx, team_id)
                .await?
                .ok_or(DatabaseError::NoResult)?;

            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::UpdateTeam,
                    Some((EntityType::Team, team_id)),
                    format!("Updated team: {} ({})", team.name, team.acronym),
                    Some(to_json(&update)?),
                )
                .await?;
            insert_audit(&tx, &entry).await?;
            Ok(team)
        }
        .await;
        let team = finish(tx, outcome).await?;

        tracing::info!(team_id, "team updated");
        Ok(team)
    }

    /// Delete a team and, through the foreign key, all of its results.
    ///
    /// Returns the deleted team so callers can clean up its logo.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID.
    pub async fn delete_team(&self, actor_id: &str, team_id: &str) -> Result<Team, DatabaseError> {
        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<Team, DatabaseError> = async {
            let team = load_team(&tx, team_id)
                .await?
                .ok_or_else(|| DatabaseError::not_found(EntityType::Team, team_id))?;
            tx.execute("DELETE FROM teams WHERE id = ?1", [team_id])
                .await?;

            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::DeleteTeam,
                    Some((EntityType::Team, team_id)),
                    format!("Deleted team: {} ({})", team.name, team.acronym),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await?;
            Ok(team)
        }
        .await;
        let team = self.finish_catalog(tx, outcome).await?;

        tracing::info!(team_id, "team deleted");
        Ok(team)
    }
}
