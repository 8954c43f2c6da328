//! Team management and per-team results.

use axum::Router;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, put};
use serde::Deserialize;
use tally_core::entities::Team;
use tally_core::enums::Role;
use tally_core::responses::TeamBreakdown;
use tally_db::updates::team::TeamUpdateBuilder;

use super::audited;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Room for the text fields and multipart framing around a logo.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub(super) fn routes(max_logo_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{id}", axum::routing::patch(update_team).delete(delete_team))
        .route("/teams/{id}/logo", put(replace_logo))
        .route("/teams/{id}/breakdown", get(breakdown))
        .layer(DefaultBodyLimit::max(
            max_logo_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ))
}

/// Fields of a team multipart form. The logo field is `logo_file`
/// (`logoFile` and `logo` are accepted too).
#[derive(Default)]
struct TeamForm {
    name: Option<String>,
    acronym: Option<String>,
    logo: Option<(String, Vec<u8>)>,
}

async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    max_logo_bytes: usize,
) -> Result<TeamForm, ApiError> {
    let mut multipart = multipart.map_err(|r| ApiError::BadRequest(r.body_text()))?;
    let mut form = TeamForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = Some(field.text().await?),
            "acronym" => form.acronym = Some(field.text().await?),
            "logo_file" | "logoFile" | "logo" => {
                let filename = field.file_name().unwrap_or("logo").to_string();
                let bytes = field.bytes().await?;
                if bytes.len() > max_logo_bytes {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "logo exceeds {max_logo_bytes} bytes"
                    )));
                }
                if !bytes.is_empty() {
                    form.logo = Some((filename, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// GET /api/teams
async fn list_teams(State(state): State<AppState>) -> Result<Json<Vec<Team>>, ApiError> {
    Ok(Json(state.service.list_teams().await?))
}

/// POST /api/teams (multipart: name, acronym, logo_file)
async fn create_team(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    user.require_role(Role::TabHead)?;
    let form = read_form(multipart, state.max_logo_bytes).await?;
    let (Some(name), Some(acronym)) = (form.name, form.acronym) else {
        return Err(ApiError::BadRequest("name and acronym are required".into()));
    };

    audited(&state, &user, "addTeam", async {
        let logo_url = match form.logo {
            Some((filename, bytes)) => Some(state.logos.put_logo(&filename, bytes).await?),
            None => None,
        };
        let created = state
            .service
            .create_team(user.user_id(), &name, &acronym, logo_url.as_deref())
            .await;
        match created {
            Ok(team) => Ok((StatusCode::CREATED, Json(team))),
            Err(err) => {
                if let Some(url) = logo_url {
                    state.logos.remove_by_url(&url).await;
                }
                Err(err.into())
            }
        }
    })
    .await
}

#[derive(Deserialize)]
struct TeamPatch {
    name: Option<String>,
    acronym: Option<String>,
}

/// PATCH /api/teams/{id}
async fn update_team(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<TeamPatch>, JsonRejection>,
) -> Result<Json<Team>, ApiError> {
    user.require_role(Role::TabHead)?;
    let Json(patch) = payload?;

    let mut update = TeamUpdateBuilder::new();
    if let Some(name) = patch.name {
        update = update.name(name);
    }
    if let Some(acronym) = patch.acronym {
        update = update.acronym(acronym);
    }

    audited(&state, &user, "updateTeam", async {
        Ok(Json(
            state
                .service
                .update_team(user.user_id(), &id, update.build())
                .await?,
        ))
    })
    .await
}

/// PUT /api/teams/{id}/logo (multipart: logo_file)
async fn replace_logo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Team>, ApiError> {
    user.require_role(Role::TabHead)?;
    let form = read_form(multipart, state.max_logo_bytes).await?;
    let Some((filename, bytes)) = form.logo else {
        return Err(ApiError::BadRequest("logo_file is required".into()));
    };

    audited(&state, &user, "updateTeamLogo", async {
        let previous = state.service.get_team(&id).await?;
        let url = state.logos.put_logo(&filename, bytes).await?;
        let updated = state
            .service
            .update_team(
                user.user_id(),
                &id,
                TeamUpdateBuilder::new().logo_url(Some(url.clone())).build(),
            )
            .await;
        match updated {
            Ok(team) => {
                if let Some(old) = previous.logo_url {
                    state.logos.remove_by_url(&old).await;
                }
                Ok(Json(team))
            }
            Err(err) => {
                state.logos.remove_by_url(&url).await;
                Err(err.into())
            }
        }
    })
    .await
}

/// DELETE /api/teams/{id}
async fn delete_team(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_role(Role::TabHead)?;
    audited(&state, &user, "deleteTeam", async {
        let team = state.service.delete_team(user.user_id(), &id).await?;
        if let Some(url) = team.logo_url {
            state.logos.remove_by_url(&url).await;
        }
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

/// GET /api/teams/{id}/breakdown
async fn breakdown(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TeamBreakdown>, ApiError> {
    Ok(Json(state.service.team_breakdown(&id).await?))
}
