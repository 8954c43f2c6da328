//! Result submission and the approval preview.

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use tally_core::entities::{EventResult, ResultSubmission};
use tally_core::enums::Role;
use tally_core::responses::EventResultView;

use super::audited;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/results", get(preview).post(submit_results))
        .route("/events/{id}/rankings", post(submit_ranking))
}

#[derive(Deserialize)]
struct Submission {
    results: Vec<ResultSubmission>,
}

#[derive(Deserialize)]
struct Ranking {
    /// Team IDs in finishing order.
    team_ids: Vec<String>,
    /// Tied positions, e.g. `"1-2, 4-6"`.
    #[serde(default)]
    ties: String,
}

/// GET /api/events/{id}/results: any signed-in user.
async fn preview(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventResultView>>, ApiError> {
    Ok(Json(state.service.event_results(&id).await?))
}

/// POST /api/events/{id}/results
async fn submit_results(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<Vec<EventResult>>, ApiError> {
    user.require_role(Role::Committee)?;
    let Json(body) = payload?;
    audited(&state, &user, "submitResults", async {
        Ok(Json(
            state
                .service
                .submit_results(user.user_id(), &id, body.results)
                .await?,
        ))
    })
    .await
}

/// POST /api/events/{id}/rankings
async fn submit_ranking(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<Ranking>, JsonRejection>,
) -> Result<Json<Vec<EventResult>>, ApiError> {
    user.require_role(Role::Committee)?;
    let Json(body) = payload?;
    audited(&state, &user, "submitResults", async {
        Ok(Json(
            state
                .service
                .submit_ranking(user.user_id(), &id, &body.team_ids, &body.ties)
                .await?,
        ))
    })
    .await
}
