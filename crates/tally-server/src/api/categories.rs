use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use serde::Deserialize;
use tally_core::entities::Category;
use tally_core::enums::Role;
use tally_core::responses::CategoryStatusSummary;
use tally_core::tally::TallyEntry;

use super::audited;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/status-summary", get(status_summary))
        .route("/categories/{id}/tally", get(category_tally))
}

#[derive(Deserialize)]
struct NewCategory {
    name: String,
}

/// GET /api/categories
async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.service.list_categories().await?))
}

/// POST /api/categories
async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    user.require_role(Role::TabHead)?;
    let Json(body) = payload?;
    audited(&state, &user, "addCategory", async {
        let category = state
            .service
            .create_category(user.user_id(), &body.name)
            .await?;
        Ok((StatusCode::CREATED, Json(category)))
    })
    .await
}

/// GET /api/categories/status-summary
async fn status_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryStatusSummary>>, ApiError> {
    Ok(Json(state.service.category_status_summary().await?))
}

/// GET /api/categories/{id}/tally
async fn category_tally(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TallyEntry>>, ApiError> {
    Ok(Json(state.service.category_tally(&id).await?))
}
