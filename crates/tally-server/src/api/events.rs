//! Event management and status changes.

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use tally_core::entities::Event;
use tally_core::enums::{EventStatus, Role};
use tally_core::responses::CategoryWithEvents;
use tally_db::updates::event::EventUpdate;

use super::audited;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/events/{id}/status", post(set_status))
}

const fn default_medal_value() -> u32 {
    1
}

#[derive(Deserialize)]
struct NewEvent {
    name: String,
    category_id: String,
    #[serde(default = "default_medal_value")]
    medal_value: u32,
}

#[derive(Deserialize)]
struct StatusChange {
    status: EventStatus,
}

/// GET /api/events: every category with its events, from the catalog cache.
async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithEvents>>, ApiError> {
    Ok(Json(state.service.list_events_by_category().await?))
}

/// POST /api/events
async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    user.require_role(Role::TabHead)?;
    let Json(body) = payload?;
    audited(&state, &user, "addEvent", async {
        let event = state
            .service
            .create_event(user.user_id(), &body.name, &body.category_id, body.medal_value)
            .await?;
        Ok((StatusCode::CREATED, Json(event)))
    })
    .await
}

/// GET /api/events/{id}
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.service.get_event(&id).await?))
}

/// PATCH /api/events/{id}
async fn update_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<EventUpdate>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
    user.require_role(Role::TabHead)?;
    let Json(update) = payload?;
    audited(&state, &user, "updateEvent", async {
        Ok(Json(
            state
                .service
                .update_event(user.user_id(), &id, update)
                .await?,
        ))
    })
    .await
}

/// DELETE /api/events/{id}
async fn delete_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_role(Role::TabHead)?;
    audited(&state, &user, "deleteEvent", async {
        state.service.delete_event(user.user_id(), &id).await?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

/// POST /api/events/{id}/status
async fn set_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
    user.require_role(Role::TabHead)?;
    let Json(change) = payload?;
    audited(&state, &user, "setStatus", async {
        Ok(Json(
            state
                .service
                .set_status(user.user_id(), &id, change.status)
                .await?,
        ))
    })
    .await
}
