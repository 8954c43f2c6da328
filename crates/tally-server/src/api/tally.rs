use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use tally_core::tally::TallyEntry;

use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/tally", get(medal_tally))
}

/// GET /api/tally: the public leaderboard, recomputed per request.
async fn medal_tally(State(state): State<AppState>) -> Result<Json<Vec<TallyEntry>>, ApiError> {
    Ok(Json(state.service.medal_tally().await?))
}
