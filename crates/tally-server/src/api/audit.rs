use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use serde::Deserialize;
use tally_core::enums::{AuditAction, Role};
use tally_core::responses::AuditLogView;
use tally_db::repos::audit::AuditFilter;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/audit", get(audit_log))
}

#[derive(Deserialize)]
struct AuditQuery {
    limit: Option<u32>,
    action: Option<AuditAction>,
}

/// GET /api/audit?limit=&action=
async fn audit_log(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<Vec<AuditLogView>>, ApiError> {
    user.require_role(Role::TabHead)?;
    let Query(query) = query?;
    let filter = AuditFilter {
        action: query.action,
        limit: query.limit,
        ..Default::default()
    };
    Ok(Json(state.service.query_audit(&filter).await?))
}
