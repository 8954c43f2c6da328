//! HTTP route handlers, mounted under `/api`. Stored logos are served from
//! the site root by [`logos`].

mod audit;
mod auth;
mod categories;
mod events;
mod health;
pub(crate) mod logos;
mod results;
mod tally;
mod teams;

use std::future::Future;

use axum::Router;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Build the API router. `max_logo_bytes` bounds multipart team uploads.
pub fn router(max_logo_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(teams::routes(max_logo_bytes))
        .merge(categories::routes())
        .merge(events::routes())
        .merge(results::routes())
        .merge(tally::routes())
        .merge(audit::routes())
}

/// Run a mutation and, if it fails upstream, append an `error` audit entry
/// for the caller. The audit write is best-effort.
pub(crate) async fn audited<T, F>(
    state: &AppState,
    user: &CurrentUser,
    action: &str,
    work: F,
) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let result = work.await;
    if let Err(err) = &result
        && err.is_upstream()
        && let Err(audit_err) = state
            .service
            .record_failure(Some(user.user_id()), action, &err.to_string())
            .await
    {
        tracing::error!(error = %audit_err, action, "could not record failed action");
    }
    result
}
