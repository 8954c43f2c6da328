//! # tally-server
//!
//! axum HTTP API for Medal Tally. [`app`] builds the router over an
//! [`AppState`]; the `medal-tally` binary wires it to configuration.

pub mod api;
pub mod auth;
pub mod error;
pub mod state;
pub mod storage;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// The full application: `/api/*` routes, stored logos, request tracing,
/// and CORS.
pub fn app(state: AppState, cors_permissive: bool) -> Router {
    let mut router = Router::new()
        .nest("/api", api::router(state.max_logo_bytes))
        .merge(api::logos::routes(state.logos.prefix()))
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router.with_state(state)
}
