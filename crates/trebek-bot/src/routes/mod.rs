//! HTTP status routes.

pub mod health;
pub mod round;
pub mod scores;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the status server's router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/round", round::router())
        .nest("/api/v1/scores", scores::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
