//! Current round status.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use trebek_game::domain::round::RoundSnapshot;

use crate::state::AppState;

/// GET /api/v1/round
///
/// Never reveals the answer.
async fn current_round(State(state): State<AppState>) -> Json<RoundSnapshot> {
    Json(state.engine.snapshot())
}

/// Returns the router for round status.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(current_round))
}
