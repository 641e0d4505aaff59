//! Scoreboard queries.

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use trebek_core::scoreboard::ScoreEntry;

use crate::state::AppState;

/// Rows returned when no limit is given.
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound on the `limit` parameter.
pub const MAX_LIMIT: usize = 100;

/// Query string for GET /api/v1/scores.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Number of rows, capped at [`MAX_LIMIT`].
    pub limit: Option<usize>,
}

/// Leaderboard response.
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    /// Highest score first.
    pub scores: Vec<ScoreEntry>,
}

/// GET /api/v1/scores
async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<LeaderboardResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    Json(LeaderboardResponse {
        scores: state.scores.top(limit),
    })
}

/// GET /api/v1/scores/{player}
async fn player_score(State(state): State<AppState>, Path(player): Path<String>) -> Json<ScoreEntry> {
    let score = state.scores.get(&player);
    Json(ScoreEntry { player, score })
}

/// Returns the router for scoreboard queries.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(leaderboard))
        .route("/{player}", get(player_score))
}
