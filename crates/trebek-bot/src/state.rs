//! Shared application state.

use std::sync::Arc;

use trebek_core::scoreboard::ScoreStore;
use trebek_game::application::engine::RoundEngine;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The round engine, read for status snapshots.
    pub engine: Arc<RoundEngine>,
    /// The score store.
    pub scores: Arc<dyn ScoreStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(engine: Arc<RoundEngine>, scores: Arc<dyn ScoreStore>) -> Self {
        Self { engine, scores }
    }
}
