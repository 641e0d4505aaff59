//! Process-lifetime score store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use trebek_core::scoreboard::{ScoreEntry, ScoreStore};

use crate::rank;

/// A score store that forgets everything on restart.
#[derive(Debug, Default)]
pub struct InMemoryScoreboard {
    scores: Mutex<HashMap<String, i64>>,
}

impl InMemoryScoreboard {
    /// Creates an empty scoreboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for InMemoryScoreboard {
    fn add(&self, player: &str, delta: i64) -> i64 {
        let mut scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        let score = scores.entry(player.to_owned()).or_insert(0);
        *score += delta;
        *score
    }

    fn get(&self, player: &str) -> i64 {
        let scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        scores.get(player).copied().unwrap_or(0)
    }

    fn reset(&self) {
        self.scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn top(&self, limit: usize) -> Vec<ScoreEntry> {
        let scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        rank(&scores, limit)
    }
}
