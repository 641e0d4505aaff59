//! Score store abstraction.

use serde::Serialize;

/// A single scoreboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEntry {
    /// Player nick.
    pub player: String,
    /// Accumulated score. May be negative after hint penalties.
    pub score: i64,
}

/// Mapping from player to integer score.
///
/// Persistence failures are the store's concern; the trivia engine treats the
/// store as a sink for point deltas and never fails a round because of it.
pub trait ScoreStore: Send + Sync {
    /// Adds `delta` to `player`'s score and returns the new total.
    fn add(&self, player: &str, delta: i64) -> i64;

    /// Returns `player`'s score, `0` if the player has never scored.
    fn get(&self, player: &str) -> i64;

    /// Removes every score.
    fn reset(&self);

    /// Returns up to `limit` entries, highest score first. Ties are ordered
    /// by player name.
    fn top(&self, limit: usize) -> Vec<ScoreEntry>;
}
