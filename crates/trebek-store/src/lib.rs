//! Score stores for the Trebek trivia engine.
//!
//! [`JsonFileScoreboard`] overwrites a JSON snapshot on every change;
//! [`InMemoryScoreboard`] keeps scores for the lifetime of the process.

pub mod json_file;
pub mod memory;

use std::collections::HashMap;

use trebek_core::scoreboard::ScoreEntry;

pub use json_file::JsonFileScoreboard;
pub use memory::InMemoryScoreboard;

/// Orders scores highest first, ties by player name, and keeps `limit` rows.
pub(crate) fn rank(scores: &HashMap<String, i64>, limit: usize) -> Vec<ScoreEntry> {
    let mut entries: Vec<ScoreEntry> = scores
        .iter()
        .map(|(player, score)| ScoreEntry {
            player: player.clone(),
            score: *score,
        })
        .collect();
    entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.player.cmp(&b.player)));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_orders_by_score_then_name() {
        let scores = HashMap::from([
            ("carol".to_owned(), 3),
            ("alice".to_owned(), 5),
            ("bob".to_owned(), 3),
            ("dave".to_owned(), -50),
        ]);

        let ranked = rank(&scores, 3);

        let names: Vec<&str> = ranked.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }
}
