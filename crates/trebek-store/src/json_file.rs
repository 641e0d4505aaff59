//! JSON-file score store.
//!
//! Every change overwrites the whole snapshot (write to a sibling temp file,
//! then rename). That is the only durability offered.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trebek_core::clock::Clock;
use trebek_core::error::DomainError;
use trebek_core::scoreboard::{ScoreEntry, ScoreStore};

use crate::rank;

/// Snapshot written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    scores: HashMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

/// Accepted on-disk layouts. Older files hold the bare player map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Snapshot(Snapshot),
    Legacy(HashMap<String, i64>),
}

/// A score store persisted as a JSON file.
pub struct JsonFileScoreboard {
    path: PathBuf,
    scores: Mutex<HashMap<String, i64>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JsonFileScoreboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileScoreboard")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonFileScoreboard {
    /// Loads the scoreboard at `path`.
    ///
    /// A missing file starts an empty scoreboard. An unreadable or corrupt
    /// file is logged and also starts empty; it is overwritten on the first
    /// change.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();
        let scores = match read_snapshot(&path) {
            Ok(Some(scores)) => {
                info!(path = %path.display(), players = scores.len(), "loaded scoreboard");
                scores
            }
            Ok(None) => {
                info!(path = %path.display(), "scoreboard file not found, starting new");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "scoreboard unreadable, starting new");
                HashMap::new()
            }
        };

        Self {
            path,
            scores: Mutex::new(scores),
            clock,
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, scores: &HashMap<String, i64>) {
        if let Err(e) = write_snapshot(&self.path, scores, self.clock.now()) {
            warn!(path = %self.path.display(), error = %e, "failed to save scoreboard");
        }
    }
}

fn read_snapshot(path: &Path) -> Result<Option<HashMap<String, i64>>, DomainError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DomainError::Store(format!("read failed: {e}"))),
    };
    let on_disk: OnDisk = serde_json::from_slice(&raw)
        .map_err(|e| DomainError::Store(format!("corrupt snapshot: {e}")))?;
    Ok(Some(match on_disk {
        OnDisk::Snapshot(snapshot) => snapshot.scores,
        OnDisk::Legacy(scores) => scores,
    }))
}

fn write_snapshot(
    path: &Path,
    scores: &HashMap<String, i64>,
    saved_at: DateTime<Utc>,
) -> Result<(), DomainError> {
    let snapshot = Snapshot {
        scores: scores.clone(),
        saved_at: Some(saved_at),
    };
    let bytes = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| DomainError::Store(format!("serialization failed: {e}")))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).map_err(|e| DomainError::Store(format!("write failed: {e}")))?;
    fs::rename(&tmp, path).map_err(|e| DomainError::Store(format!("rename failed: {e}")))
}

impl ScoreStore for JsonFileScoreboard {
    fn add(&self, player: &str, delta: i64) -> i64 {
        let mut scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        let score = {
            let entry = scores.entry(player.to_owned()).or_insert(0);
            *entry += delta;
            *entry
        };
        self.save(&scores);
        score
    }

    fn get(&self, player: &str) -> i64 {
        let scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        scores.get(player).copied().unwrap_or(0)
    }

    fn reset(&self) {
        let mut scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        scores.clear();
        self.save(&scores);
    }

    fn top(&self, limit: usize) -> Vec<ScoreEntry> {
        let scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        rank(&scores, limit)
    }
}
