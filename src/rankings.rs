//! Ranking table
//!
//! Top 10 runs, descending by score. A JSON file keeps it between sessions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::error::StorageError;
use crate::persistence::{read_json, write_json};

/// Maximum number of entries to keep
pub const MAX_RANKINGS: usize = 10;

/// Longest accepted player name
pub const MAX_NAME_LEN: usize = 12;

/// A single ranking entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub score: u64,
    /// Level reached
    pub level: u32,
    pub difficulty: Difficulty,
}

/// Ranking store collaborator contract
pub trait RankingStore {
    /// Whether `score` would enter the table
    fn is_high_score(&self, score: u64) -> bool;
    /// Insert a run; returns the 1-based rank, or `None` if it did not qualify
    fn add_score(&mut self, name: &str, score: u64, level: u32, difficulty: Difficulty) -> Option<usize>;
    /// Entries in rank order
    fn get_rankings(&self) -> &[RankingEntry];
}

/// In-memory ranking table
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Rankings {
    pub entries: Vec<RankingEntry>,
}

impl Rankings {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the table
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_RANKINGS {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert an entry if it qualifies. Equal scores rank after the
    /// existing ones.
    pub fn insert(&mut self, entry: RankingEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }
        let rank = match self.entries.iter().position(|e| entry.score > e.score) {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_RANKINGS);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trim and shorten a typed name; blank names become "PLAYER"
pub fn sanitize_name(name: &str) -> String {
    let trimmed: String = name
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    if trimmed.is_empty() {
        "PLAYER".to_string()
    } else {
        trimmed
    }
}

impl RankingStore for Rankings {
    fn is_high_score(&self, score: u64) -> bool {
        self.qualifies(score)
    }

    fn add_score(&mut self, name: &str, score: u64, level: u32, difficulty: Difficulty) -> Option<usize> {
        self.insert(RankingEntry {
            name: sanitize_name(name),
            score,
            level,
            difficulty,
        })
    }

    fn get_rankings(&self) -> &[RankingEntry] {
        &self.entries
    }
}

/// Rankings backed by a JSON file, written after every insert
#[derive(Debug, Clone)]
pub struct FileRankingStore {
    path: PathBuf,
    table: Rankings,
}

impl FileRankingStore {
    /// Load the table at `path`. A missing file starts an empty table; a
    /// corrupt one is logged and replaced on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = match Self::read(&path) {
            Ok(Some(table)) => {
                log::info!("Loaded {} rankings from {}", table.entries.len(), path.display());
                table
            }
            Ok(None) => {
                log::info!("No rankings at {}, starting fresh", path.display());
                Rankings::new()
            }
            Err(err) => {
                log::warn!("Ignoring unreadable rankings: {}", err);
                Rankings::new()
            }
        };
        Self { path, table }
    }

    fn read(path: &Path) -> Result<Option<Rankings>, StorageError> {
        let Some(mut table) = read_json::<Rankings>(path)? else {
            return Ok(None);
        };
        // Hand-edited files may be out of order
        table.entries.sort_by(|a, b| b.score.cmp(&a.score));
        table.entries.truncate(MAX_RANKINGS);
        Ok(Some(table))
    }

    pub fn save(&self) -> Result<(), StorageError> {
        write_json(&self.path, &self.table)
    }

    pub fn table(&self) -> &Rankings {
        &self.table
    }
}

impl RankingStore for FileRankingStore {
    fn is_high_score(&self, score: u64) -> bool {
        self.table.is_high_score(score)
    }

    fn add_score(&mut self, name: &str, score: u64, level: u32, difficulty: Difficulty) -> Option<usize> {
        let rank = self.table.add_score(name, score, level, difficulty)?;
        if let Err(err) = self.save() {
            log::warn!("Could not save rankings: {}", err);
        }
        Some(rank)
    }

    fn get_rankings(&self) -> &[RankingEntry] {
        self.table.get_rankings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn filled(scores: &[u64]) -> Rankings {
        let mut table = Rankings::new();
        for (i, &score) in scores.iter().enumerate() {
            table.add_score(&format!("P{i}"), score, 1, Difficulty::Normal);
        }
        table
    }

    #[test]
    fn test_zero_never_qualifies() {
        let table = Rankings::new();
        assert!(!table.is_high_score(0));
        assert!(table.is_high_score(1));
    }

    #[test]
    fn test_sorted_descending_and_capped() {
        let table = filled(&[500, 100, 900, 300, 700, 200, 800, 400, 600, 1_000, 50]);
        assert_eq!(table.entries.len(), MAX_RANKINGS);
        let scores: Vec<u64> = table.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![1_000, 900, 800, 700, 600, 500, 400, 300, 200, 100]);
        assert!(!table.is_high_score(100));
        assert!(table.is_high_score(101));
    }

    #[test]
    fn test_ties_keep_earlier_entry_first() {
        let mut table = filled(&[500]);
        assert_eq!(table.add_score("late", 500, 3, Difficulty::Hard), Some(2));
        assert_eq!(table.entries[0].name, "P0");
        assert_eq!(table.entries[1].level, 3);
        assert_eq!(table.entries[1].difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_potential_rank() {
        let table = filled(&[300, 200, 100]);
        assert_eq!(table.potential_rank(250), Some(2));
        assert_eq!(table.potential_rank(50), Some(4));
        assert_eq!(table.potential_rank(0), None);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  ana  "), "ana");
        assert_eq!(sanitize_name(""), "PLAYER");
        assert_eq!(sanitize_name("abcdefghijklmnopq").len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("sky-dash-rank-{}", std::process::id()));
        let path = dir.join("rankings.json");
        let _ = fs::remove_file(&path);

        let mut store = FileRankingStore::open(&path);
        assert!(store.get_rankings().is_empty());
        assert_eq!(store.add_score("ana", 4_200, 9, Difficulty::Easy), Some(1));

        let reopened = FileRankingStore::open(&path);
        assert_eq!(reopened.get_rankings().len(), 1);
        assert_eq!(reopened.get_rankings()[0].name, "ana");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = std::env::temp_dir().join(format!("sky-dash-rank-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rankings.json");
        fs::write(&path, "{ not json").unwrap();
        let store = FileRankingStore::open(&path);
        assert!(store.get_rankings().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }
}
