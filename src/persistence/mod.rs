//! Settings and autosave persistence
//!
//! Features:
//! - [`Persistence`] collaborator contract used by the state machine
//! - JSON files written tmp-then-rename so a crash never leaves half a file
//! - In-memory store for tests and hosts without a filesystem

mod file;
mod memory;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::error::StorageError;
use crate::settings::Settings;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Continue data: enough to restart the saved run at the start of its level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub level: u32,
    pub score: u64,
    pub lives: u32,
    pub difficulty: Difficulty,
    pub next_milestone: u64,
    pub milestone_index: usize,
    pub extra_lives_granted: u32,
    /// Levels whose one-time extra life was collected
    #[serde(default)]
    pub extra_life_levels: Vec<u32>,
}

/// Load/save of settings and autosave progress
pub trait Persistence {
    /// `Ok(None)` when nothing was saved yet
    fn load_settings(&mut self) -> Result<Option<Settings>, StorageError>;
    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError>;
    /// `Ok(None)` when there is nothing to continue
    fn load_progress(&mut self) -> Result<Option<ProgressSnapshot>, StorageError>;
    fn save_progress(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StorageError>;
    fn clear_progress(&mut self) -> Result<(), StorageError>;
    /// Cheap check used to show Continue on the main menu
    fn has_progress(&self) -> bool;
}

/// Serialize `value` to `path` through a temporary sibling file
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| StorageError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read JSON from `path`; a missing file is `Ok(None)`
pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, StorageError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })
}
