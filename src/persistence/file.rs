use std::fs;
use std::path::{Path, PathBuf};

use super::{read_json, write_json, Persistence, ProgressSnapshot};
use crate::error::StorageError;
use crate::settings::Settings;

const SETTINGS_FILE: &str = "settings.json";
const PROGRESS_FILE: &str = "progress.json";

/// Settings and autosave as JSON files in one data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }
}

impl Persistence for JsonFileStore {
    fn load_settings(&mut self) -> Result<Option<Settings>, StorageError> {
        Ok(read_json::<Settings>(&self.settings_path())?.map(Settings::clamped))
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        write_json(&self.settings_path(), settings)?;
        log::info!("Settings saved");
        Ok(())
    }

    fn load_progress(&mut self) -> Result<Option<ProgressSnapshot>, StorageError> {
        read_json(&self.progress_path())
    }

    fn save_progress(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        write_json(&self.progress_path(), snapshot)
    }

    fn clear_progress(&mut self) -> Result<(), StorageError> {
        let path = self.progress_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn has_progress(&self) -> bool {
        self.progress_path().is_file()
    }
}
