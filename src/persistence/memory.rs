use super::{Persistence, ProgressSnapshot};
use crate::error::StorageError;
use crate::settings::Settings;

/// Persistence that keeps everything in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub settings: Option<Settings>,
    pub progress: Option<ProgressSnapshot>,
    /// Number of settings saves (lets tests check when saving happens)
    pub settings_saves: u32,
}

impl Persistence for MemoryStore {
    fn load_settings(&mut self) -> Result<Option<Settings>, StorageError> {
        Ok(self.settings.clone())
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        self.settings = Some(settings.clone());
        self.settings_saves += 1;
        Ok(())
    }

    fn load_progress(&mut self) -> Result<Option<ProgressSnapshot>, StorageError> {
        Ok(self.progress.clone())
    }

    fn save_progress(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        self.progress = Some(snapshot.clone());
        Ok(())
    }

    fn clear_progress(&mut self) -> Result<(), StorageError> {
        self.progress = None;
        Ok(())
    }

    fn has_progress(&self) -> bool {
        self.progress.is_some()
    }
}
