//! Startup configuration
//!
//! Built once in `main` from defaults, an optional JSON file and
//! `SKY_DASH_*` environment overrides, then passed by reference to the
//! session and the state machine.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::consts::{FIRST_LEVEL, LAST_LEVEL};
use crate::difficulty::Difficulty;
use crate::error::ConfigError;

pub const ENV_START_LEVEL: &str = "SKY_DASH_START_LEVEL";
pub const ENV_DIFFICULTY: &str = "SKY_DASH_DIFFICULTY";
pub const ENV_SEED: &str = "SKY_DASH_SEED";
pub const ENV_DATA_DIR: &str = "SKY_DASH_DATA_DIR";
pub const ENV_SKIP_CINEMATICS: &str = "SKY_DASH_SKIP_CINEMATICS";

/// Startup configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Level a new game starts on
    pub start_level: u32,
    /// Difficulty preselected when no settings were saved
    pub difficulty: Difficulty,
    /// Seed for level layouts and spawns
    pub seed: u64,
    /// Where settings, autosave and rankings live
    pub data_dir: PathBuf,
    /// Never play the opening/ending videos
    pub skip_cinematics: bool,
    /// Frames the splash screen stays up
    pub splash_frames: u32,
    /// Frames the closing "fim" screen stays up
    pub fim_frames: u32,
    /// Frames the credits roll before returning to the menu
    pub credits_frames: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_level: FIRST_LEVEL,
            difficulty: Difficulty::Normal,
            seed: 0x5EED_DA5C,
            data_dir: PathBuf::from("sky-dash-data"),
            skip_cinematics: false,
            splash_frames: 180,
            fim_frames: 240,
            credits_frames: 600,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str::<Self>(json)?.validated())
    }

    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Defaults, then the optional file, then the process environment.
    /// A bad file is logged and skipped.
    pub fn from_env(file: Option<&Path>) -> Self {
        let base = match file {
            Some(path) => Self::load(path).unwrap_or_else(|err| {
                log::warn!("Config ignored: {}", err);
                Self::default()
            }),
            None => Self::default(),
        };
        base.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `SKY_DASH_*` overrides from `lookup`. Unparseable values are
    /// logged; an unusable start level falls back to level 1.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_START_LEVEL) {
            self.start_level = match raw.trim().parse::<u32>() {
                Ok(level) => level,
                Err(_) => {
                    log::warn!("{}={:?} is not a level number", ENV_START_LEVEL, raw);
                    FIRST_LEVEL
                }
            };
        }
        if let Some(raw) = lookup(ENV_DIFFICULTY) {
            match Difficulty::from_str(&raw) {
                Some(difficulty) => self.difficulty = difficulty,
                None => log::warn!("{}={:?} is not a difficulty, keeping {}", ENV_DIFFICULTY, raw, self.difficulty.as_str()),
            }
        }
        if let Some(raw) = lookup(ENV_SEED) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => self.seed = seed,
                Err(_) => log::warn!("{}={:?} is not a seed", ENV_SEED, raw),
            }
        }
        if let Some(raw) = lookup(ENV_DATA_DIR) {
            if !raw.trim().is_empty() {
                self.data_dir = PathBuf::from(raw);
            }
        }
        if let Some(raw) = lookup(ENV_SKIP_CINEMATICS) {
            self.skip_cinematics = matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        self.validated()
    }

    /// Clamp out-of-range values to safe defaults
    pub fn validated(mut self) -> Self {
        if !(FIRST_LEVEL..=LAST_LEVEL).contains(&self.start_level) {
            log::warn!(
                "Start level {} out of range {}..={}, using {}",
                self.start_level,
                FIRST_LEVEL,
                LAST_LEVEL,
                FIRST_LEVEL
            );
            self.start_level = FIRST_LEVEL;
        }
        self.splash_frames = self.splash_frames.max(1);
        self.fim_frames = self.fim_frames.max(1);
        self.credits_frames = self.credits_frames.max(1);
        self
    }
}
