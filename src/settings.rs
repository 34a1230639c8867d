//! Game settings and preferences
//!
//! Persisted separately from progress through the
//! [`Persistence`](crate::persistence::Persistence) collaborator.

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Game ===
    /// Last difficulty chosen on the selection screen
    pub difficulty: Difficulty,
    /// Play the opening and ending videos
    pub play_cinematics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            difficulty: Difficulty::Normal,
            play_cinematics: true,
        }
    }
}

impl Settings {
    /// Pull every volume back into 0.0 - 1.0 (hand-edited files)
    pub fn clamped(mut self) -> Self {
        self.master_volume = clamp_volume(self.master_volume);
        self.sfx_volume = clamp_volume(self.sfx_volume);
        self.music_volume = clamp_volume(self.music_volume);
        self
    }
}

fn clamp_volume(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 }
}
