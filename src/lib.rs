//! Sky Dash - side-scrolling arcade platformer core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, spawning, combat, holds, session)
//! - `game`: Top-level screen state machine
//! - `audio`, `render`, `rankings`, `persistence`: collaborator contracts and
//!   headless implementations
//! - `config`, `settings`: startup configuration and user preferences
//! - `difficulty`: Pure balance tables

pub mod audio;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod game;
pub mod persistence;
pub mod rankings;
pub mod render;
pub mod settings;
pub mod sim;

pub use config::GameConfig;
pub use difficulty::Difficulty;
pub use error::{ConfigError, MediaError, StorageError};
pub use game::{Game, Screen, Services};
pub use rankings::Rankings;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep (seconds)
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Visible window
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;
    /// Entities further than this outside the camera window are culled
    pub const CULL_MARGIN: f32 = 240.0;
    /// Distance past the trailing edge where new entities appear
    pub const SPAWN_OFFSET: f32 = 40.0;
    /// Top of the ground strip
    pub const GROUND_Y: f32 = 520.0;
    /// Camera keeps the player this far from its left edge
    pub const CAMERA_LEAD: f32 = 260.0;

    /// Campaign length
    pub const FIRST_LEVEL: u32 = 1;
    pub const LAST_LEVEL: u32 = 50;
}

/// Frames needed to cover `seconds` at the fixed tick rate (rounded up)
#[inline]
pub fn frames_for_seconds(seconds: f32) -> u32 {
    if seconds <= 0.0 {
        return 0;
    }
    (seconds * consts::TICK_RATE as f32 - 1e-4).ceil() as u32
}
