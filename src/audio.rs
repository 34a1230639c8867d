//! Audio collaborator
//!
//! The core only fires effects, switches music tracks, ducks the music and
//! polls cinematic clips. Playback itself lives behind [`AudioService`];
//! [`HeadlessAudio`] is the silent implementation used by the native binary
//! and the tests.

use std::collections::HashSet;

use crate::error::MediaError;
use crate::settings::Settings;

/// Sound effect cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Player jumps
    Jump,
    /// Player fires
    Shoot,
    /// Shot hits an enemy that survives
    EnemyHit,
    /// Enemy destroyed
    EnemyDestroyed,
    /// Meteor/missile shot down
    HazardDestroyed,
    /// Player loses a life
    PlayerHurt,
    /// Shield absorbs a hit
    ShieldBreak,
    /// Dodge bonus
    Dodge,
    /// Power-up collected
    PowerUp,
    /// Extra life (pickup or milestone)
    ExtraLife,
    /// Goal reached
    LevelComplete,
    /// Last life lost
    GameOver,
    /// Boss shot down on the last level
    BossCaptured,
    /// Menu cursor moved
    MenuMove,
    /// Menu confirm
    MenuConfirm,
    /// Pause toggled
    Pause,
}

impl SoundEffect {
    /// Asset name
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Jump => "jump",
            SoundEffect::Shoot => "shoot",
            SoundEffect::EnemyHit => "enemy_hit",
            SoundEffect::EnemyDestroyed => "enemy_destroyed",
            SoundEffect::HazardDestroyed => "hazard_destroyed",
            SoundEffect::PlayerHurt => "player_hurt",
            SoundEffect::ShieldBreak => "shield_break",
            SoundEffect::Dodge => "dodge",
            SoundEffect::PowerUp => "power_up",
            SoundEffect::ExtraLife => "extra_life",
            SoundEffect::LevelComplete => "level_complete",
            SoundEffect::GameOver => "game_over",
            SoundEffect::BossCaptured => "boss_captured",
            SoundEffect::MenuMove => "menu_move",
            SoundEffect::MenuConfirm => "menu_confirm",
            SoundEffect::Pause => "pause",
        }
    }

    /// Length of the shipped clip in seconds
    pub fn nominal_duration(&self) -> f32 {
        match self {
            SoundEffect::Jump | SoundEffect::Shoot | SoundEffect::MenuMove => 0.15,
            SoundEffect::EnemyHit | SoundEffect::Dodge | SoundEffect::MenuConfirm => 0.25,
            SoundEffect::Pause => 0.3,
            SoundEffect::EnemyDestroyed | SoundEffect::HazardDestroyed => 0.4,
            SoundEffect::PlayerHurt | SoundEffect::ShieldBreak => 0.5,
            SoundEffect::PowerUp => 0.6,
            SoundEffect::ExtraLife => 1.1,
            SoundEffect::LevelComplete => 2.5,
            SoundEffect::GameOver => 3.2,
            SoundEffect::BossCaptured => 4.0,
        }
    }
}

/// Full-screen video clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cinematic {
    Opening,
    Ending,
}

impl Cinematic {
    pub fn name(&self) -> &'static str {
        match self {
            Cinematic::Opening => "opening",
            Cinematic::Ending => "ending",
        }
    }
}

/// Audio/video collaborator contract. All calls are fire-and-forget; the
/// core only polls [`AudioService::is_clip_finished`].
pub trait AudioService {
    fn play_effect(&mut self, effect: SoundEffect);
    /// Clip length in seconds, `None` when the asset is missing
    fn effect_duration(&self, effect: SoundEffect) -> Option<f32>;
    fn play_level_track(&mut self, level: u32);
    fn play_menu_track(&mut self);
    fn stop_music(&mut self);
    fn music_volume(&self) -> f32;
    fn set_music_volume(&mut self, volume: f32);
    /// Take volumes from user settings
    fn apply_settings(&mut self, settings: &Settings) {
        self.set_music_volume(settings.music_volume);
    }
    fn play_clip(&mut self, clip: Cinematic) -> Result<(), MediaError>;
    /// Poll the running clip (true when done or when nothing is playing)
    fn is_clip_finished(&mut self) -> bool;
    fn stop_clip(&mut self);
}

/// What the headless mixer is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Menu,
    Level(u32),
}

/// Silent audio backend that keeps the bookkeeping a real mixer would
#[derive(Debug, Clone)]
pub struct HeadlessAudio {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    /// Assets reported missing (for degraded-path testing)
    missing: HashSet<SoundEffect>,
    /// Clips that fail to load
    broken_clips: HashSet<Cinematic>,
    /// Polls a clip takes before it reports finished
    clip_length_polls: u32,
    clip_polls_left: Option<u32>,
    /// Every effect fired, in order
    pub played: Vec<SoundEffect>,
    /// Current music track
    pub track: Option<Track>,
}

impl Default for HeadlessAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAudio {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
            missing: HashSet::new(),
            broken_clips: HashSet::new(),
            clip_length_polls: 0,
            clip_polls_left: None,
            played: Vec::new(),
            track: None,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Pretend an asset is absent
    pub fn mark_missing(&mut self, effect: SoundEffect) {
        self.missing.insert(effect);
    }

    /// Pretend a clip fails to load
    pub fn mark_broken_clip(&mut self, clip: Cinematic) {
        self.broken_clips.insert(clip);
    }

    /// Make clips run for `polls` calls to `is_clip_finished`
    pub fn set_clip_length(&mut self, polls: u32) {
        self.clip_length_polls = polls;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// How many times `effect` was fired
    pub fn count(&self, effect: SoundEffect) -> usize {
        self.played.iter().filter(|&&e| e == effect).count()
    }
}

impl AudioService for HeadlessAudio {
    fn play_effect(&mut self, effect: SoundEffect) {
        if self.missing.contains(&effect) {
            log::warn!("Missing sound asset '{}', skipping", effect.name());
            return;
        }
        if self.effective_volume() <= 0.0 {
            return;
        }
        log::trace!("sfx {}", effect.name());
        self.played.push(effect);
    }

    fn effect_duration(&self, effect: SoundEffect) -> Option<f32> {
        if self.missing.contains(&effect) {
            None
        } else {
            Some(effect.nominal_duration())
        }
    }

    fn play_level_track(&mut self, level: u32) {
        log::debug!("Music: level {} track", level);
        self.track = Some(Track::Level(level));
    }

    fn play_menu_track(&mut self) {
        if self.track != Some(Track::Menu) {
            log::debug!("Music: menu track");
            self.track = Some(Track::Menu);
        }
    }

    fn stop_music(&mut self) {
        self.track = None;
    }

    fn music_volume(&self) -> f32 {
        self.music_volume
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
    }

    fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_music_volume(settings.music_volume);
    }

    fn play_clip(&mut self, clip: Cinematic) -> Result<(), MediaError> {
        if self.broken_clips.contains(&clip) {
            return Err(MediaError::MissingAsset(format!("{}.mp4", clip.name())));
        }
        log::debug!("Clip '{}' started", clip.name());
        self.clip_polls_left = Some(self.clip_length_polls);
        Ok(())
    }

    fn is_clip_finished(&mut self) -> bool {
        match self.clip_polls_left {
            None => true,
            Some(0) => {
                self.clip_polls_left = None;
                true
            }
            Some(left) => {
                self.clip_polls_left = Some(left - 1);
                false
            }
        }
    }

    fn stop_clip(&mut self) {
        self.clip_polls_left = None;
    }
}
