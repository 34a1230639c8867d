//! Transition holds
//!
//! A hold is a frame-counted pause that keeps a transition on screen until
//! its sound cue has played out. Music is ducked to half volume for the
//! length of the hold and restored once when it ends.

use serde::{Deserialize, Serialize};

use crate::audio::{AudioService, SoundEffect};
use crate::frames_for_seconds;

/// Frames used when a cue's length is unknown (missing asset)
pub const FALLBACK_HOLD_FRAMES: u32 = 120;

/// Why the game is holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldKind {
    LevelEnd,
    GameOver,
}

/// What runs when the hold expires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HoldAction {
    #[default]
    None,
    AdvanceLevel,
}

/// Emitted by [`HoldState::tick`] on the frame a hold completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldFinished {
    pub kind: HoldKind,
    pub action: HoldAction,
}

/// Transition hold bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldState {
    kind: Option<HoldKind>,
    remaining: u32,
    total: u32,
    action: HoldAction,
    /// Music volume before ducking; `Some` while ducked
    pre_duck_volume: Option<f32>,
}

impl HoldState {
    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }

    pub fn kind(&self) -> Option<HoldKind> {
        self.kind
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn action(&self) -> HoldAction {
        self.action
    }

    /// True while a level-end hold freezes gameplay
    pub fn freezes_gameplay(&self) -> bool {
        self.kind == Some(HoldKind::LevelEnd)
    }

    /// Fade progress (elapsed / total) for overlay rendering
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.remaining) as f32 / self.total as f32
    }

    /// Start a hold of `frames` frames. A hold already running is never
    /// replaced: the call is ignored and returns false.
    pub fn start(
        &mut self,
        kind: HoldKind,
        frames: u32,
        action: HoldAction,
        audio: &mut dyn AudioService,
    ) -> bool {
        if let Some(current) = self.kind {
            log::debug!("Hold {:?} requested while {:?} is running, ignored", kind, current);
            return false;
        }
        let frames = frames.max(1);
        self.kind = Some(kind);
        self.remaining = frames;
        self.total = frames;
        self.action = action;
        self.duck(audio);
        log::info!("Hold {:?} started for {} frames ({:?})", kind, frames, action);
        true
    }

    /// Count down one frame; returns the finished hold on the frame it ends
    pub fn tick(&mut self, audio: &mut dyn AudioService) -> Option<HoldFinished> {
        let kind = self.kind?;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return None;
        }
        let finished = HoldFinished {
            kind,
            action: self.action,
        };
        self.kind = None;
        self.action = HoldAction::None;
        self.restore(audio);
        log::info!("Hold {:?} finished", kind);
        Some(finished)
    }

    /// Drop any hold without running its action (session reset)
    pub fn cancel(&mut self, audio: &mut dyn AudioService) {
        self.kind = None;
        self.remaining = 0;
        self.total = 0;
        self.action = HoldAction::None;
        self.restore(audio);
    }

    fn duck(&mut self, audio: &mut dyn AudioService) {
        if self.pre_duck_volume.is_some() {
            return;
        }
        let volume = audio.music_volume();
        self.pre_duck_volume = Some(volume);
        audio.set_music_volume(volume * 0.5);
    }

    fn restore(&mut self, audio: &mut dyn AudioService) {
        if let Some(volume) = self.pre_duck_volume.take() {
            audio.set_music_volume(volume);
        }
    }
}

/// Hold length matching a sound cue, rounded up to whole frames
pub fn frames_for_cue(audio: &dyn AudioService, effect: SoundEffect) -> u32 {
    match audio.effect_duration(effect) {
        Some(seconds) => frames_for_seconds(seconds).max(1),
        None => {
            log::warn!(
                "No duration for '{}', holding {} frames",
                effect.name(),
                FALLBACK_HOLD_FRAMES
            );
            FALLBACK_HOLD_FRAMES
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::HeadlessAudio;

    #[test]
    fn test_hold_lifecycle() {
        let mut audio = HeadlessAudio::new();
        let mut hold = HoldState::default();
        assert!(hold.start(HoldKind::LevelEnd, 30, HoldAction::AdvanceLevel, &mut audio));

        for _ in 0..29 {
            assert!(hold.tick(&mut audio).is_none());
            assert!(hold.is_active());
        }
        let done = hold.tick(&mut audio).expect("30th tick finishes");
        assert_eq!(done.kind, HoldKind::LevelEnd);
        assert_eq!(done.action, HoldAction::AdvanceLevel);
        assert!(!hold.is_active());
        assert!(hold.tick(&mut audio).is_none());
    }

    #[test]
    fn test_second_hold_does_not_overwrite() {
        let mut audio = HeadlessAudio::new();
        let mut hold = HoldState::default();
        hold.start(HoldKind::LevelEnd, 10, HoldAction::AdvanceLevel, &mut audio);
        assert!(!hold.start(HoldKind::GameOver, 50, HoldAction::None, &mut audio));
        assert_eq!(hold.kind(), Some(HoldKind::LevelEnd));
        assert_eq!(hold.action(), HoldAction::AdvanceLevel);
        assert_eq!(hold.total(), 10);
    }

    #[test]
    fn test_ducking_restores_once() {
        let mut audio = HeadlessAudio::new();
        audio.set_music_volume(0.8);
        let mut hold = HoldState::default();
        hold.start(HoldKind::GameOver, 3, HoldAction::None, &mut audio);
        assert!((audio.music_volume() - 0.4).abs() < 1e-6);

        // Rejected start must not duck a second time
        hold.start(HoldKind::GameOver, 3, HoldAction::None, &mut audio);
        assert!((audio.music_volume() - 0.4).abs() < 1e-6);

        for _ in 0..3 {
            hold.tick(&mut audio);
        }
        assert!((audio.music_volume() - 0.8).abs() < 1e-6);

        // Later ticks leave the volume alone
        audio.set_music_volume(0.3);
        hold.tick(&mut audio);
        assert!((audio.music_volume() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_progress_ratio() {
        let mut audio = HeadlessAudio::new();
        let mut hold = HoldState::default();
        hold.start(HoldKind::LevelEnd, 4, HoldAction::None, &mut audio);
        assert_eq!(hold.progress(), 0.0);
        hold.tick(&mut audio);
        assert_eq!(hold.progress(), 0.25);
        hold.tick(&mut audio);
        assert_eq!(hold.progress(), 0.5);
    }

    #[test]
    fn test_frames_for_cue() {
        let mut audio = HeadlessAudio::new();
        assert_eq!(frames_for_cue(&audio, SoundEffect::LevelComplete), 150);
        assert_eq!(frames_for_cue(&audio, SoundEffect::GameOver), 192);
        audio.mark_missing(SoundEffect::GameOver);
        assert_eq!(frames_for_cue(&audio, SoundEffect::GameOver), FALLBACK_HOLD_FRAMES);
    }
}
