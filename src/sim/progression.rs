//! Scoring, lives and power-up timers
//!
//! Every award goes through [`Progression::add_score`], which applies the
//! difficulty multiplier and performs the single milestone check.

use serde::{Deserialize, Serialize};

use crate::difficulty::{self, Difficulty};
use crate::sim::entity::CollectibleKind;

/// Power-up durations (frames)
pub const INVULNERABILITY_FRAMES: u32 = 600;
pub const DOUBLE_JUMP_FRAMES: u32 = 900;
pub const SLOW_TIME_FRAMES: u32 = 480;
pub const RAPID_FIRE_FRAMES: u32 = 600;

/// Result of one [`Progression::add_score`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreAward {
    /// Points actually added
    pub points: u64,
    /// A milestone was crossed by this award
    pub milestone_crossed: bool,
    /// A life was granted (false when already at the cap)
    pub life_granted: bool,
}

/// Score, lives and extra-life bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
    pub score: u64,
    pub lives: u32,
    pub max_lives: u32,
    pub difficulty: Difficulty,
    /// Threshold that grants the next extra life (never decreases)
    pub next_milestone: u64,
    /// Index of `next_milestone` in the milestone list (== len once exhausted)
    pub milestone_index: usize,
    /// Extra lives granted by milestones so far
    pub extra_lives_granted: u32,
}

impl Progression {
    pub fn new(difficulty: Difficulty) -> Self {
        let (milestones, _) = difficulty::extra_life_milestones(difficulty);
        Self {
            score: 0,
            lives: difficulty::initial_lives(difficulty),
            max_lives: difficulty::max_lives(difficulty),
            difficulty,
            next_milestone: milestones.first().copied().unwrap_or(u64::MAX),
            milestone_index: 0,
            extra_lives_granted: 0,
        }
    }

    /// Points `base` is worth under the current difficulty
    pub fn scaled_points(&self, base: u32) -> u64 {
        if base == 0 {
            return 0;
        }
        let scaled = (base as f64 * difficulty::score_multiplier(self.difficulty)).round() as u64;
        scaled.max(1)
    }

    /// Add `base_points` scaled by the difficulty multiplier, then check the
    /// milestone once against the new total.
    pub fn add_score(&mut self, base_points: u32) -> ScoreAward {
        let points = self.scaled_points(base_points);
        if points == 0 {
            return ScoreAward::default();
        }
        self.score = self.score.saturating_add(points);

        let mut award = ScoreAward {
            points,
            ..Default::default()
        };
        if self.score >= self.next_milestone {
            award.milestone_crossed = true;
            award.life_granted = self.gain_life();
            if award.life_granted {
                self.extra_lives_granted += 1;
            }
            self.advance_milestone();
            log::info!(
                "Milestone reached at {} points, next at {}",
                self.score,
                self.next_milestone
            );
        }
        award
    }

    fn advance_milestone(&mut self) {
        let (milestones, step) = difficulty::extra_life_milestones(self.difficulty);
        self.milestone_index += 1;
        let next = match milestones.get(self.milestone_index) {
            Some(&threshold) => threshold,
            None => self.next_milestone.saturating_add(step),
        };
        self.next_milestone = next.max(self.next_milestone);
    }

    /// Add one life up to the cap; returns false when already full
    pub fn gain_life(&mut self) -> bool {
        if self.lives >= self.max_lives {
            return false;
        }
        self.lives += 1;
        true
    }

    /// Remove one life; returns true when none are left
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }
}

/// Frame-counted power-up state carried by the player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUps {
    pub invulnerable_frames: u32,
    pub double_jump_frames: u32,
    pub slow_time_frames: u32,
    pub rapid_fire_frames: u32,
    pub shield: bool,
}

impl PowerUps {
    pub fn invulnerable(&self) -> bool {
        self.invulnerable_frames > 0
    }

    pub fn double_jump(&self) -> bool {
        self.double_jump_frames > 0
    }

    pub fn slow_time(&self) -> bool {
        self.slow_time_frames > 0
    }

    pub fn rapid_fire(&self) -> bool {
        self.rapid_fire_frames > 0
    }

    /// Apply a timed power-up or the shield. Extra lives are handled by
    /// [`Progression`]; returns false for them.
    pub fn grant(&mut self, kind: CollectibleKind) -> bool {
        match kind {
            CollectibleKind::Invulnerability => self.invulnerable_frames = INVULNERABILITY_FRAMES,
            CollectibleKind::DoubleJump => self.double_jump_frames = DOUBLE_JUMP_FRAMES,
            CollectibleKind::SlowTime => self.slow_time_frames = SLOW_TIME_FRAMES,
            CollectibleKind::RapidFire => self.rapid_fire_frames = RAPID_FIRE_FRAMES,
            CollectibleKind::Shield => self.shield = true,
            CollectibleKind::ExtraLife => return false,
        }
        true
    }

    /// Use up the shield; returns true if one was active
    pub fn consume_shield(&mut self) -> bool {
        std::mem::replace(&mut self.shield, false)
    }

    /// Count every timer down by one frame
    pub fn tick(&mut self) {
        self.invulnerable_frames = self.invulnerable_frames.saturating_sub(1);
        self.double_jump_frames = self.double_jump_frames.saturating_sub(1);
        self.slow_time_frames = self.slow_time_frames.saturating_sub(1);
        self.rapid_fire_frames = self.rapid_fire_frames.saturating_sub(1);
    }
}
