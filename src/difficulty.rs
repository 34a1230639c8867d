//! Difficulty policy
//!
//! Pure balance tables: every function maps (level, difficulty) to a number
//! and never touches session state.

use serde::{Deserialize, Serialize};

use crate::sim::entity::Family;
use crate::sim::level::band_for;

/// Player-selected difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "normal" | "n" | "medium" => Some(Difficulty::Normal),
            "hard" | "h" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Next entry in the selection list (wraps)
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Normal,
            Difficulty::Normal => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    /// Previous entry in the selection list (wraps)
    pub fn prev(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Normal => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Normal,
        }
    }
}

/// Lower bound on any spawn interval (frames)
pub const MIN_SPAWN_INTERVAL: u32 = 20;

/// Lives at the start of a new game
pub fn initial_lives(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 5,
        Difficulty::Normal => 3,
        Difficulty::Hard => 2,
    }
}

/// Upper bound on the life counter
pub fn max_lives(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 9,
        Difficulty::Normal => 7,
        Difficulty::Hard => 5,
    }
}

/// Extra-life thresholds and the step used once the list is exhausted
pub fn extra_life_milestones(difficulty: Difficulty) -> (&'static [u64], u64) {
    match difficulty {
        Difficulty::Easy => (&[500, 2_000, 5_000], 5_000),
        Difficulty::Normal => (&[1_000, 5_000, 10_000], 10_000),
        Difficulty::Hard => (&[2_000, 10_000, 25_000], 25_000),
    }
}

/// Score multiplier applied to every award
pub fn score_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 0.4,
        Difficulty::Normal => 1.0,
        Difficulty::Hard => 3.0,
    }
}

/// Base points for reaching the goal of `level`
pub fn level_complete_bonus(level: u32) -> u32 {
    500 + level * 20
}

/// How many instances a spawn cycle creates and how often it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTuning {
    pub count: u32,
    pub interval: u32,
}

/// Normal-difficulty (count, interval) at the first level of a family's band
fn base_spawn(family: Family) -> Option<(u32, u32)> {
    let base = match family {
        Family::Bird => (1, 120),
        Family::Bat => (2, 150),
        Family::Turtle => (1, 200),
        Family::Spider => (1, 180),
        Family::Robot => (1, 240),
        Family::Airplane => (1, 210),
        Family::FlyingDisk => (2, 160),
        Family::Alien => (1, 260),
        Family::Fire => (1, 300),
        Family::Raindrop => (3, 40),
        Family::LavaDrop => (2, 70),
        Family::Meteor => (1, 110),
        Family::ShootingStar => (1, 140),
        Family::PowerUp => (1, 900),
        Family::BossAlien => return None,
    };
    Some(base)
}

/// Spawn count/interval for a scheduled family.
///
/// Easy spawns fewer and less often, Hard spawns more and more often. Inside
/// a band the interval shrinks by two frames per level (at most 30%), and it
/// never drops below [`MIN_SPAWN_INTERVAL`]. Returns `None` for families that
/// are never scheduled (the boss).
pub fn spawn_tuning(family: Family, level: u32, difficulty: Difficulty) -> Option<SpawnTuning> {
    let (base_count, base_interval) = base_spawn(family)?;

    // Power-ups are a reward, not a threat: only the level ramp applies
    let (count, interval) = if family == Family::PowerUp {
        (base_count, base_interval)
    } else {
        match difficulty {
            Difficulty::Easy => (base_count.saturating_sub(1).max(1), base_interval * 3 / 2),
            Difficulty::Normal => (base_count, base_interval),
            Difficulty::Hard => (base_count + 1, base_interval * 3 / 5),
        }
    };

    let depth = level.saturating_sub(*band_for(family).start());
    let ramp = (depth * 2).min(interval * 3 / 10);
    let interval = (interval - ramp).max(MIN_SPAWN_INTERVAL);

    Some(SpawnTuning { count, interval })
}
