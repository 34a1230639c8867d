//! Level bands, layouts and the level generator seam

use std::ops::RangeInclusive;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{CollectibleKind, Family};
use super::geometry::Aabb;
use super::state::GameSession;
use crate::consts::{GROUND_Y, LAST_LEVEL, VIEWPORT_WIDTH};

/// Level range in which a family appears
pub fn band_for(family: Family) -> RangeInclusive<u32> {
    match family {
        Family::Bird => 1..=16,
        Family::Turtle => 1..=10,
        Family::Spider => 11..=20,
        Family::Bat => 17..=30,
        Family::Robot => 21..=30,
        Family::Airplane => 31..=40,
        Family::FlyingDisk => 41..=49,
        Family::Alien => 41..=49,
        Family::BossAlien => LAST_LEVEL..=LAST_LEVEL,
        Family::Fire => 8..=20,
        Family::Raindrop => 12..=24,
        Family::LavaDrop => 25..=35,
        Family::Meteor => 33..=45,
        Family::ShootingStar => 38..=LAST_LEVEL,
        Family::PowerUp => 1..=LAST_LEVEL,
    }
}

/// Scheduled families active on `level`
pub fn families_for_level(level: u32) -> impl Iterator<Item = Family> {
    Family::SCHEDULED
        .into_iter()
        .filter(move |family| band_for(*family).contains(&level))
}

/// A one-way ledge the player can land on from above
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x: f32,
    /// Top surface
    pub y: f32,
    pub width: f32,
}

impl Platform {
    pub const THICKNESS: f32 = 16.0;

    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec2::new(self.x, self.y), Vec2::new(self.width, Self::THICKNESS))
    }

    /// Horizontal overlap with a span
    pub fn spans(&self, left: f32, right: f32) -> bool {
        left < self.x + self.width && right > self.x
    }
}

/// Kind of level exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalKind {
    /// End-of-level flag
    Flag,
    /// Beam under the boss, open once the boss is captured
    AbductionZone,
}

/// Level exit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub kind: GoalKind,
    pub bounds: Aabb,
    pub reached: bool,
}

impl Goal {
    pub fn flag(x: f32) -> Self {
        Self {
            kind: GoalKind::Flag,
            bounds: Aabb::new(Vec2::new(x, GROUND_Y - 96.0), Vec2::new(16.0, 96.0)),
            reached: false,
        }
    }

    pub fn abduction_zone(x: f32) -> Self {
        Self {
            kind: GoalKind::AbductionZone,
            bounds: Aabb::new(Vec2::new(x, GROUND_Y - 180.0), Vec2::new(120.0, 180.0)),
            reached: false,
        }
    }

    /// Whether touching the goal ends the level
    pub fn is_open(&self, boss_captured: bool) -> bool {
        match self.kind {
            GoalKind::Flag => true,
            GoalKind::AbductionZone => boss_captured,
        }
    }
}

/// Something the level places at a fixed spot, released into the active
/// collections once the camera gets close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    Enemy { family: Family, pos: Vec2 },
    Collectible { kind: CollectibleKind, pos: Vec2 },
}

impl Placement {
    pub fn x(&self) -> f32 {
        match self {
            Placement::Enemy { pos, .. } | Placement::Collectible { pos, .. } => pos.x,
        }
    }
}

/// Static description of the current level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelLayout {
    pub level: u32,
    /// Rightmost x the camera and player may reach
    pub length: f32,
    pub platforms: Vec<Platform>,
    pub goal: Goal,
    /// Not yet released, sorted by x
    pub placements: Vec<Placement>,
}

impl LevelLayout {
    /// Flat level with a flag at the far end
    pub fn flat(level: u32, length: f32) -> Self {
        let length = length.max(VIEWPORT_WIDTH);
        Self {
            level,
            length,
            platforms: Vec::new(),
            goal: Goal::flag(length - 120.0),
            placements: Vec::new(),
        }
    }

    /// Queue a placement, keeping the list ordered by x
    pub fn place(&mut self, placement: Placement) {
        let at = self
            .placements
            .partition_point(|p| p.x() <= placement.x());
        self.placements.insert(at, placement);
    }

    /// Remove and return every placement with x at or before `edge`
    pub fn take_placements_until(&mut self, edge: f32) -> Vec<Placement> {
        let count = self.placements.partition_point(|p| p.x() <= edge);
        self.placements.drain(..count).collect()
    }
}

impl Default for LevelLayout {
    fn default() -> Self {
        Self::flat(1, VIEWPORT_WIDTH * 2.0)
    }
}

/// Level generator collaborator: builds the layout and the initial entities
/// of a level. Called once per level start or restart.
pub trait LevelGenerator {
    fn init_level(&mut self, session: &mut GameSession, level: u32);
}

/// Deterministic generator seeded per level
#[derive(Debug, Clone)]
pub struct StandardLevelGenerator {
    seed: u64,
}

impl StandardLevelGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, level: u32) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ (level as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// Length of a level in pixels
pub fn level_length(level: u32) -> f32 {
    3_200.0 + level as f32 * 60.0
}

impl LevelGenerator for StandardLevelGenerator {
    fn init_level(&mut self, session: &mut GameSession, level: u32) {
        let mut rng = self.rng_for(level);
        let length = level_length(level);
        let mut layout = LevelLayout::flat(level, length);

        // Ledges between the start area and the goal
        let mut x = 520.0;
        while x < length - 480.0 {
            let width = rng.random_range(96.0..200.0);
            let height = rng.random_range(90.0..190.0);
            layout.platforms.push(Platform {
                x,
                y: GROUND_Y - height,
                width,
            });
            x += width + rng.random_range(180.0..340.0);
        }

        if level >= LAST_LEVEL {
            let zone_x = length - 300.0;
            layout.goal = Goal::abduction_zone(zone_x);
            layout.place(Placement::Enemy {
                family: Family::BossAlien,
                pos: Vec2::new(zone_x, GROUND_Y - 270.0),
            });
        }

        // One extra life per level, only until it has been collected once
        if !session.extra_life_claimed(level) && !layout.platforms.is_empty() {
            let idx = layout.platforms.len() / 2;
            let ledge = layout.platforms[idx];
            layout.place(Placement::Collectible {
                kind: CollectibleKind::ExtraLife,
                pos: Vec2::new(ledge.x + ledge.width * 0.5 - 12.0, ledge.y - 40.0),
            });
        }

        // A greeting party from the level's first enemy family
        if let Some(family) = families_for_level(level).find(|f| f.is_enemy()) {
            let size = family.size();
            let y = match family {
                Family::Turtle | Family::Robot => GROUND_Y - size.y,
                _ => GROUND_Y - 200.0,
            };
            layout.place(Placement::Enemy {
                family,
                pos: Vec2::new(VIEWPORT_WIDTH + 200.0, y),
            });
        }

        log::debug!(
            "Generated level {}: length {:.0}, {} platforms, goal {:?}",
            level,
            length,
            layout.platforms.len(),
            layout.goal.kind
        );
        session.layout = layout;
    }
}
