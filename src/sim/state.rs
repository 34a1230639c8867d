//! Game session: the root aggregate of the simulation
//!
//! One session lives for the whole process. It owns the level, the
//! progression, every active entity collection and the current screen.
//! Everything a Continue needs is captured by [`GameSession::snapshot`].

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{
    Collectible, CollectibleKind, Enemy, EntityId, Explosion, Family, Hazard, HazardKind,
    Projectile, SpawnsProjectiles, EXPLOSION_FRAMES,
};
use super::geometry::in_camera_window;
use super::hold::HoldState;
use super::level::{LevelGenerator, LevelLayout, Placement};
use super::player::Player;
use super::pool::Pool;
use super::progression::Progression;
use super::spawn::SpawnScheduler;
use crate::audio::AudioService;
use crate::config::GameConfig;
use crate::consts::*;
use crate::difficulty::Difficulty;
use crate::game::Screen;
use crate::persistence::ProgressSnapshot;

/// Most player shots alive at once (the player also enforces a lower cap)
pub const SHOT_POOL_SIZE: usize = 8;
/// Most explosions on screen at once
pub const EXPLOSION_POOL_SIZE: usize = 32;
/// Slow-time power-up scale applied to enemy and hazard motion
pub const SLOW_TIME_SCALE: f32 = 0.5;

/// How a run of gameplay ended, read once by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayOutcome {
    /// Last life lost
    GameOver { qualifies: bool },
    /// Level-end hold of the last level completed
    CampaignComplete { qualifies: bool },
}

impl PlayOutcome {
    pub fn qualifies(&self) -> bool {
        match self {
            PlayOutcome::GameOver { qualifies } | PlayOutcome::CampaignComplete { qualifies } => {
                *qualifies
            }
        }
    }
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Current top-level screen
    pub screen: Screen,
    /// Current level (1-based)
    pub level: u32,
    pub difficulty: Difficulty,
    pub progression: Progression,
    pub hold: HoldState,
    pub player: Player,
    /// Left edge of the view in level coordinates
    pub camera_x: f32,
    pub layout: LevelLayout,
    pub enemies: Vec<Enemy>,
    pub hazards: Vec<Hazard>,
    pub collectibles: Vec<Collectible>,
    /// Player shots
    pub shots: Pool<Projectile>,
    /// Hostile projectiles whose parent is gone
    pub orphans: Vec<Projectile>,
    pub explosions: Pool<Explosion>,
    pub spawner: SpawnScheduler,
    /// Levels whose one-time extra life has been collected
    pub extra_life_levels: BTreeSet<u32>,
    /// Ticks spent in the current level
    pub level_ticks: u64,
    /// Gameplay ticks since the session started
    pub time_ticks: u64,
    /// Boss shot down on the last level
    pub boss_captured: bool,
    /// Pending result for the state machine
    pub outcome: Option<PlayOutcome>,
    #[serde(skip, default = "default_rng")]
    rng: Pcg32,
    next_id: EntityId,
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

impl GameSession {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            seed: config.seed,
            screen: Screen::Splash,
            level: config.start_level,
            difficulty: config.difficulty,
            progression: Progression::new(config.difficulty),
            hold: HoldState::default(),
            player: Player::default(),
            camera_x: 0.0,
            layout: LevelLayout::default(),
            enemies: Vec::new(),
            hazards: Vec::new(),
            collectibles: Vec::new(),
            shots: Pool::with_capacity(SHOT_POOL_SIZE),
            orphans: Vec::new(),
            explosions: Pool::with_capacity(EXPLOSION_POOL_SIZE),
            spawner: SpawnScheduler::default(),
            extra_life_levels: BTreeSet::new(),
            level_ticks: 0,
            time_ticks: 0,
            boss_captured: false,
            outcome: None,
            rng: Pcg32::seed_from_u64(config.seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Session RNG (spawn heights, power-up kinds)
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Motion scale for enemies and hazards this tick
    pub fn time_scale(&self) -> f32 {
        if self.player.powers.slow_time() {
            SLOW_TIME_SCALE
        } else {
            1.0
        }
    }

    /// Fresh run at `level` with new progression
    pub fn start_new_game(
        &mut self,
        difficulty: Difficulty,
        level: u32,
        levels: &mut dyn LevelGenerator,
        audio: &mut dyn AudioService,
    ) {
        log::info!("New game: {} from level {}", difficulty.as_str(), level);
        self.difficulty = difficulty;
        self.progression = Progression::new(difficulty);
        self.extra_life_levels.clear();
        self.player = Player::default();
        self.outcome = None;
        self.time_ticks = 0;
        self.hold.cancel(audio);
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.begin_level(level, levels, audio);
    }

    /// Reset per-level state and let the generator build `level`
    pub fn begin_level(
        &mut self,
        level: u32,
        levels: &mut dyn LevelGenerator,
        audio: &mut dyn AudioService,
    ) {
        let level = level.clamp(FIRST_LEVEL, LAST_LEVEL);
        self.clear_level();
        self.level = level;
        self.spawner = SpawnScheduler::for_level(level, self.difficulty);
        self.player.reset();
        self.camera_x = 0.0;
        self.boss_captured = false;
        self.level_ticks = 0;
        levels.init_level(self, level);
        audio.play_level_track(level);
        log::info!(
            "Level {} started ({} spawn timers, {} placements)",
            level,
            self.spawner.timers().len(),
            self.layout.placements.len()
        );
    }

    /// Drop every per-level entity; the hold and progression are kept
    pub fn clear_level(&mut self) {
        self.enemies.clear();
        self.hazards.clear();
        self.collectibles.clear();
        self.shots.clear();
        self.orphans.clear();
        self.explosions.clear();
        self.spawner.reset();
        self.layout = LevelLayout::default();
        self.camera_x = 0.0;
    }

    pub fn spawn_enemy(&mut self, family: Family, pos: Vec2) -> Option<EntityId> {
        let id = self.next_entity_id();
        let enemy = Enemy::spawn(id, family, pos)?;
        self.enemies.push(enemy);
        Some(id)
    }

    pub fn spawn_hazard(&mut self, family: Family, pos: Vec2) -> Option<EntityId> {
        let kind = HazardKind::from_family(family)?;
        let id = self.next_entity_id();
        self.hazards.push(Hazard::new(id, kind, pos));
        Some(id)
    }

    pub fn spawn_collectible(&mut self, kind: CollectibleKind, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.collectibles.push(Collectible::new(id, kind, pos));
        id
    }

    /// Live instances of `family` inside the camera window
    pub fn family_count(&self, family: Family) -> usize {
        let camera_x = self.camera_x;
        if family == Family::PowerUp {
            return self
                .collectibles
                .iter()
                .filter(|c| c.alive && in_camera_window(c.pos.x, camera_x))
                .count();
        }
        if family.is_enemy() {
            return self
                .enemies
                .iter()
                .filter(|e| {
                    e.family() == family && e.is_alive() && in_camera_window(e.pos.x, camera_x)
                })
                .count();
        }
        self.hazards
            .iter()
            .filter(|h| h.alive && h.kind.family() == family && in_camera_window(h.pos.x, camera_x))
            .count()
    }

    /// Whether the one-time extra life of `level` was already collected
    pub fn extra_life_claimed(&self, level: u32) -> bool {
        self.extra_life_levels.contains(&level)
    }

    /// Move level placements within reach of the camera into the active
    /// collections
    pub fn release_placements(&mut self) {
        let edge = self.camera_x + VIEWPORT_WIDTH + SPAWN_OFFSET;
        for placement in self.layout.take_placements_until(edge) {
            match placement {
                Placement::Enemy { family, pos } => {
                    self.spawn_enemy(family, pos);
                }
                Placement::Collectible { kind, pos } => {
                    self.spawn_collectible(kind, pos);
                }
            }
        }
    }

    /// Cosmetic explosion centered on `pos`
    pub fn explode(&mut self, pos: Vec2, scale: f32) {
        if self
            .explosions
            .acquire(|e| {
                e.pos = pos;
                e.frames_left = EXPLOSION_FRAMES;
                e.scale = scale;
            })
            .is_none()
        {
            log::trace!("Explosion pool full, skipping effect");
        }
    }

    /// Cull pass: drop dead entities and anything outside the camera window.
    /// Projectiles of removed enemies move to the orphan list.
    pub fn compact(&mut self) {
        let camera_x = self.camera_x;

        let orphans = &mut self.orphans;
        self.enemies.retain_mut(|enemy| {
            let keep = !enemy.is_finished() && in_camera_window(enemy.pos.x, camera_x);
            if !keep {
                orphans.extend(enemy.release_projectiles());
            }
            keep
        });

        self.hazards
            .retain(|h| h.alive && in_camera_window(h.pos.x, camera_x));
        self.collectibles
            .retain(|c| c.alive && in_camera_window(c.pos.x, camera_x));
        self.orphans
            .retain(|p| p.alive && in_camera_window(p.pos.x, camera_x));

        for shot in self.shots.iter_mut() {
            if !in_camera_window(shot.pos.x, camera_x) {
                shot.alive = false;
            }
        }
        self.shots.reclaim();
        self.explosions.reclaim();
    }

    /// Hand the pending outcome to the state machine
    pub fn take_outcome(&mut self) -> Option<PlayOutcome> {
        self.outcome.take()
    }

    /// Continue data for the current run
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            level: self.level,
            score: self.progression.score,
            lives: self.progression.lives,
            difficulty: self.difficulty,
            next_milestone: self.progression.next_milestone,
            milestone_index: self.progression.milestone_index,
            extra_lives_granted: self.progression.extra_lives_granted,
            extra_life_levels: self.extra_life_levels.iter().copied().collect(),
        }
    }

    /// Resume a saved run at the start of its level
    pub fn restore(
        &mut self,
        snapshot: &ProgressSnapshot,
        levels: &mut dyn LevelGenerator,
        audio: &mut dyn AudioService,
    ) {
        log::info!(
            "Continuing at level {} with {} points",
            snapshot.level,
            snapshot.score
        );
        self.difficulty = snapshot.difficulty;
        let mut progression = Progression::new(snapshot.difficulty);
        progression.score = snapshot.score;
        progression.lives = snapshot.lives.clamp(1, progression.max_lives);
        progression.next_milestone = snapshot.next_milestone;
        progression.milestone_index = snapshot.milestone_index;
        progression.extra_lives_granted = snapshot.extra_lives_granted;
        self.progression = progression;
        self.extra_life_levels = snapshot.extra_life_levels.iter().copied().collect();
        self.player = Player::default();
        self.outcome = None;
        self.hold.cancel(audio);
        self.rng = Pcg32::seed_from_u64(self.seed ^ snapshot.level as u64);
        self.begin_level(snapshot.level, levels, audio);
    }
}
