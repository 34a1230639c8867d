//! Spawn scheduler
//!
//! One frame counter per family active in the level's bands. When a counter
//! reaches its interval the family spawns its batch just past the leading
//! edge of the camera window, unless that would push the family over its
//! on-screen cap; either way the counter starts over.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{CollectibleKind, Family};
use super::level::families_for_level;
use super::state::GameSession;
use crate::consts::{GROUND_Y, SPAWN_OFFSET, VIEWPORT_WIDTH};
use crate::difficulty::{spawn_tuning, Difficulty, SpawnTuning};

/// Independent timer for one family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTimer {
    pub family: Family,
    /// Frames since the last cycle
    pub counter: u32,
    pub tuning: SpawnTuning,
}

/// A cycle that came due this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueSpawn {
    pub family: Family,
    pub count: u32,
}

/// Per-level set of spawn timers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnScheduler {
    timers: Vec<SpawnTimer>,
}

impl SpawnScheduler {
    /// Timers for every scheduled family whose band covers `level`
    pub fn for_level(level: u32, difficulty: Difficulty) -> Self {
        let timers = families_for_level(level)
            .filter_map(|family| {
                spawn_tuning(family, level, difficulty).map(|tuning| SpawnTimer {
                    family,
                    counter: 0,
                    tuning,
                })
            })
            .collect();
        Self { timers }
    }

    pub fn timers(&self) -> &[SpawnTimer] {
        &self.timers
    }

    pub fn timer(&self, family: Family) -> Option<&SpawnTimer> {
        self.timers.iter().find(|t| t.family == family)
    }

    /// Count every timer up by one frame and return the cycles that fired.
    /// A fired timer always restarts from zero.
    pub fn advance(&mut self) -> Vec<DueSpawn> {
        let mut due = Vec::new();
        for timer in &mut self.timers {
            timer.counter += 1;
            if timer.counter >= timer.tuning.interval {
                timer.counter = 0;
                due.push(DueSpawn {
                    family: timer.family,
                    count: timer.tuning.count,
                });
            }
        }
        due
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        for timer in &mut self.timers {
            timer.counter = 0;
        }
    }
}

/// Run one scheduler tick against the session. Returns how many entities
/// were created.
pub fn run_spawns(session: &mut GameSession) -> usize {
    let mut created = 0;
    for DueSpawn { family, count } in session.spawner.advance() {
        let visible = session.family_count(family);
        let cap = family.visible_cap();
        if visible + count as usize > cap {
            log::trace!(
                "Skipping {:?} cycle: {} visible, cap {}",
                family,
                visible,
                cap
            );
            continue;
        }
        for _ in 0..count {
            if spawn_one(session, family) {
                created += 1;
            }
        }
    }
    created
}

/// Create one instance of `family` at its entry point
fn spawn_one(session: &mut GameSession, family: Family) -> bool {
    let camera_x = session.camera_x;
    let entry_x = camera_x + VIEWPORT_WIDTH + SPAWN_OFFSET;
    let size = family.size();
    let rng = session.rng();

    match family {
        Family::PowerUp => {
            let idx = rng.random_range(0..CollectibleKind::POWER_UPS.len());
            let kind = CollectibleKind::POWER_UPS[idx];
            let y = GROUND_Y - rng.random_range(40.0..180.0);
            session.spawn_collectible(kind, Vec2::new(entry_x, y));
            true
        }
        Family::Raindrop | Family::LavaDrop => {
            let x = camera_x + rng.random_range(0.0..VIEWPORT_WIDTH);
            let y = -size.y - rng.random_range(0.0..60.0);
            session.spawn_hazard(family, Vec2::new(x, y)).is_some()
        }
        Family::Meteor | Family::ShootingStar => {
            let x = camera_x + rng.random_range(VIEWPORT_WIDTH * 0.4..VIEWPORT_WIDTH + SPAWN_OFFSET);
            session.spawn_hazard(family, Vec2::new(x, -size.y)).is_some()
        }
        Family::Fire => session
            .spawn_hazard(family, Vec2::new(entry_x, GROUND_Y - size.y))
            .is_some(),
        Family::Turtle | Family::Robot => session
            .spawn_enemy(family, Vec2::new(entry_x, GROUND_Y - size.y))
            .is_some(),
        Family::Spider => {
            // Hangs from the top of the view, a little inside the window
            let x = camera_x + rng.random_range(VIEWPORT_WIDTH * 0.5..VIEWPORT_WIDTH);
            session.spawn_enemy(family, Vec2::new(x, 40.0)).is_some()
        }
        Family::Bird | Family::Bat | Family::FlyingDisk | Family::Alien | Family::Airplane => {
            let (low, high) = match family {
                Family::Bird => (40.0, 200.0),
                Family::Bat => (60.0, 220.0),
                Family::FlyingDisk => (120.0, 300.0),
                Family::Alien => (160.0, 320.0),
                _ => (360.0, 440.0),
            };
            let y = GROUND_Y - size.y - rng.random_range(low..high);
            session.spawn_enemy(family, Vec2::new(entry_x, y)).is_some()
        }
        Family::BossAlien => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn session_at(level: u32, difficulty: Difficulty) -> GameSession {
        let mut session = GameSession::new(&GameConfig::default());
        session.level = level;
        session.difficulty = difficulty;
        session.spawner = SpawnScheduler::for_level(level, difficulty);
        session
    }

    #[test]
    fn test_timers_follow_bands() {
        let scheduler = SpawnScheduler::for_level(5, Difficulty::Normal);
        assert!(scheduler.timer(Family::Bird).is_some());
        assert!(scheduler.timer(Family::Turtle).is_some());
        assert!(scheduler.timer(Family::Bat).is_none());
        assert!(scheduler.timer(Family::BossAlien).is_none());

        let boss_level = SpawnScheduler::for_level(50, Difficulty::Normal);
        assert!(boss_level.timer(Family::BossAlien).is_none());
        assert!(boss_level.timer(Family::ShootingStar).is_some());
    }

    #[test]
    fn test_timer_fires_on_interval_and_restarts() {
        let mut scheduler = SpawnScheduler::for_level(1, Difficulty::Normal);
        let interval = scheduler.timer(Family::Bird).unwrap().tuning.interval;
        for _ in 0..interval - 1 {
            assert!(!scheduler.advance().iter().any(|d| d.family == Family::Bird));
        }
        let due = scheduler.advance();
        assert!(due.iter().any(|d| d.family == Family::Bird && d.count == 1));
        assert_eq!(scheduler.timer(Family::Bird).unwrap().counter, 0);
    }

    #[test]
    fn test_spawns_just_past_the_window() {
        let mut session = session_at(1, Difficulty::Normal);
        session.camera_x = 1_000.0;
        assert!(spawn_one(&mut session, Family::Bird));
        let bird = &session.enemies[0];
        assert_eq!(bird.pos.x, 1_000.0 + VIEWPORT_WIDTH + SPAWN_OFFSET);
        assert!(bird.pos.y < GROUND_Y);
    }

    #[test]
    fn test_cap_skips_cycle_but_resets_timer() {
        let mut session = session_at(1, Difficulty::Normal);
        for i in 0..Family::Bird.visible_cap() {
            session.spawn_enemy(Family::Bird, Vec2::new(300.0 + i as f32 * 40.0, 300.0));
        }
        let interval = session.spawner.timer(Family::Bird).unwrap().tuning.interval;
        for _ in 0..interval {
            run_spawns(&mut session);
        }
        assert_eq!(session.family_count(Family::Bird), Family::Bird.visible_cap());
        assert_eq!(session.spawner.timer(Family::Bird).unwrap().counter, 0);
    }

    #[test]
    fn test_dying_enemies_free_their_cap_slot() {
        use crate::sim::entity::Damageable;

        let mut session = session_at(1, Difficulty::Normal);
        for i in 0..Family::Bird.visible_cap() {
            session.spawn_enemy(Family::Bird, Vec2::new(300.0 + i as f32 * 40.0, 300.0));
        }
        session.enemies[0].destroy();
        assert_eq!(session.family_count(Family::Bird), Family::Bird.visible_cap() - 1);

        let interval = session.spawner.timer(Family::Bird).unwrap().tuning.interval;
        for _ in 0..interval {
            run_spawns(&mut session);
        }
        assert_eq!(session.family_count(Family::Bird), Family::Bird.visible_cap());
    }

    #[test]
    fn test_scheduler_survives_json() {
        let mut scheduler = SpawnScheduler::for_level(12, Difficulty::Hard);
        scheduler.advance();
        let json = serde_json::to_string(&scheduler).unwrap();
        let loaded: SpawnScheduler = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.timers(), scheduler.timers());
    }

    #[test]
    fn test_hard_spawns_batches() {
        let mut session = session_at(1, Difficulty::Hard);
        let interval = session.spawner.timer(Family::Bird).unwrap().tuning.interval;
        for _ in 0..interval {
            run_spawns(&mut session);
        }
        assert_eq!(session.family_count(Family::Bird), 2);
    }

    #[test]
    fn test_power_up_cycle_creates_collectible() {
        let mut session = session_at(1, Difficulty::Normal);
        assert!(spawn_one(&mut session, Family::PowerUp));
        assert_eq!(session.collectibles.len(), 1);
        assert_ne!(session.collectibles[0].kind, CollectibleKind::ExtraLife);
    }
}
