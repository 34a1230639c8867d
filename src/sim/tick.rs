//! Fixed timestep simulation tick
//!
//! Advances one gameplay frame in a fixed order: hold, spawns, player,
//! camera, entity motion, combat, timers, cull.

use super::combat::{self, CombatReport};
use super::entity::Collidable;
use super::hold::HoldAction;
use super::level::LevelGenerator;
use super::spawn::run_spawns;
use super::state::{GameSession, PlayOutcome};
use crate::audio::{AudioService, SoundEffect};
use crate::consts::*;
use crate::persistence::Persistence;
use crate::rankings::RankingStore;

/// Input intents for a single tick (already debounced by the host)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub shoot: bool,
    pub crouch: bool,
    /// Menu confirm
    pub confirm: bool,
    /// Menu back / cancel
    pub back: bool,
    /// Pause toggle
    pub pause: bool,
    /// Name typed on the ranking entry screen
    pub text: Option<String>,
}

/// Collaborators the tick calls out to
pub struct TickContext<'a> {
    pub audio: &'a mut dyn AudioService,
    pub rankings: &'a mut dyn RankingStore,
    pub levels: &'a mut dyn LevelGenerator,
    pub storage: &'a mut dyn Persistence,
}

/// Advance gameplay by one fixed timestep
pub fn tick(session: &mut GameSession, input: &TickInput, ctx: &mut TickContext<'_>) -> CombatReport {
    // A running hold freezes everything but cosmetics
    if session.hold.is_active() {
        let finished = session.hold.tick(ctx.audio);
        animate_effects(session);
        if let Some(done) = finished {
            if done.action == HoldAction::AdvanceLevel {
                advance_level(session, ctx);
            }
        }
        return CombatReport::default();
    }

    // Result pending: nothing moves until the state machine takes it
    if session.outcome.is_some() {
        return CombatReport::default();
    }

    session.time_ticks += 1;
    session.level_ticks += 1;

    run_spawns(session);

    let live_shots = session.shots.len();
    let actions = session
        .player
        .update(input, &session.layout, session.camera_x, live_shots);
    if actions.jumped {
        ctx.audio.play_effect(SoundEffect::Jump);
    }
    if let Some(shot) = actions.shot {
        if session.shots.acquire(|p| *p = shot).is_some() {
            ctx.audio.play_effect(SoundEffect::Shoot);
        }
    }

    follow_camera(session);
    session.release_placements();

    let scale = session.time_scale();
    let target = session.player.center();
    for enemy in &mut session.enemies {
        enemy.update(target, scale);
    }
    for hazard in &mut session.hazards {
        hazard.update(scale);
    }
    for shot in session.shots.iter_mut() {
        shot.advance(1.0);
    }
    for projectile in &mut session.orphans {
        projectile.advance(scale);
    }
    animate_effects(session);

    let report = combat::resolve(session, ctx.audio, &*ctx.rankings);

    session.player.tick_timers();
    session.compact();
    report
}

/// Camera follows the player forward only, clamped to the level
fn follow_camera(session: &mut GameSession) {
    let max_camera = (session.layout.length - VIEWPORT_WIDTH).max(0.0);
    let target = (session.player.pos.x - CAMERA_LEAD).clamp(0.0, max_camera);
    if target > session.camera_x {
        session.camera_x = target;
    }
}

fn animate_effects(session: &mut GameSession) {
    for explosion in session.explosions.iter_mut() {
        explosion.update();
    }
}

/// Deferred action of a level-end hold: next level, or the campaign result
/// after the last one
pub fn advance_level(session: &mut GameSession, ctx: &mut TickContext<'_>) {
    if session.level >= LAST_LEVEL {
        let qualifies = ctx.rankings.is_high_score(session.progression.score);
        log::info!(
            "Campaign complete with {} points (ranking: {})",
            session.progression.score,
            qualifies
        );
        session.outcome = Some(PlayOutcome::CampaignComplete { qualifies });
        if let Err(err) = ctx.storage.clear_progress() {
            log::warn!("Could not clear autosave: {}", err);
        }
        return;
    }

    let next = session.level + 1;
    session.begin_level(next, ctx.levels, ctx.audio);
    autosave(session, ctx.storage);
}

/// Save Continue data; failures are logged and play goes on
pub fn autosave(session: &GameSession, storage: &mut dyn Persistence) {
    match storage.save_progress(&session.snapshot()) {
        Ok(()) => log::debug!("Autosaved at level {}", session.level),
        Err(err) => log::warn!("Autosave failed: {}", err),
    }
}

/// Demo-mode input: run right, jump over whatever is in the way, shoot
/// anything at muzzle height
pub fn demo_input(session: &GameSession) -> TickInput {
    let player = session.player.bounds();
    let reach = player.max().x + 140.0;

    let threat_ahead = session
        .enemies
        .iter()
        .filter(|e| e.is_active())
        .map(|e| e.bounds())
        .chain(session.hazards.iter().filter(|h| h.is_active()).map(|h| h.bounds()))
        .any(|b| b.min.x > player.min.x && b.min.x < reach && b.vertical_gap(&player) < 8.0);

    let target_in_line = session.enemies.iter().any(|e| {
        let b = e.bounds();
        e.is_active()
            && b.min.x > player.max().x
            && b.min.x < session.camera_x + VIEWPORT_WIDTH
            && b.min.y < player.max().y
            && b.max().y > player.min.y
    });

    TickInput {
        move_right: true,
        jump: threat_ahead && session.player.on_ground,
        shoot: target_in_line,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    use crate::audio::HeadlessAudio;
    use crate::config::GameConfig;
    use crate::difficulty::Difficulty;
    use crate::persistence::MemoryStore;
    use crate::rankings::Rankings;
    use crate::sim::entity::{Family, Projectile, ProjectileKind};
    use crate::sim::hold::HoldKind;
    use crate::sim::level::{LevelLayout, StandardLevelGenerator};
    use crate::sim::progression::SLOW_TIME_FRAMES;
    use crate::sim::spawn::SpawnScheduler;

    /// Flat levels with nothing placed
    struct FlatLevels;

    impl LevelGenerator for FlatLevels {
        fn init_level(&mut self, session: &mut GameSession, level: u32) {
            session.layout = LevelLayout::flat(level, 4_000.0);
        }
    }

    struct Rig {
        audio: HeadlessAudio,
        rankings: Rankings,
        levels: FlatLevels,
        storage: MemoryStore,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                audio: HeadlessAudio::new(),
                rankings: Rankings::default(),
                levels: FlatLevels,
                storage: MemoryStore::default(),
            }
        }

        fn ctx(&mut self) -> TickContext<'_> {
            TickContext {
                audio: &mut self.audio,
                rankings: &mut self.rankings,
                levels: &mut self.levels,
                storage: &mut self.storage,
            }
        }

        /// Session at `level` with the spawn timers switched off
        fn quiet_session(&mut self, level: u32, difficulty: Difficulty) -> GameSession {
            let mut session = GameSession::new(&GameConfig::default());
            session.start_new_game(difficulty, level, &mut self.levels, &mut self.audio);
            session.spawner = SpawnScheduler::default();
            session
        }
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_end_to_end_shoot_then_get_hit() {
        let mut rig = Rig::new();
        let mut session = rig.quiet_session(5, Difficulty::Normal);
        assert_eq!(session.progression.score, 0);
        assert_eq!(session.progression.lives, 3);

        session.spawn_enemy(Family::Bird, Vec2::new(200.0, 470.0));
        let shoot = TickInput {
            shoot: true,
            ..Default::default()
        };
        tick(&mut session, &shoot, &mut rig.ctx());
        for _ in 0..20 {
            tick(&mut session, &idle(), &mut rig.ctx());
        }
        assert_eq!(session.progression.score, 100);
        assert_eq!(session.progression.lives, 3);

        let pos = session.player.pos + Vec2::new(4.0, 10.0);
        session.spawn_enemy(Family::Bird, pos);
        let report = tick(&mut session, &idle(), &mut rig.ctx());
        assert_eq!(report.hits_taken, 1);
        assert_eq!(session.progression.lives, 2);
        assert_eq!(session.progression.score, 100);
    }

    #[test]
    fn test_level_end_hold_advances_exactly_one_level() {
        let mut rig = Rig::new();
        let mut session = rig.quiet_session(5, Difficulty::Normal);
        session
            .hold
            .start(HoldKind::LevelEnd, 30, HoldAction::AdvanceLevel, &mut rig.audio);

        for _ in 0..29 {
            tick(&mut session, &idle(), &mut rig.ctx());
            assert!(session.hold.is_active());
            assert_eq!(session.level, 5);
        }
        tick(&mut session, &idle(), &mut rig.ctx());
        assert!(!session.hold.is_active());
        assert_eq!(session.level, 6);
        assert_eq!(session.layout.level, 6);
        assert_eq!(rig.storage.progress.as_ref().map(|p| p.level), Some(6));
    }

    #[test]
    fn test_level_end_hold_freezes_gameplay() {
        let mut rig = Rig::new();
        let mut session = rig.quiet_session(5, Difficulty::Normal);
        session.spawn_enemy(Family::Bird, Vec2::new(600.0, 300.0));
        session
            .hold
            .start(HoldKind::LevelEnd, 10, HoldAction::None, &mut rig.audio);
        let run = TickInput {
            move_right: true,
            ..Default::default()
        };
        let player_x = session.player.pos.x;
        for _ in 0..5 {
            tick(&mut session, &run, &mut rig.ctx());
        }
        assert_eq!(session.enemies[0].pos.x, 600.0);
        assert_eq!(session.player.pos.x, player_x);
        assert_eq!(session.level_ticks, 0);
    }

    #[test]
    fn test_orphaned_missiles_outlive_their_robot() {
        let mut rig = Rig::new();
        let mut session = rig.quiet_session(25, Difficulty::Normal);
        session.spawn_enemy(Family::Robot, Vec2::new(600.0, 472.0));
        session.enemies[0].hp = 1;
        for y in [300.0, 320.0] {
            session.enemies[0].projectiles.push(Projectile::new(
                ProjectileKind::Missile,
                Vec2::new(560.0, y),
                Vec2::new(-4.0, 0.0),
            ));
        }
        session.shots.acquire(|p| {
            *p = Projectile::new(ProjectileKind::Shot, Vec2::new(605.0, 476.0), Vec2::new(10.0, 0.0));
        });

        tick(&mut session, &idle(), &mut rig.ctx());
        assert_eq!(session.orphans.len(), 2);
        assert!(session.enemies[0].projectiles.is_empty());

        let before: Vec<f32> = session.orphans.iter().map(|p| p.pos.x).collect();
        tick(&mut session, &idle(), &mut rig.ctx());
        for (p, x) in session.orphans.iter().zip(before) {
            assert_eq!(p.pos.x, x - 4.0);
        }

        // Robot finishes dying and is removed; the missiles keep flying
        for _ in 0..30 {
            tick(&mut session, &idle(), &mut rig.ctx());
        }
        assert!(session.enemies.is_empty());
        assert_eq!(session.orphans.len(), 2);

        // ...until they leave the camera window
        for _ in 0..250 {
            tick(&mut session, &idle(), &mut rig.ctx());
        }
        assert!(session.orphans.is_empty());
    }

    #[test]
    fn test_slow_time_halves_enemy_speed() {
        let mut rig = Rig::new();
        let mut session = rig.quiet_session(5, Difficulty::Normal);
        session.spawn_enemy(Family::Turtle, Vec2::new(600.0, 496.0));
        tick(&mut session, &idle(), &mut rig.ctx());
        let normal_step = 600.0 - session.enemies[0].pos.x;

        session.player.powers.slow_time_frames = SLOW_TIME_FRAMES;
        let x = session.enemies[0].pos.x;
        tick(&mut session, &idle(), &mut rig.ctx());
        let slow_step = x - session.enemies[0].pos.x;
        assert!((slow_step - normal_step * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_game_over_outcome_stops_the_world() {
        let mut rig = Rig::new();
        let mut session = rig.quiet_session(5, Difficulty::Normal);
        session.progression.lives = 1;
        let pos = session.player.pos + Vec2::new(4.0, 10.0);
        session.spawn_enemy(Family::Bird, pos);
        tick(&mut session, &idle(), &mut rig.ctx());
        assert_eq!(session.outcome, Some(PlayOutcome::GameOver { qualifies: false }));
        assert_eq!(session.hold.kind(), Some(HoldKind::GameOver));

        let ticks = session.time_ticks;
        let total = session.hold.total();
        for _ in 0..total {
            tick(&mut session, &idle(), &mut rig.ctx());
        }
        assert!(!session.hold.is_active());
        assert_eq!(session.time_ticks, ticks);
        assert_eq!(session.level, 5);
    }

    #[test]
    fn test_last_level_completes_campaign() {
        let mut rig = Rig::new();
        let mut session = rig.quiet_session(LAST_LEVEL, Difficulty::Normal);
        session.progression.add_score(2_000);
        rig.storage.progress = Some(session.snapshot());
        session
            .hold
            .start(HoldKind::LevelEnd, 1, HoldAction::AdvanceLevel, &mut rig.audio);
        tick(&mut session, &idle(), &mut rig.ctx());
        assert_eq!(
            session.outcome,
            Some(PlayOutcome::CampaignComplete { qualifies: true })
        );
        assert_eq!(session.level, LAST_LEVEL);
        assert!(rig.storage.progress.is_none());
    }

    #[test]
    fn test_camera_only_moves_forward() {
        let mut rig = Rig::new();
        let mut session = rig.quiet_session(1, Difficulty::Normal);
        let run = TickInput {
            move_right: true,
            ..Default::default()
        };
        for _ in 0..200 {
            tick(&mut session, &run, &mut rig.ctx());
        }
        let camera = session.camera_x;
        assert!(camera > 0.0);
        let back = TickInput {
            move_left: true,
            ..Default::default()
        };
        for _ in 0..200 {
            tick(&mut session, &back, &mut rig.ctx());
        }
        assert_eq!(session.camera_x, camera);
        assert_eq!(session.player.pos.x, camera);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed: u64| {
            let mut audio = HeadlessAudio::new();
            let mut rankings = Rankings::default();
            let mut levels = StandardLevelGenerator::new(seed);
            let mut storage = MemoryStore::default();
            let config = GameConfig {
                seed,
                ..GameConfig::default()
            };
            let mut session = GameSession::new(&config);
            session.start_new_game(Difficulty::Hard, 14, &mut levels, &mut audio);
            let mut ctx = TickContext {
                audio: &mut audio,
                rankings: &mut rankings,
                levels: &mut levels,
                storage: &mut storage,
            };
            for _ in 0..900 {
                let input = demo_input(&session);
                tick(&mut session, &input, &mut ctx);
            }
            (
                session.progression.score,
                session.progression.lives,
                session.player.pos,
                session.enemies.len(),
                session.hazards.len(),
            )
        };
        assert_eq!(run(42), run(42));
    }
}
