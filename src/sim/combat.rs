//! Collision & combat resolver
//!
//! Runs once per tick after every entity has moved, in a fixed order:
//!
//! 1. player shots vs enemies
//! 2. player shots vs hazards and hostile projectiles
//! 3. dodge bonuses
//! 4. player vs enemies
//! 5. player vs hazards and hostile projectiles
//! 6. player vs collectibles
//! 7. player vs goal
//!
//! Every check goes through [`Collidable`]/[`Damageable`] and the target's
//! [`Capabilities`](super::entity::Capabilities); no check looks at the level
//! number. Inactive (dead or dying) entities never take part. A lost last
//! life or a reached goal stops the remaining phases.

use std::ops::ControlFlow;

use glam::Vec2;

use super::entity::{Collidable, Damageable, Family, Projectile, SpawnsProjectiles};
use super::hold::{frames_for_cue, HoldAction, HoldKind};
use super::player::Player;
use super::progression::{Progression, ScoreAward};
use super::state::{GameSession, PlayOutcome};
use crate::audio::{AudioService, SoundEffect};
use crate::difficulty;
use crate::rankings::RankingStore;

/// Horizontal and vertical reach of the dodge check
pub const DODGE_RANGE: f32 = 64.0;

/// What happened during one resolver pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombatReport {
    /// Enemies destroyed by shots
    pub kills: u32,
    /// Hazards and missiles destroyed by shots
    pub shot_down: u32,
    pub dodges: u32,
    /// Targets destroyed by touching an invulnerable player
    pub smashed: u32,
    pub absorbed: u32,
    pub hits_taken: u32,
    pub pickups: u32,
    pub goal_reached: bool,
    pub game_over: bool,
}

/// Why the pass ended early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    OutOfLives,
    GoalReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShotResult {
    Damaged,
    Destroyed,
}

/// Outcome of the uniform contact rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    /// Grace window, or an invulnerable player touching something solid
    Ignored,
    Smashed,
    Absorbed,
    Damaged { out_of_lives: bool },
}

/// Resolve every interaction for this tick
pub fn resolve(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    rankings: &dyn RankingStore,
) -> CombatReport {
    let mut report = CombatReport::default();
    let mut blasts: Vec<(Vec2, f32)> = Vec::new();

    let flow = run_phases(session, audio, &mut report, &mut blasts);

    for (pos, scale) in blasts {
        session.explode(pos, scale);
    }
    if flow == ControlFlow::Break(Stop::OutOfLives) {
        report.game_over = true;
        trigger_game_over(session, audio, rankings);
    }
    report
}

fn run_phases(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    report: &mut CombatReport,
    blasts: &mut Vec<(Vec2, f32)>,
) -> ControlFlow<Stop> {
    shots_vs_enemies(session, audio, report, blasts);
    shots_vs_hazards(session, audio, report, blasts);
    dodges(session, audio, report);
    player_vs_enemies(session, audio, report, blasts)?;
    player_vs_hazards(session, audio, report)?;
    player_vs_collectibles(session, audio, report);
    player_vs_goal(session, audio, report)
}

/// Add points and announce a milestone life
fn award(progression: &mut Progression, audio: &mut dyn AudioService, base: u32) -> ScoreAward {
    let result = progression.add_score(base);
    if result.life_granted {
        audio.play_effect(SoundEffect::ExtraLife);
        log::info!("Extra life at {} points ({} lives)", progression.score, progression.lives);
    }
    result
}

fn try_shot<T: Damageable>(shot: &mut Projectile, target: &mut T) -> Option<ShotResult> {
    if !shot.is_active() || !target.is_active() || !target.capabilities().shootable {
        return None;
    }
    if !shot.bounds().intersects(&target.bounds()) {
        return None;
    }
    shot.destroy();
    let destroyed = target.take_hit();
    debug_assert!(!destroyed || !target.is_active(), "destroyed target still collidable");
    Some(if destroyed {
        ShotResult::Destroyed
    } else {
        ShotResult::Damaged
    })
}

/// First target in `targets` the shot connects with: (result, kill award, center)
fn first_hit<'a, T: Damageable + 'a>(
    shot: &mut Projectile,
    targets: impl Iterator<Item = &'a mut T>,
) -> Option<(ShotResult, u32, Vec2)> {
    for target in targets {
        if let Some(result) = try_shot(shot, target) {
            return Some((result, target.capabilities().kill_award, target.bounds().center()));
        }
    }
    None
}

fn shots_vs_enemies(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    report: &mut CombatReport,
    blasts: &mut Vec<(Vec2, f32)>,
) {
    for shot in session.shots.iter_mut() {
        for enemy in session.enemies.iter_mut() {
            let Some(result) = try_shot(shot, enemy) else {
                continue;
            };
            match result {
                ShotResult::Damaged => audio.play_effect(SoundEffect::EnemyHit),
                ShotResult::Destroyed => {
                    award(&mut session.progression, audio, enemy.capabilities().kill_award);
                    session.orphans.extend(enemy.release_projectiles());
                    report.kills += 1;
                    if enemy.family() == Family::BossAlien {
                        session.boss_captured = true;
                        audio.play_effect(SoundEffect::BossCaptured);
                        blasts.push((enemy.bounds().center(), 3.0));
                        log::info!("Boss captured on level {}", session.level);
                    } else {
                        audio.play_effect(SoundEffect::EnemyDestroyed);
                        blasts.push((enemy.bounds().center(), 1.0));
                    }
                }
            }
            break;
        }
    }
}

fn shots_vs_hazards(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    report: &mut CombatReport,
    blasts: &mut Vec<(Vec2, f32)>,
) {
    for shot in session.shots.iter_mut() {
        if !shot.is_active() {
            continue;
        }
        let hit = first_hit(shot, session.hazards.iter_mut())
            .or_else(|| {
                first_hit(
                    shot,
                    session.enemies.iter_mut().flat_map(|e| e.projectiles.iter_mut()),
                )
            })
            .or_else(|| first_hit(shot, session.orphans.iter_mut()));

        if let Some((ShotResult::Destroyed, kill_award, center)) = hit {
            award(&mut session.progression, audio, kill_award);
            audio.play_effect(SoundEffect::HazardDestroyed);
            blasts.push((center, 0.6));
            report.shot_down += 1;
        }
    }
}

/// Award the dodge bonus to enemies that just slipped past the player
fn dodges(session: &mut GameSession, audio: &mut dyn AudioService, report: &mut CombatReport) {
    let player = session.player.bounds();
    for enemy in session.enemies.iter_mut() {
        if !enemy.is_active() || enemy.dodged {
            continue;
        }
        let dodge_award = enemy.capabilities().dodge_award;
        if dodge_award == 0 {
            continue;
        }
        let bounds = enemy.bounds();
        let behind = bounds.max().x <= player.min.x;
        let close = player.min.x - bounds.max().x < DODGE_RANGE
            && bounds.vertical_gap(&player) <= DODGE_RANGE;
        if behind && close {
            enemy.dodged = true;
            award(&mut session.progression, audio, dodge_award);
            audio.play_effect(SoundEffect::Dodge);
            report.dodges += 1;
        }
    }
}

/// Apply the contact rule between the player and one target
fn contact<T: Damageable>(
    player: &mut Player,
    progression: &mut Progression,
    target: &mut T,
    audio: &mut dyn AudioService,
    smash_effect: SoundEffect,
) -> Contact {
    let caps = target.capabilities();

    if player.powers.invulnerable() {
        if !caps.contact_destructible {
            return Contact::Ignored;
        }
        target.destroy();
        award(progression, audio, caps.kill_award);
        audio.play_effect(smash_effect);
        return Contact::Smashed;
    }

    if !player.is_vulnerable() {
        return Contact::Ignored;
    }

    if player.powers.consume_shield() {
        if caps.contact_destructible {
            target.destroy();
        }
        player.absorb();
        audio.play_effect(SoundEffect::ShieldBreak);
        return Contact::Absorbed;
    }

    if caps.contact_destructible {
        target.destroy();
    }
    player.hurt();
    audio.play_effect(SoundEffect::PlayerHurt);
    let out_of_lives = progression.lose_life();
    log::info!("Player hit, {} lives left", progression.lives);
    Contact::Damaged { out_of_lives }
}

fn tally(report: &mut CombatReport, outcome: Contact) -> ControlFlow<Stop> {
    match outcome {
        Contact::Ignored => {}
        Contact::Smashed => report.smashed += 1,
        Contact::Absorbed => report.absorbed += 1,
        Contact::Damaged { out_of_lives } => {
            report.hits_taken += 1;
            if out_of_lives {
                return ControlFlow::Break(Stop::OutOfLives);
            }
        }
    }
    ControlFlow::Continue(())
}

fn player_vs_enemies(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    report: &mut CombatReport,
    blasts: &mut Vec<(Vec2, f32)>,
) -> ControlFlow<Stop> {
    for enemy in session.enemies.iter_mut() {
        if !enemy.is_active() || !enemy.bounds().intersects(&session.player.bounds()) {
            continue;
        }
        let outcome = contact(
            &mut session.player,
            &mut session.progression,
            enemy,
            audio,
            SoundEffect::EnemyDestroyed,
        );
        if outcome == Contact::Ignored {
            // Touched: no dodge bonus for this one later
            enemy.dodged = true;
        }
        if !enemy.is_alive() {
            session.orphans.extend(enemy.release_projectiles());
            blasts.push((enemy.bounds().center(), 1.0));
        }
        tally(report, outcome)?;
    }
    ControlFlow::Continue(())
}

fn touch_all<'a, T: Damageable + 'a>(
    player: &mut Player,
    progression: &mut Progression,
    audio: &mut dyn AudioService,
    report: &mut CombatReport,
    targets: impl Iterator<Item = &'a mut T>,
) -> ControlFlow<Stop> {
    for target in targets {
        if !target.is_active() || !target.bounds().intersects(&player.bounds()) {
            continue;
        }
        let outcome = contact(player, progression, target, audio, SoundEffect::HazardDestroyed);
        tally(report, outcome)?;
    }
    ControlFlow::Continue(())
}

fn player_vs_hazards(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    report: &mut CombatReport,
) -> ControlFlow<Stop> {
    let player = &mut session.player;
    let progression = &mut session.progression;
    touch_all(player, progression, audio, report, session.hazards.iter_mut())?;
    touch_all(
        player,
        progression,
        audio,
        report,
        session.enemies.iter_mut().flat_map(|e| e.projectiles.iter_mut()),
    )?;
    touch_all(player, progression, audio, report, session.orphans.iter_mut())
}

fn player_vs_collectibles(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    report: &mut CombatReport,
) {
    let bounds = session.player.bounds();
    for item in session.collectibles.iter_mut() {
        if !item.is_active() || !item.bounds().intersects(&bounds) {
            continue;
        }
        item.alive = false;
        report.pickups += 1;
        if session.player.powers.grant(item.kind) {
            audio.play_effect(SoundEffect::PowerUp);
            log::debug!("Picked up {:?}", item.kind);
            continue;
        }
        // Extra life: once per level, ever
        session.extra_life_levels.insert(session.level);
        session.progression.gain_life();
        audio.play_effect(SoundEffect::ExtraLife);
        log::info!(
            "Extra life collected on level {} ({} lives)",
            session.level,
            session.progression.lives
        );
    }
}

fn player_vs_goal(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    report: &mut CombatReport,
) -> ControlFlow<Stop> {
    let goal = &mut session.layout.goal;
    if goal.reached
        || !goal.is_open(session.boss_captured)
        || !goal.bounds.intersects(&session.player.bounds())
    {
        return ControlFlow::Continue(());
    }
    goal.reached = true;
    report.goal_reached = true;

    award(
        &mut session.progression,
        audio,
        difficulty::level_complete_bonus(session.level),
    );
    audio.play_effect(SoundEffect::LevelComplete);
    let frames = frames_for_cue(audio, SoundEffect::LevelComplete);
    session
        .hold
        .start(HoldKind::LevelEnd, frames, HoldAction::AdvanceLevel, audio);
    log::info!("Level {} complete with {} points", session.level, session.progression.score);
    ControlFlow::Break(Stop::GoalReached)
}

/// Out of lives: decide the ranking route and start the game-over hold.
/// The state machine switches screens when it reads the outcome.
pub fn trigger_game_over(
    session: &mut GameSession,
    audio: &mut dyn AudioService,
    rankings: &dyn RankingStore,
) {
    if session.outcome.is_some() {
        return;
    }
    let qualifies = rankings.is_high_score(session.progression.score);
    log::info!(
        "Game over on level {} with {} points (ranking: {})",
        session.level,
        session.progression.score,
        qualifies
    );
    audio.stop_music();
    audio.play_effect(SoundEffect::GameOver);
    let frames = frames_for_cue(audio, SoundEffect::GameOver);
    session
        .hold
        .start(HoldKind::GameOver, frames, HoldAction::None, audio);
    session.outcome = Some(PlayOutcome::GameOver { qualifies });
}
