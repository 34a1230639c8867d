//! Player movement, shooting and damage timers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Projectile, ProjectileKind};
use super::geometry::Aabb;
use super::level::LevelLayout;
use super::progression::PowerUps;
use super::tick::TickInput;
use crate::consts::GROUND_Y;

pub const PLAYER_WIDTH: f32 = 28.0;
pub const PLAYER_HEIGHT: f32 = 48.0;
pub const CROUCH_HEIGHT: f32 = 24.0;
/// Where a fresh level puts the player
pub const PLAYER_START_X: f32 = 80.0;

const RUN_SPEED: f32 = 4.0;
const GRAVITY: f32 = 0.6;
const JUMP_VELOCITY: f32 = -12.0;
const MAX_FALL_SPEED: f32 = 12.0;
const SHOT_SPEED: f32 = 10.0;
const SHOT_COOLDOWN: u32 = 18;
const RAPID_SHOT_COOLDOWN: u32 = 6;
const MAX_SHOTS: usize = 3;
const RAPID_MAX_SHOTS: usize = 5;

/// No control after an unshielded hit
pub const HIT_STUN_FRAMES: u32 = 30;
/// No contact damage after an unshielded hit
pub const GRACE_FRAMES: u32 = 90;
/// Stun and grace after a shield absorbs a hit
pub const SHIELD_STUN_FRAMES: u32 = 30;
pub const SHIELD_GRACE_FRAMES: u32 = 30;

/// What the player did this tick (for sound cues)
#[derive(Debug, Clone, Default)]
pub struct PlayerActions {
    pub jumped: bool,
    /// Shot to add to the session's shot pool
    pub shot: Option<Projectile>,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner of the standing hitbox
    pub pos: Vec2,
    pub vel: Vec2,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub on_ground: bool,
    pub crouching: bool,
    pub jumps_used: u8,
    pub shoot_cooldown: u32,
    pub stun_frames: u32,
    pub grace_frames: u32,
    pub powers: PowerUps,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_START_X, GROUND_Y - PLAYER_HEIGHT),
            vel: Vec2::ZERO,
            facing: 1.0,
            on_ground: true,
            crouching: false,
            jumps_used: 0,
            shoot_cooldown: 0,
            stun_frames: 0,
            grace_frames: 0,
            powers: PowerUps::default(),
        }
    }
}

impl Player {
    /// Put the player back at the start of a level. Power-ups carry over.
    pub fn reset(&mut self) {
        let powers = std::mem::take(&mut self.powers);
        *self = Self {
            powers,
            ..Self::default()
        };
    }

    /// Current hitbox (crouching keeps the feet in place and halves the height)
    pub fn bounds(&self) -> Aabb {
        if self.crouching {
            Aabb::new(
                Vec2::new(self.pos.x, self.pos.y + PLAYER_HEIGHT - CROUCH_HEIGHT),
                Vec2::new(PLAYER_WIDTH, CROUCH_HEIGHT),
            )
        } else {
            Aabb::new(self.pos, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT))
        }
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_frames > 0
    }

    /// Contacts hurt only outside the grace window
    pub fn is_vulnerable(&self) -> bool {
        self.grace_frames == 0
    }

    /// Unshielded hit: stun plus grace window
    pub fn hurt(&mut self) {
        self.stun_frames = HIT_STUN_FRAMES;
        self.grace_frames = GRACE_FRAMES;
        self.vel.x = 0.0;
        self.crouching = false;
    }

    /// Shield absorbed a hit: brief stun, short grace
    pub fn absorb(&mut self) {
        self.stun_frames = SHIELD_STUN_FRAMES;
        self.grace_frames = self.grace_frames.max(SHIELD_GRACE_FRAMES);
        self.vel.x = 0.0;
    }

    /// Count down the stun, grace and power-up timers
    pub fn tick_timers(&mut self) {
        self.stun_frames = self.stun_frames.saturating_sub(1);
        self.grace_frames = self.grace_frames.saturating_sub(1);
        self.shoot_cooldown = self.shoot_cooldown.saturating_sub(1);
        self.powers.tick();
    }

    /// Apply one tick of input and physics.
    ///
    /// `camera_x` is the left edge of the view: the player can not walk back
    /// past it. `live_shots` is the number of player shots still in flight.
    pub fn update(
        &mut self,
        input: &TickInput,
        layout: &LevelLayout,
        camera_x: f32,
        live_shots: usize,
    ) -> PlayerActions {
        let mut actions = PlayerActions::default();
        let controllable = !self.is_stunned();

        // Horizontal intent
        let dir = if controllable {
            match (input.move_left, input.move_right) {
                (true, false) => -1.0,
                (false, true) => 1.0,
                _ => 0.0,
            }
        } else {
            0.0
        };
        if dir != 0.0 {
            self.facing = dir;
        }

        self.crouching = controllable && input.crouch && self.on_ground;
        self.vel.x = if self.crouching { 0.0 } else { dir * RUN_SPEED };

        // Jump / double jump
        if controllable && input.jump && !self.crouching {
            if self.on_ground {
                self.vel.y = JUMP_VELOCITY;
                self.on_ground = false;
                self.jumps_used = 1;
                actions.jumped = true;
            } else if self.powers.double_jump() && self.jumps_used < 2 {
                self.vel.y = JUMP_VELOCITY;
                self.jumps_used = 2;
                actions.jumped = true;
            }
        }

        self.vel.y = (self.vel.y + GRAVITY).min(MAX_FALL_SPEED);
        let prev_feet = self.pos.y + PLAYER_HEIGHT;
        self.pos += self.vel;

        let max_x = (layout.length - PLAYER_WIDTH).max(camera_x);
        self.pos.x = self.pos.x.clamp(camera_x, max_x);

        self.land(layout, prev_feet);

        // Shooting
        if controllable && input.shoot && self.shoot_cooldown == 0 {
            let cap = if self.powers.rapid_fire() {
                RAPID_MAX_SHOTS
            } else {
                MAX_SHOTS
            };
            if live_shots < cap {
                actions.shot = Some(self.make_shot());
                self.shoot_cooldown = if self.powers.rapid_fire() {
                    RAPID_SHOT_COOLDOWN
                } else {
                    SHOT_COOLDOWN
                };
            }
        }

        actions
    }

    /// Resolve ground and platform landings after moving
    fn land(&mut self, layout: &LevelLayout, prev_feet: f32) {
        let feet = self.pos.y + PLAYER_HEIGHT;
        if self.vel.y < 0.0 {
            self.on_ground = false;
            return;
        }

        if feet >= GROUND_Y {
            self.settle_at(GROUND_Y);
            return;
        }

        // One-way ledges: only landed on from above
        let (left, right) = (self.pos.x, self.pos.x + PLAYER_WIDTH);
        let ledge = layout
            .platforms
            .iter()
            .filter(|p| p.spans(left, right) && prev_feet <= p.y && feet >= p.y)
            .map(|p| p.y)
            .fold(None, |best: Option<f32>, y| Some(best.map_or(y, |b| b.min(y))));

        match ledge {
            Some(y) => self.settle_at(y),
            None => self.on_ground = false,
        }
    }

    fn settle_at(&mut self, surface_y: f32) {
        self.pos.y = surface_y - PLAYER_HEIGHT;
        self.vel.y = 0.0;
        self.on_ground = true;
        self.jumps_used = 0;
    }

    fn make_shot(&self) -> Projectile {
        let size = ProjectileKind::Shot.size();
        let bounds = self.bounds();
        let y = bounds.min.y + bounds.size.y * 0.35;
        let x = if self.facing > 0.0 {
            bounds.max().x
        } else {
            bounds.min.x - size.x
        };
        Projectile::new(
            ProjectileKind::Shot,
            Vec2::new(x, y),
            Vec2::new(SHOT_SPEED * self.facing, 0.0),
        )
    }
}
