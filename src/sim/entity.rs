//! Entity families and their per-family update rules
//!
//! Every family is a tagged variant carrying only the state it needs. The
//! combat resolver never looks at the variant directly: it reads the
//! [`Capabilities`] record and goes through the [`Collidable`],
//! [`Damageable`] and [`SpawnsProjectiles`] seams.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use crate::consts::GROUND_Y;

pub type EntityId = u32;

/// Frames an enemy spends in its dying animation before removal
pub const DYING_FRAMES: u32 = 24;
/// Frames an explosion stays on screen
pub const EXPLOSION_FRAMES: u32 = 18;

/// Every spawnable family, enemies and hazards alike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    Bird,
    Bat,
    Turtle,
    Spider,
    Robot,
    Airplane,
    FlyingDisk,
    Alien,
    BossAlien,
    Fire,
    Raindrop,
    LavaDrop,
    Meteor,
    ShootingStar,
    PowerUp,
}

/// What the resolver is allowed to do with an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Player shots hit it
    pub shootable: bool,
    /// Touching the player destroys it (invulnerable, shielded or hurt player)
    pub contact_destructible: bool,
    /// Base points when destroyed by the player
    pub kill_award: u32,
    /// Base points for passing it without contact (0 = no dodge bonus)
    pub dodge_award: u32,
    /// Shots needed to destroy it
    pub hit_points: u32,
}

impl Capabilities {
    const fn enemy(kill_award: u32, dodge_award: u32, hit_points: u32) -> Self {
        Self {
            shootable: true,
            contact_destructible: true,
            kill_award,
            dodge_award,
            hit_points,
        }
    }

    const fn hazard(shootable: bool, contact_destructible: bool, kill_award: u32) -> Self {
        Self {
            shootable,
            contact_destructible,
            kill_award,
            dodge_award: 0,
            hit_points: 1,
        }
    }
}

impl Family {
    /// Families driven by the spawn scheduler (the boss is placed by the level)
    pub const SCHEDULED: [Family; 14] = [
        Family::Bird,
        Family::Bat,
        Family::Turtle,
        Family::Spider,
        Family::Robot,
        Family::Airplane,
        Family::FlyingDisk,
        Family::Alien,
        Family::Fire,
        Family::Raindrop,
        Family::LavaDrop,
        Family::Meteor,
        Family::ShootingStar,
        Family::PowerUp,
    ];

    pub fn is_enemy(self) -> bool {
        matches!(
            self,
            Family::Bird
                | Family::Bat
                | Family::Turtle
                | Family::Spider
                | Family::Robot
                | Family::Airplane
                | Family::FlyingDisk
                | Family::Alien
                | Family::BossAlien
        )
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            Family::Bird => Capabilities::enemy(100, 50, 1),
            Family::Bat => Capabilities::enemy(150, 60, 1),
            Family::Turtle => Capabilities::enemy(100, 40, 2),
            Family::Spider => Capabilities::enemy(150, 50, 1),
            Family::Robot => Capabilities::enemy(250, 80, 3),
            Family::Airplane => Capabilities::enemy(300, 100, 2),
            Family::FlyingDisk => Capabilities::enemy(200, 80, 1),
            Family::Alien => Capabilities::enemy(300, 100, 2),
            Family::BossAlien => Capabilities {
                shootable: true,
                contact_destructible: false,
                kill_award: 5_000,
                dodge_award: 0,
                hit_points: 20,
            },
            Family::Fire => Capabilities::hazard(false, false, 0),
            Family::Raindrop => Capabilities::hazard(false, true, 0),
            Family::LavaDrop => Capabilities::hazard(false, true, 0),
            Family::Meteor => Capabilities::hazard(true, true, 75),
            Family::ShootingStar => Capabilities::hazard(true, true, 120),
            Family::PowerUp => Capabilities::hazard(false, false, 0),
        }
    }

    /// Hitbox size
    pub fn size(self) -> Vec2 {
        match self {
            Family::Bird => Vec2::new(32.0, 24.0),
            Family::Bat => Vec2::new(28.0, 20.0),
            Family::Turtle => Vec2::new(36.0, 24.0),
            Family::Spider => Vec2::new(26.0, 26.0),
            Family::Robot => Vec2::new(36.0, 48.0),
            Family::Airplane => Vec2::new(64.0, 28.0),
            Family::FlyingDisk => Vec2::new(40.0, 16.0),
            Family::Alien => Vec2::new(40.0, 40.0),
            Family::BossAlien => Vec2::new(120.0, 80.0),
            Family::Fire => Vec2::new(30.0, 34.0),
            Family::Raindrop => Vec2::new(6.0, 14.0),
            Family::LavaDrop => Vec2::new(10.0, 14.0),
            Family::Meteor => Vec2::new(28.0, 28.0),
            Family::ShootingStar => Vec2::new(18.0, 18.0),
            Family::PowerUp => Vec2::new(24.0, 24.0),
        }
    }

    /// Most instances of this family allowed on screen at once
    pub fn visible_cap(self) -> usize {
        match self {
            Family::Bird => 4,
            Family::Bat => 5,
            Family::Turtle => 3,
            Family::Spider => 3,
            Family::Robot => 2,
            Family::Airplane => 2,
            Family::FlyingDisk => 4,
            Family::Alien => 2,
            Family::BossAlien => 1,
            Family::Fire => 3,
            Family::Raindrop => 12,
            Family::LavaDrop => 6,
            Family::Meteor => 3,
            Family::ShootingStar => 2,
            Family::PowerUp => 1,
        }
    }
}

/// Seam for anything with a hitbox that can be switched off
pub trait Collidable {
    fn bounds(&self) -> Aabb;
    /// False once dead or dying: inactive entities take part in no contact check
    fn is_active(&self) -> bool;
}

/// Seam for anything the player can destroy
pub trait Damageable: Collidable {
    fn capabilities(&self) -> Capabilities;
    /// Take one hit; returns true when this hit destroyed it
    fn take_hit(&mut self) -> bool;
    /// Destroy outright (contact)
    fn destroy(&mut self);
}

/// Seam for entities that own the projectiles they fire
pub trait SpawnsProjectiles {
    fn projectiles(&self) -> &[Projectile];
    fn projectiles_mut(&mut self) -> &mut Vec<Projectile>;
    /// Move every owned projectile out (ownership transfer to the orphan list)
    fn release_projectiles(&mut self) -> Vec<Projectile> {
        std::mem::take(self.projectiles_mut())
    }
}

/// Alive or playing the dying animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeState {
    Alive,
    Dying { frames: u32 },
}

/// Projectile kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Player shot
    Shot,
    /// Robot/airplane ordnance, can be shot down
    Missile,
    /// Alien beam, can not be shot down
    Laser,
}

impl ProjectileKind {
    pub fn size(self) -> Vec2 {
        match self {
            ProjectileKind::Shot => Vec2::new(12.0, 4.0),
            ProjectileKind::Missile => Vec2::new(18.0, 8.0),
            ProjectileKind::Laser => Vec2::new(22.0, 3.0),
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            ProjectileKind::Shot => Capabilities::hazard(false, false, 0),
            ProjectileKind::Missile => Capabilities::hazard(true, true, 25),
            ProjectileKind::Laser => Capabilities::hazard(false, true, 0),
        }
    }
}

/// A moving projectile (player shot or hostile ordnance)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub alive: bool,
    pub age: u32,
}

impl Projectile {
    pub fn new(kind: ProjectileKind, pos: Vec2, vel: Vec2) -> Self {
        Self {
            kind,
            pos,
            vel,
            alive: true,
            age: 0,
        }
    }

    /// Move one tick; ordnance that reaches the ground is spent
    pub fn advance(&mut self, time_scale: f32) {
        if !self.alive {
            return;
        }
        self.pos += self.vel * time_scale;
        self.age += 1;
        if self.kind != ProjectileKind::Shot && self.pos.y + self.kind.size().y >= GROUND_Y + 8.0 {
            self.alive = false;
        }
    }
}

impl Collidable for Projectile {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.kind.size())
    }

    fn is_active(&self) -> bool {
        self.alive
    }
}

impl Damageable for Projectile {
    fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    fn take_hit(&mut self) -> bool {
        let was_alive = self.alive;
        self.alive = false;
        was_alive
    }

    fn destroy(&mut self) {
        self.alive = false;
    }
}

/// Per-family enemy state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyKind {
    Bird { base_y: f32 },
    Bat { base_y: f32 },
    Turtle,
    Spider { anchor_y: f32, drop_to: f32, rising: bool },
    Robot { fire_cooldown: u32 },
    Airplane { drop_cooldown: u32 },
    FlyingDisk { flip_in: u32 },
    Alien { base_y: f32, fire_cooldown: u32 },
    BossAlien { base_y: f32, fire_cooldown: u32 },
}

const ROBOT_FIRE_FRAMES: u32 = 120;
const AIRPLANE_DROP_FRAMES: u32 = 90;
const DISK_FLIP_FRAMES: u32 = 40;
const ALIEN_FIRE_FRAMES: u32 = 100;
const BOSS_FIRE_FRAMES: u32 = 60;

impl EnemyKind {
    pub fn family(&self) -> Family {
        match self {
            EnemyKind::Bird { .. } => Family::Bird,
            EnemyKind::Bat { .. } => Family::Bat,
            EnemyKind::Turtle => Family::Turtle,
            EnemyKind::Spider { .. } => Family::Spider,
            EnemyKind::Robot { .. } => Family::Robot,
            EnemyKind::Airplane { .. } => Family::Airplane,
            EnemyKind::FlyingDisk { .. } => Family::FlyingDisk,
            EnemyKind::Alien { .. } => Family::Alien,
            EnemyKind::BossAlien { .. } => Family::BossAlien,
        }
    }
}

/// An enemy instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub hp: u32,
    pub life: LifeState,
    /// Dodge bonus already paid for this instance
    pub dodged: bool,
    pub age: u32,
    /// Ordnance fired by this enemy and still in flight
    pub projectiles: Vec<Projectile>,
}

impl Enemy {
    /// Build a fresh enemy of `family` with its top-left corner at `pos`.
    /// Returns `None` for hazard/collectible families.
    pub fn spawn(id: EntityId, family: Family, pos: Vec2) -> Option<Self> {
        let (kind, vel) = match family {
            Family::Bird => (EnemyKind::Bird { base_y: pos.y }, Vec2::new(-2.5, 0.0)),
            Family::Bat => (EnemyKind::Bat { base_y: pos.y }, Vec2::new(-2.0, 0.0)),
            Family::Turtle => (EnemyKind::Turtle, Vec2::new(-1.0, 0.0)),
            Family::Spider => (
                EnemyKind::Spider {
                    anchor_y: pos.y,
                    drop_to: GROUND_Y - 90.0,
                    rising: false,
                },
                Vec2::ZERO,
            ),
            Family::Robot => (
                EnemyKind::Robot {
                    fire_cooldown: ROBOT_FIRE_FRAMES / 2,
                },
                Vec2::new(-1.2, 0.0),
            ),
            Family::Airplane => (
                EnemyKind::Airplane {
                    drop_cooldown: AIRPLANE_DROP_FRAMES / 2,
                },
                Vec2::new(-3.0, 0.0),
            ),
            Family::FlyingDisk => (
                EnemyKind::FlyingDisk {
                    flip_in: DISK_FLIP_FRAMES,
                },
                Vec2::new(-3.5, 1.5),
            ),
            Family::Alien => (
                EnemyKind::Alien {
                    base_y: pos.y,
                    fire_cooldown: ALIEN_FIRE_FRAMES / 2,
                },
                Vec2::new(-1.5, 0.0),
            ),
            Family::BossAlien => (
                EnemyKind::BossAlien {
                    base_y: pos.y,
                    fire_cooldown: BOSS_FIRE_FRAMES,
                },
                Vec2::ZERO,
            ),
            _ => return None,
        };
        Some(Self {
            id,
            kind,
            pos,
            vel,
            hp: family.capabilities().hit_points,
            life: LifeState::Alive,
            dodged: false,
            age: 0,
            projectiles: Vec::new(),
        })
    }

    pub fn family(&self) -> Family {
        self.kind.family()
    }

    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }

    /// Dying animation finished, ready for compaction
    pub fn is_finished(&self) -> bool {
        self.life == LifeState::Dying { frames: 0 }
    }

    fn start_dying(&mut self) {
        if self.is_alive() {
            self.life = LifeState::Dying {
                frames: DYING_FRAMES,
            };
            self.vel = Vec2::ZERO;
        }
    }

    /// Advance one tick. `target` is the player's center (aim point for
    /// gunners); `time_scale` slows movement while slow-time is running.
    pub fn update(&mut self, target: Vec2, time_scale: f32) {
        self.age += 1;
        for projectile in &mut self.projectiles {
            projectile.advance(time_scale);
        }
        self.projectiles.retain(|p| p.alive);

        if let LifeState::Dying { frames } = &mut self.life {
            *frames = frames.saturating_sub(1);
            return;
        }

        let age = self.age as f32;
        let size = self.family().size();
        let front = Vec2::new(self.pos.x - 4.0, self.pos.y + size.y * 0.4);
        let mut fired: Option<Projectile> = None;

        match &mut self.kind {
            EnemyKind::Bird { base_y } => {
                self.pos.x += self.vel.x * time_scale;
                self.pos.y = *base_y + (age * std::f32::consts::TAU / 90.0).sin() * 18.0;
            }
            EnemyKind::Bat { base_y } => {
                self.pos.x += self.vel.x * time_scale;
                self.pos.y = *base_y + (age * std::f32::consts::TAU / 70.0).sin() * 40.0;
            }
            EnemyKind::Turtle => {
                self.pos.x += self.vel.x * time_scale;
                self.pos.y = GROUND_Y - size.y;
            }
            EnemyKind::Spider {
                anchor_y,
                drop_to,
                rising,
            } => {
                if *rising {
                    self.pos.y -= 1.5 * time_scale;
                    if self.pos.y <= *anchor_y {
                        self.pos.y = *anchor_y;
                        *rising = false;
                    }
                } else {
                    self.pos.y += 2.0 * time_scale;
                    if self.pos.y >= *drop_to {
                        self.pos.y = *drop_to;
                        *rising = true;
                    }
                }
            }
            EnemyKind::Robot { fire_cooldown } => {
                self.pos.x += self.vel.x * time_scale;
                self.pos.y = GROUND_Y - size.y;
                *fire_cooldown = fire_cooldown.saturating_sub(1);
                if *fire_cooldown == 0 {
                    *fire_cooldown = ROBOT_FIRE_FRAMES;
                    fired = Some(Projectile::new(
                        ProjectileKind::Missile,
                        front,
                        Vec2::new(-4.0, 0.0),
                    ));
                }
            }
            EnemyKind::Airplane { drop_cooldown } => {
                self.pos.x += self.vel.x * time_scale;
                *drop_cooldown = drop_cooldown.saturating_sub(1);
                if *drop_cooldown == 0 {
                    *drop_cooldown = AIRPLANE_DROP_FRAMES;
                    let belly = Vec2::new(self.pos.x + size.x * 0.5, self.pos.y + size.y);
                    fired = Some(Projectile::new(
                        ProjectileKind::Missile,
                        belly,
                        Vec2::new(-1.5, 3.5),
                    ));
                }
            }
            EnemyKind::FlyingDisk { flip_in } => {
                self.pos += self.vel * time_scale;
                *flip_in = flip_in.saturating_sub(1);
                if *flip_in == 0 {
                    *flip_in = DISK_FLIP_FRAMES;
                    self.vel.y = -self.vel.y;
                }
            }
            EnemyKind::Alien {
                base_y,
                fire_cooldown,
            } => {
                self.pos.x += self.vel.x * time_scale;
                self.pos.y = *base_y + (age * std::f32::consts::TAU / 120.0).sin() * 24.0;
                *fire_cooldown = fire_cooldown.saturating_sub(1);
                if *fire_cooldown == 0 {
                    *fire_cooldown = ALIEN_FIRE_FRAMES;
                    fired = Some(aimed_laser(self.pos, size, target));
                }
            }
            EnemyKind::BossAlien {
                base_y,
                fire_cooldown,
            } => {
                self.pos.y = *base_y + (age * std::f32::consts::TAU / 180.0).sin() * 60.0;
                *fire_cooldown = fire_cooldown.saturating_sub(1);
                if *fire_cooldown == 0 {
                    *fire_cooldown = BOSS_FIRE_FRAMES;
                    fired = Some(aimed_laser(self.pos, size, target));
                }
            }
        }

        if let Some(projectile) = fired {
            self.projectiles.push(projectile);
        }
    }
}

/// Horizontal laser from the enemy's middle toward the side the target is on
fn aimed_laser(pos: Vec2, size: Vec2, target: Vec2) -> Projectile {
    let center = pos + size * 0.5;
    let dir = if target.x < center.x { -1.0 } else { 1.0 };
    let muzzle = Vec2::new(if dir < 0.0 { pos.x - 22.0 } else { pos.x + size.x }, center.y);
    Projectile::new(ProjectileKind::Laser, muzzle, Vec2::new(6.0 * dir, 0.0))
}

impl Collidable for Enemy {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.family().size())
    }

    fn is_active(&self) -> bool {
        self.is_alive()
    }
}

impl Damageable for Enemy {
    fn capabilities(&self) -> Capabilities {
        self.family().capabilities()
    }

    fn take_hit(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.hp = self.hp.saturating_sub(1);
        if self.hp == 0 {
            self.start_dying();
            true
        } else {
            false
        }
    }

    fn destroy(&mut self) {
        self.hp = 0;
        self.start_dying();
    }
}

impl SpawnsProjectiles for Enemy {
    fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    fn projectiles_mut(&mut self) -> &mut Vec<Projectile> {
        &mut self.projectiles
    }
}

/// Hazard kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    Fire,
    Raindrop,
    LavaDrop,
    Meteor,
    ShootingStar,
}

impl HazardKind {
    pub fn family(self) -> Family {
        match self {
            HazardKind::Fire => Family::Fire,
            HazardKind::Raindrop => Family::Raindrop,
            HazardKind::LavaDrop => Family::LavaDrop,
            HazardKind::Meteor => Family::Meteor,
            HazardKind::ShootingStar => Family::ShootingStar,
        }
    }

    pub fn from_family(family: Family) -> Option<Self> {
        match family {
            Family::Fire => Some(HazardKind::Fire),
            Family::Raindrop => Some(HazardKind::Raindrop),
            Family::LavaDrop => Some(HazardKind::LavaDrop),
            Family::Meteor => Some(HazardKind::Meteor),
            Family::ShootingStar => Some(HazardKind::ShootingStar),
            _ => None,
        }
    }

    fn initial_velocity(self) -> Vec2 {
        match self {
            HazardKind::Fire => Vec2::ZERO,
            HazardKind::Raindrop => Vec2::new(0.0, 6.0),
            HazardKind::LavaDrop => Vec2::new(0.0, 1.0),
            HazardKind::Meteor => Vec2::new(-3.0, 5.0),
            HazardKind::ShootingStar => Vec2::new(-7.0, 3.0),
        }
    }
}

/// An environmental hazard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub id: EntityId,
    pub kind: HazardKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub alive: bool,
    pub age: u32,
}

impl Hazard {
    pub fn new(id: EntityId, kind: HazardKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: kind.initial_velocity(),
            alive: true,
            age: 0,
        }
    }

    /// Move one tick; falling hazards are spent when they reach the ground
    pub fn update(&mut self, time_scale: f32) {
        if !self.alive {
            return;
        }
        self.age += 1;
        match self.kind {
            HazardKind::Fire => {
                self.pos.y = GROUND_Y - self.kind.family().size().y;
            }
            HazardKind::LavaDrop => {
                self.vel.y = (self.vel.y + 0.15).min(8.0);
                self.pos += self.vel * time_scale;
            }
            HazardKind::Raindrop | HazardKind::Meteor | HazardKind::ShootingStar => {
                self.pos += self.vel * time_scale;
            }
        }
        if self.kind != HazardKind::Fire && self.pos.y >= GROUND_Y {
            self.alive = false;
        }
    }
}

impl Collidable for Hazard {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.kind.family().size())
    }

    fn is_active(&self) -> bool {
        self.alive
    }
}

impl Damageable for Hazard {
    fn capabilities(&self) -> Capabilities {
        self.kind.family().capabilities()
    }

    fn take_hit(&mut self) -> bool {
        let was_alive = self.alive;
        self.alive = false;
        was_alive
    }

    fn destroy(&mut self) {
        self.alive = false;
    }
}

/// Pickup kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    ExtraLife,
    Invulnerability,
    DoubleJump,
    Shield,
    SlowTime,
    RapidFire,
}

impl CollectibleKind {
    /// Kinds the scheduler hands out (the extra life is placed by the level)
    pub const POWER_UPS: [CollectibleKind; 5] = [
        CollectibleKind::Invulnerability,
        CollectibleKind::DoubleJump,
        CollectibleKind::Shield,
        CollectibleKind::SlowTime,
        CollectibleKind::RapidFire,
    ];
}

/// A pickup waiting in the level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: EntityId,
    pub kind: CollectibleKind,
    pub pos: Vec2,
    pub alive: bool,
}

impl Collectible {
    pub fn new(id: EntityId, kind: CollectibleKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            alive: true,
        }
    }
}

impl Collidable for Collectible {
    fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Family::PowerUp.size())
    }

    fn is_active(&self) -> bool {
        self.alive
    }
}

/// Cosmetic explosion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub frames_left: u32,
    /// Radius scale (bosses blow up bigger)
    pub scale: f32,
}

impl Explosion {
    pub fn update(&mut self) {
        self.frames_left = self.frames_left.saturating_sub(1);
    }

    /// Animation progress in 0..=1
    pub fn progress(&self) -> f32 {
        1.0 - self.frames_left as f32 / EXPLOSION_FRAMES as f32
    }
}
