//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, every timer counts frames
//! - Seeded RNG only
//! - Stable iteration order (insertion order of every collection)
//! - No rendering or platform dependencies

pub mod combat;
pub mod entity;
pub mod geometry;
pub mod hold;
pub mod level;
pub mod player;
pub mod pool;
pub mod progression;
pub mod spawn;
pub mod state;
pub mod tick;

pub use combat::{resolve, CombatReport};
pub use entity::{
    Capabilities, Collectible, CollectibleKind, Collidable, Damageable, Enemy, EntityId,
    Explosion, Family, Hazard, HazardKind, Projectile, ProjectileKind, SpawnsProjectiles,
};
pub use geometry::Aabb;
pub use hold::{HoldAction, HoldKind, HoldState};
pub use level::{LevelGenerator, LevelLayout, StandardLevelGenerator};
pub use player::Player;
pub use pool::Pool;
pub use progression::{PowerUps, Progression};
pub use spawn::SpawnScheduler;
pub use state::{GameSession, PlayOutcome};
pub use tick::{demo_input, tick, TickContext, TickInput};
