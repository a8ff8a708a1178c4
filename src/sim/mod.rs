//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per simulation step, no wall-clock reads
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod particles;
pub mod player;
pub mod pool;
pub mod progression;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{CollisionReport, overlaps, resolve_collisions};
pub use particles::{Particle, ParticleKind};
pub use player::LaneShift;
pub use pool::{Pool, PoolStats, Poolable};
pub use state::{
    Achievement, ActiveEffects, AudioCue, Entity, EntityCategory, EntityKind, GameEvent,
    GamePhase, GameSession, GameState, HudSnapshot, ObstacleKind, Player, PowerUpKind,
};
pub use tick::{Command, TickInput, tick};
