//! Pooled visual particles
//!
//! Bursts of points scattered around an origin that fade out linearly.
//! Purely cosmetic: nothing here feeds back into gameplay.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::Poolable;
use super::state::GameState;

/// Particle flavours (also the pool key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Streaks behind the bike while boosted
    SpeedLine,
    /// Pickup glitter
    Sparkle,
    /// Crash fragments
    Debris,
}

impl ParticleKind {
    /// Half-width of the cube the burst is scattered in
    fn spread(&self) -> f32 {
        match self {
            ParticleKind::SpeedLine => 0.25,
            ParticleKind::Sparkle => 0.4,
            ParticleKind::Debris => 0.5,
        }
    }

    fn launch_speed(&self) -> f32 {
        match self {
            ParticleKind::SpeedLine => 0.0,
            ParticleKind::Sparkle => 0.03,
            ParticleKind::Debris => 0.08,
        }
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec3,
    pub vel: Vec3,
    /// 1.0 when spawned, removed at 0 (renderers use it as opacity)
    pub life: f32,
}

impl Particle {
    pub fn blank(kind: ParticleKind) -> Self {
        Self {
            kind,
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            life: 0.0,
        }
    }
}

impl Poolable for Particle {
    fn recycle(&mut self) {
        self.pos = Vec3::ZERO;
        self.vel = Vec3::ZERO;
        self.life = 0.0;
    }
}

/// Scatter a burst of particles around `origin`
pub fn emit_burst(state: &mut GameState, kind: ParticleKind, origin: Vec3) {
    let spread = kind.spread();
    let speed = kind.launch_speed();
    for _ in 0..state.tuning.particle_burst {
        let mut particle = state.particle_pool.acquire(kind);
        let offset = Vec3::new(
            state.rng.random_range(-spread..=spread),
            state.rng.random_range(-spread..=spread),
            state.rng.random_range(-spread..=spread),
        );
        particle.pos = origin + offset;
        particle.vel = offset.normalize_or_zero() * speed;
        particle.life = 1.0;
        state.particles.push(particle);
    }
}

/// Age and move particles; dead ones go back to the pool
pub fn update_particles(state: &mut GameState) {
    let decay = state.tuning.particle_decay;
    let scroll = state.session.speed;
    for particle in state.particles.iter_mut() {
        particle.pos += particle.vel;
        // Particles are left behind on the road like everything else
        particle.pos.z -= scroll;
        particle.life -= decay;
    }

    let (alive, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut state.particles)
        .into_iter()
        .partition(|p| p.life > 0.0);
    state.particles = alive;
    for particle in dead {
        let kind = particle.kind;
        state.particle_pool.release(particle, kind);
    }
}
