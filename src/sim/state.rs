//! Game state and core simulation types
//!
//! Everything a run mutates lives in [`GameState`]; the tick borrows it
//! mutably and hands pieces of it to the individual systems.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::particles::{Particle, ParticleKind};
use super::pool::{Pool, Poolable};
use crate::tuning::Tuning;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for start
    #[default]
    Menu,
    /// Active ride
    Playing,
    /// Frozen; timers do not advance
    Paused,
    /// Out of lives
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Menu => "Menu",
            GamePhase::Playing => "Playing",
            GamePhase::Paused => "Paused",
            GamePhase::GameOver => "GameOver",
        }
    }
}

/// Things on the road that hurt (or slow) the rider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Barrier,
    Cone,
    Car,
    /// Slows the bike down instead of costing a life
    Puddle,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 4] = [
        ObstacleKind::Barrier,
        ObstacleKind::Cone,
        ObstacleKind::Car,
        ObstacleKind::Puddle,
    ];

    /// Whether hitting this costs a life
    pub fn is_hazard(&self) -> bool {
        !matches!(self, ObstacleKind::Puddle)
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    SpeedBoost,
    Invincibility,
    ExtraLife,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::Invincibility,
        PowerUpKind::ExtraLife,
    ];
}

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle(ObstacleKind),
    PowerUp(PowerUpKind),
    Coin,
}

impl EntityKind {
    pub fn category(&self) -> EntityCategory {
        match self {
            EntityKind::Obstacle(_) => EntityCategory::Obstacle,
            EntityKind::PowerUp(_) => EntityCategory::PowerUp,
            EntityKind::Coin => EntityCategory::Coin,
        }
    }
}

/// Pool key for entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    Obstacle,
    PowerUp,
    Coin,
}

/// Something scrolling down the road toward the rider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub lane: u8,
    /// Distance ahead of the rider (negative once passed)
    pub z: f32,
    pub active: bool,
}

impl Entity {
    /// Blank entity for the pool factory
    pub fn blank(category: EntityCategory) -> Self {
        let kind = match category {
            EntityCategory::Obstacle => EntityKind::Obstacle(ObstacleKind::Barrier),
            EntityCategory::PowerUp => EntityKind::PowerUp(PowerUpKind::SpeedBoost),
            EntityCategory::Coin => EntityKind::Coin,
        };
        Self {
            id: 0,
            kind,
            lane: 0,
            z: 0.0,
            active: false,
        }
    }
}

impl Poolable for Entity {
    fn recycle(&mut self) {
        self.id = 0;
        self.active = false;
    }
}

/// The rider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Vertical speed from the last tick (for renderers that squash/stretch)
    pub vertical_velocity: f32,
    pub is_jumping: bool,
    pub is_invincible: bool,
    pub lives: u8,
    /// Lean into lane changes (radians, positive leans left)
    pub bank: f32,
    /// Ticks elapsed in the current jump
    pub jump_ticks: u32,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: tuning.lane_x(tuning.center_lane()),
            y: tuning.ground_height,
            z: 0.0,
            vertical_velocity: 0.0,
            is_jumping: false,
            is_invincible: false,
            lives: tuning.starting_lives,
            bank: 0.0,
            jump_ticks: 0,
        }
    }
}

/// Time-bounded effects, counted in Playing ticks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub boost_ticks: u32,
    pub slow_ticks: u32,
    pub invincible_ticks: u32,
}

/// One-shot accomplishments, unlocked at most once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Achievement {
    /// Picked up a coin
    FirstCoin,
    /// Combo multiplier hit its cap
    ComboMaster,
    /// Reached level 5
    SpeedDemon,
    /// 25 jumps in one run
    HighFlyer,
    /// A full minute without losing a life
    Survivor,
}

impl Achievement {
    pub fn title(&self) -> &'static str {
        match self {
            Achievement::FirstCoin => "First Coin",
            Achievement::ComboMaster => "Combo Master",
            Achievement::SpeedDemon => "Speed Demon",
            Achievement::HighFlyer => "High Flyer",
            Achievement::Survivor => "Survivor",
        }
    }
}

/// Score, speed and progress for the current run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub phase: GamePhase,
    pub score: u64,
    /// Best score seen this page load (survives restarts)
    pub high_score: u64,
    pub combo_multiplier: u32,
    /// 1-based
    pub level: u32,
    /// Effective scroll speed this tick
    pub speed: f32,
    /// Speed without transient effects; only the ramp and level-ups change it
    pub base_speed: f32,
    /// Target lane
    pub lane: u8,
    /// Tick of the last coin pickup
    pub last_coin_tick: Option<u64>,
    pub coins: u32,
    pub jumps: u32,
    pub distance: f32,
    /// Playing ticks since the last life lost
    pub ticks_since_hit: u64,
    pub achievements: Vec<Achievement>,
}

impl GameSession {
    pub fn new(tuning: &Tuning, high_score: u64) -> Self {
        Self {
            phase: GamePhase::Menu,
            score: 0,
            high_score,
            combo_multiplier: 1,
            level: 1,
            speed: tuning.start_speed,
            base_speed: tuning.start_speed,
            lane: tuning.center_lane(),
            last_coin_tick: None,
            coins: 0,
            jumps: 0,
            distance: 0.0,
            ticks_since_hit: 0,
            achievements: Vec::new(),
        }
    }

    pub fn has_achievement(&self, achievement: Achievement) -> bool {
        self.achievements.contains(&achievement)
    }
}

/// Named sound cues for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    Jump,
    Crash,
    PowerUp,
    Coin,
    LevelUp,
    GameOver,
    HighScore,
}

impl AudioCue {
    pub fn name(&self) -> &'static str {
        match self {
            AudioCue::Jump => "jump",
            AudioCue::Crash => "crash",
            AudioCue::PowerUp => "powerup",
            AudioCue::Coin => "coin",
            AudioCue::LevelUp => "levelup",
            AudioCue::GameOver => "gameover",
            AudioCue::HighScore => "highscore",
        }
    }
}

/// Things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    Jump,
    Landed,
    LaneChanged { lane: u8 },
    Crash { kind: ObstacleKind, lives: u8 },
    /// Rode through a puddle
    Splash,
    PowerUp { kind: PowerUpKind },
    EffectExpired { kind: PowerUpKind },
    Coin { points: u64, multiplier: u32 },
    LevelUp { level: u32 },
    Achievement { achievement: Achievement },
    /// Out of lives
    GameOver {
        score: u64,
        level: u32,
        distance: f32,
        new_high_score: bool,
    },
    /// Left a paused run through restart or the menu
    RunAbandoned {
        score: u64,
        level: u32,
        distance: f32,
        new_high_score: bool,
    },
}

impl GameEvent {
    /// Sound to play for this event, if any
    pub fn cue(&self) -> Option<AudioCue> {
        match self {
            GameEvent::Jump => Some(AudioCue::Jump),
            GameEvent::Crash { .. } | GameEvent::Splash => Some(AudioCue::Crash),
            GameEvent::PowerUp { .. } | GameEvent::Achievement { .. } => Some(AudioCue::PowerUp),
            GameEvent::Coin { .. } => Some(AudioCue::Coin),
            GameEvent::LevelUp { .. } => Some(AudioCue::LevelUp),
            GameEvent::GameOver {
                new_high_score: true,
                ..
            } => Some(AudioCue::HighScore),
            GameEvent::GameOver { .. } => Some(AudioCue::GameOver),
            _ => None,
        }
    }
}

/// Read-only view for the HUD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub high_score: u64,
    pub lives: u8,
    pub combo: u32,
    pub level: u32,
    pub speed: f32,
    pub distance: f32,
    pub boosted: bool,
    pub invincible: bool,
    pub overlay: Option<&'static str>,
}

/// Complete game state
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub session: GameSession,
    pub player: Player,
    /// Active entities in spawn order
    pub entities: Vec<Entity>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub effects: ActiveEffects,
    /// Road texture scroll, wraps at `tuning.road_segment_length`
    pub road_offset: f32,
    /// Playing ticks in the current run
    pub time_ticks: u64,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
    pub(crate) entity_pool: Pool<EntityCategory, Entity>,
    pub(crate) particle_pool: Pool<ParticleKind, Particle>,
    next_id: u32,
}

impl GameState {
    /// Create a new game (in the menu) with the given seed
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let entity_pool = Pool::new(Entity::blank, tuning.entity_pool_capacity)
            .with_capacity(EntityCategory::PowerUp, tuning.powerup_pool_capacity);
        let mut particle_pool = Pool::new(Particle::blank, tuning.particle_pool_capacity);
        particle_pool.prewarm(ParticleKind::SpeedLine, tuning.particle_burst);

        Self {
            seed,
            session: GameSession::new(&tuning, 0),
            player: Player::new(&tuning),
            entities: Vec::new(),
            particles: Vec::new(),
            effects: ActiveEffects::default(),
            road_offset: 0.0,
            time_ticks: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            entity_pool,
            particle_pool,
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Put a new entity on the road
    pub fn spawn_entity(&mut self, kind: EntityKind, lane: u8, z: f32) -> u32 {
        let id = self.next_entity_id();
        let mut entity = self.entity_pool.acquire(kind.category());
        entity.id = id;
        entity.kind = kind;
        entity.lane = lane.min(self.tuning.max_lane());
        entity.z = z;
        entity.active = true;
        self.entities.push(entity);
        id
    }

    /// Drop inactive entities from the road and hand them back to the pool
    pub fn recycle_inactive(&mut self) {
        let (live, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entities)
            .into_iter()
            .partition(|e| e.active);
        self.entities = live;
        for entity in dead {
            let category = entity.kind.category();
            self.entity_pool.release(entity, category);
        }
    }

    /// Wipe the run and start over with a fresh seed; the high score is kept
    pub fn reset_run(&mut self, seed: u64) {
        self.recycle_all();
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        let phase = self.session.phase;
        self.session = GameSession::new(&self.tuning, self.session.high_score);
        self.session.phase = phase;
        self.player = Player::new(&self.tuning);
        self.effects = ActiveEffects::default();
        self.road_offset = 0.0;
        self.time_ticks = 0;
        self.next_id = 1;
    }

    fn recycle_all(&mut self) {
        for entity in &mut self.entities {
            entity.active = false;
        }
        self.recycle_inactive();
        for particle in std::mem::take(&mut self.particles) {
            let kind = particle.kind;
            self.particle_pool.release(particle, kind);
        }
    }

    /// Change phase, recording the transition
    pub fn set_phase(&mut self, to: GamePhase) {
        let from = self.session.phase;
        if from == to {
            return;
        }
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());
        self.session.phase = to;
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn entity_pool_stats(&self) -> super::pool::PoolStats {
        self.entity_pool.stats()
    }

    pub fn snapshot(&self) -> HudSnapshot {
        let overlay = match self.session.phase {
            GamePhase::Menu => Some("NIGHT RIDER - Press SPACE to start"),
            GamePhase::Paused => Some("PAUSED - Press ESC to resume"),
            GamePhase::GameOver => Some("GAME OVER - Press ENTER to ride again"),
            GamePhase::Playing => None,
        };
        HudSnapshot {
            phase: self.session.phase,
            score: self.session.score,
            high_score: self.session.high_score,
            lives: self.player.lives,
            combo: self.session.combo_multiplier,
            level: self.session.level,
            speed: self.session.speed,
            distance: self.session.distance,
            boosted: self.effects.boost_ticks > 0,
            invincible: self.player.is_invincible,
            overlay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_in_menu() {
        let state = GameState::new(7);
        assert_eq!(state.session.phase, GamePhase::Menu);
        assert_eq!(state.player.lives, 3);
        assert_eq!(state.session.lane, 1);
        assert_eq!(state.session.combo_multiplier, 1);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_spawned_entities_recycle_through_pool() {
        let mut state = GameState::new(7);
        let id = state.spawn_entity(EntityKind::Coin, 9, 50.0);
        assert_eq!(state.entities[0].id, id);
        assert_eq!(state.entities[0].lane, 2, "lane is clamped");

        state.entities[0].active = false;
        state.recycle_inactive();
        assert!(state.entities.is_empty());
        assert_eq!(state.entity_pool.free_count(EntityCategory::Coin), 1);

        state.spawn_entity(EntityKind::Coin, 0, 50.0);
        assert_eq!(state.entity_pool_stats().reused, 1);
    }

    #[test]
    fn test_entity_pool_capacity_per_category() {
        let tuning = Tuning {
            entity_pool_capacity: 6,
            powerup_pool_capacity: 2,
            ..Tuning::default()
        };
        let mut state = GameState::with_tuning(7, tuning);
        assert_eq!(state.entity_pool.capacity(EntityCategory::Coin), 6);
        assert_eq!(state.entity_pool.capacity(EntityCategory::PowerUp), 2);

        for lane in 0..3 {
            state.spawn_entity(EntityKind::PowerUp(PowerUpKind::ExtraLife), lane, 10.0);
            state.spawn_entity(EntityKind::Coin, lane, 20.0);
        }
        for entity in &mut state.entities {
            entity.active = false;
        }
        state.recycle_inactive();
        assert_eq!(state.entity_pool.free_count(EntityCategory::PowerUp), 2);
        assert_eq!(state.entity_pool.free_count(EntityCategory::Coin), 3);
        assert_eq!(state.entity_pool_stats().discarded, 1);
    }

    #[test]
    fn test_reset_keeps_high_score() {
        let mut state = GameState::new(7);
        state.session.score = 900;
        state.session.high_score = 1200;
        state.player.lives = 1;
        state.spawn_entity(EntityKind::Coin, 1, 20.0);
        state.reset_run(8);
        assert_eq!(state.session.score, 0);
        assert_eq!(state.session.high_score, 1200);
        assert_eq!(state.player.lives, 3);
        assert!(state.entities.is_empty());
        assert_eq!(state.seed, 8);
    }

    #[test]
    fn test_event_cues() {
        assert_eq!(GameEvent::Jump.cue(), Some(AudioCue::Jump));
        assert_eq!(GameEvent::Landed.cue(), None);
        let over = GameEvent::GameOver {
            score: 10,
            level: 1,
            distance: 20.0,
            new_high_score: true,
        };
        assert_eq!(over.cue().map(|c| c.name()), Some("highscore"));
        let quit = GameEvent::RunAbandoned {
            score: 10,
            level: 1,
            distance: 20.0,
            new_high_score: true,
        };
        assert_eq!(quit.cue(), None);
    }

    #[test]
    fn test_snapshot_overlay_follows_phase() {
        let mut state = GameState::new(1);
        assert!(state.snapshot().overlay.is_some());
        state.set_phase(GamePhase::Playing);
        assert_eq!(state.snapshot().overlay, None);
        let json = serde_json::to_string(&state.snapshot()).unwrap();
        assert!(json.contains("\"phase\":\"Playing\""));
    }
}
