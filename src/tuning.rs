//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives here so a run can be
//! re-balanced (or pinned down in tests) without touching the tick code.
//! Per-frame rates are per simulation tick; durations are in ticks.

use serde::{Deserialize, Serialize};

/// Balance constants for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Road ===
    /// Number of lanes (lanes are indexed 0..lane_count)
    pub lane_count: u8,
    /// Distance between lane centers
    pub lane_width: f32,
    /// Length after which the road scroll offset wraps
    pub road_segment_length: f32,

    // === Player ===
    /// Resting height of the bike above the road
    pub ground_height: f32,
    /// Fraction of the remaining lane offset closed each tick
    pub lane_ease: f32,
    /// Lean per unit of remaining lane offset (radians)
    pub bank_factor: f32,
    /// Maximum lean (radians)
    pub max_bank: f32,
    /// Peak height of the jump arc above ground
    pub jump_height: f32,
    /// Length of a jump
    pub jump_duration_ticks: u32,
    /// Jumps are refused while the bike is more than this above ground
    pub jump_grace_height: f32,
    pub starting_lives: u8,
    pub max_lives: u8,

    // === Speed & score ===
    /// Scroll speed at the start of a run (world units per tick)
    pub start_speed: f32,
    /// Base speed gained each tick
    pub speed_ramp: f32,
    /// Ramp stops once the base speed reaches this
    pub max_ramp_speed: f32,
    /// Score per tick is floor(speed * score_factor)
    pub score_factor: f32,
    /// Score needed per level
    pub level_score_step: u64,
    /// Permanent base speed multiplier applied on level-up
    pub level_speed_factor: f32,

    // === Spawning ===
    pub obstacle_chance: f64,
    pub powerup_chance: f64,
    pub coin_chance: f64,
    /// Z where new entities appear (beyond the visible horizon)
    pub spawn_distance: f32,
    /// A lane is skipped while an entity in it is closer than this to the spawn point
    pub min_spawn_gap: f32,
    /// Entities further than this behind the player are recycled
    pub despawn_distance: f32,

    // === Collision ===
    pub collision_z: f32,
    pub collision_x: f32,

    // === Power-ups & hazards ===
    pub boost_factor: f32,
    pub boost_ticks: u32,
    pub invincibility_ticks: u32,
    pub puddle_slow_factor: f32,
    pub puddle_ticks: u32,

    // === Coins & combo ===
    pub coin_value: u64,
    /// Coins closer together than this keep the combo going
    pub combo_window_ticks: u64,
    pub combo_step: u32,
    pub combo_max: u32,

    // === Particles ===
    /// Particles per burst
    pub particle_burst: usize,
    /// Life lost per tick (particles start at 1.0)
    pub particle_decay: f32,
    /// Ticks between speed-line bursts while boosted
    pub speed_line_interval: u64,
    /// Pool capacity per entity category
    pub entity_pool_capacity: usize,
    /// Power-ups are rare, so their free list is kept short
    pub powerup_pool_capacity: usize,
    /// Pool capacity per particle kind
    pub particle_pool_capacity: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lane_count: 3,
            lane_width: 1.5,
            road_segment_length: 100.0,

            ground_height: 0.4,
            lane_ease: 0.1,
            bank_factor: 0.6,
            max_bank: 0.35,
            jump_height: 1.6,
            jump_duration_ticks: 32,
            jump_grace_height: 0.01,
            starting_lives: 3,
            max_lives: 5,

            start_speed: 0.5,
            speed_ramp: 0.0002,
            max_ramp_speed: 2.0,
            score_factor: 10.0,
            level_score_step: 5000,
            level_speed_factor: 1.1,

            obstacle_chance: 0.02,
            powerup_chance: 0.005,
            coin_chance: 0.03,
            spawn_distance: 120.0,
            min_spawn_gap: 8.0,
            despawn_distance: 5.0,

            collision_z: 1.0,
            collision_x: 0.8,

            boost_factor: 1.5,
            boost_ticks: 5 * 60,
            invincibility_ticks: 5 * 60,
            puddle_slow_factor: 0.6,
            puddle_ticks: 2 * 60,

            coin_value: 50,
            combo_window_ticks: 2 * 60,
            combo_step: 1,
            combo_max: 5,

            particle_burst: 20,
            particle_decay: 0.02,
            speed_line_interval: 4,
            entity_pool_capacity: 32,
            powerup_pool_capacity: 8,
            particle_pool_capacity: 256,
        }
    }
}

impl Tuning {
    /// Parse a tuning file; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Highest valid lane index
    pub fn max_lane(&self) -> u8 {
        self.lane_count.saturating_sub(1)
    }

    /// Lane the bike starts in (middle of the road)
    pub fn center_lane(&self) -> u8 {
        self.max_lane() / 2
    }

    /// World x of a lane center, with the middle lane at x = 0
    pub fn lane_x(&self, lane: u8) -> f32 {
        (lane as f32 - self.max_lane() as f32 / 2.0) * self.lane_width
    }

    /// Tuning with no randomness-driven spawns and a flat speed curve
    pub fn calm() -> Self {
        Self {
            obstacle_chance: 0.0,
            powerup_chance: 0.0,
            coin_chance: 0.0,
            speed_ramp: 0.0,
            ..Self::default()
        }
    }
}
