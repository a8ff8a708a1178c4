//! Per-frame simulation tick
//!
//! Drives the phase machine (Menu → Playing → Paused/GameOver) and, while
//! Playing, runs the systems in a fixed order: progression, spawner,
//! scroll, collisions, rider kinematics, particles.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::resolve_collisions;
use super::particles::{ParticleKind, emit_burst, update_particles};
use super::player::{LaneShift, shift_lane, try_jump, update_player};
use super::progression;
use super::spawner::spawn;
use super::state::{EntityKind, GameEvent, GamePhase, GameState};

/// Discrete player commands, as delivered by the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    LaneLeft,
    LaneRight,
    Jump,
    Pause,
    Resume,
    Start,
    Restart,
    Menu,
}

/// Input commands for a single tick
///
/// Commands arriving between ticks are folded in here; a later lane command
/// replaces an earlier one.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub lane_shift: Option<LaneShift>,
    pub jump: bool,
    /// Toggles Playing/Paused
    pub pause: bool,
    pub resume: bool,
    pub start: bool,
    pub restart: bool,
    /// Back to the title screen from Paused or GameOver
    pub menu: bool,
    /// Seed for the next run (drawn from the current RNG when absent)
    pub seed: Option<u64>,
    /// Idle/demo mode - AI rides the bike
    pub autopilot: bool,
}

impl TickInput {
    pub fn push(&mut self, command: Command) {
        match command {
            Command::LaneLeft => self.lane_shift = Some(LaneShift::Left),
            Command::LaneRight => self.lane_shift = Some(LaneShift::Right),
            Command::Jump => self.jump = true,
            Command::Pause => self.pause = true,
            Command::Resume => self.resume = true,
            Command::Start => self.start = true,
            Command::Restart => self.restart = true,
            Command::Menu => self.menu = true,
        }
    }

    /// Drop one-shot commands, keeping persistent modes
    pub fn clear_commands(&mut self) {
        *self = Self {
            autopilot: self.autopilot,
            ..Self::default()
        };
    }
}

/// Advance the game by one tick
pub fn tick(state: &mut GameState, input: &TickInput) {
    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    if !handle_phase_commands(state, &input) {
        return;
    }

    if let Some(shift) = input.lane_shift {
        let lane = shift_lane(state.session.lane, shift, &state.tuning);
        if lane != state.session.lane {
            state.session.lane = lane;
            state.emit(GameEvent::LaneChanged { lane });
        }
    }
    if input.jump && try_jump(&mut state.player, &state.tuning) {
        progression::record_jump(state);
        state.emit(GameEvent::Jump);
    }

    progression::advance(state);
    spawn(state);
    scroll(state);

    resolve_collisions(state);
    if state.session.phase != GamePhase::Playing {
        return;
    }

    let lane = state.session.lane;
    if update_player(&mut state.player, lane, &state.tuning) {
        state.emit(GameEvent::Landed);
    }

    let interval = state.tuning.speed_line_interval.max(1);
    if state.effects.boost_ticks > 0 && state.time_ticks % interval == 0 {
        let tail = Vec3::new(state.player.x, state.player.y, state.player.z - 1.0);
        emit_burst(state, ParticleKind::SpeedLine, tail);
    }
    update_particles(state);
}

/// Apply phase transitions. Returns true if this tick should simulate.
fn handle_phase_commands(state: &mut GameState, input: &TickInput) -> bool {
    match state.session.phase {
        GamePhase::Menu => {
            if input.start {
                begin_run(state, input.seed);
            }
            false
        }
        GamePhase::Playing => {
            if input.pause {
                state.set_phase(GamePhase::Paused);
                return false;
            }
            true
        }
        GamePhase::Paused => {
            // Resuming wins over leaving when both arrive in one frame
            if input.resume || input.pause {
                state.set_phase(GamePhase::Playing);
            } else if input.restart {
                abandon_run(state);
                begin_run(state, input.seed);
            } else if input.menu {
                abandon_run(state);
                return_to_menu(state);
            }
            false
        }
        GamePhase::GameOver => {
            if input.restart || input.start {
                begin_run(state, input.seed);
            } else if input.menu {
                return_to_menu(state);
            }
            false
        }
    }
}

/// Reset everything except the high score and start riding
pub fn begin_run(state: &mut GameState, seed: Option<u64>) {
    let seed = seed.unwrap_or_else(|| state.rng.random());
    state.reset_run(seed);
    log::info!("New run with seed {}", seed);
    state.set_phase(GamePhase::Playing);
}

/// Back to the title screen. The run's score must already be settled.
fn return_to_menu(state: &mut GameState) {
    let seed = state.rng.random();
    state.reset_run(seed);
    state.set_phase(GamePhase::Menu);
}

/// Quitting a paused run counts like a crash-out for the high score:
/// settle it before the reset and report the run so it can be recorded.
fn abandon_run(state: &mut GameState) {
    let session = &mut state.session;
    let score = session.score;
    let new_high_score = progression::settle_high_score(session);
    let (level, distance) = (session.level, session.distance);
    log::info!("Abandoned run: score {}, level {}", score, level);
    state.emit(GameEvent::RunAbandoned {
        score,
        level,
        distance,
        new_high_score,
    });
}

/// Out of lives: settle the high score (before anything is reset) and stop
pub fn end_run(state: &mut GameState) {
    let score = state.session.score;
    let new_high_score = progression::settle_high_score(&mut state.session);
    let (level, distance) = (state.session.level, state.session.distance);
    log::info!(
        "Game over: score {}, level {}, {} coins{}",
        score,
        state.session.level,
        state.session.coins,
        if new_high_score { " (new high score)" } else { "" }
    );
    state.set_phase(GamePhase::GameOver);
    state.emit(GameEvent::GameOver {
        score,
        level,
        distance,
        new_high_score,
    });
}

/// Move the road and everything on it toward the rider
fn scroll(state: &mut GameState) {
    let speed = state.session.speed;
    for entity in state.entities.iter_mut().filter(|e| e.active) {
        entity.z -= speed;
    }
    let segment = state.tuning.road_segment_length;
    if segment > 0.0 {
        state.road_offset = (state.road_offset + speed) % segment;
    }
}

/// Demo rider: dodge what's ahead, jump when boxed in, chase pickups
fn autopilot(state: &GameState, input: &mut TickInput) {
    match state.session.phase {
        GamePhase::Menu => {
            input.start = true;
            return;
        }
        GamePhase::Playing => {}
        _ => return,
    }

    let tuning = &state.tuning;
    let speed = state.session.speed.max(0.01);
    let lookahead = speed * 30.0 + tuning.collision_z * 2.0;
    let lane = state.session.lane;

    let nearest_hazard = |l: u8| {
        state
            .entities
            .iter()
            .filter(|e| e.active && e.lane == l && e.z > 0.0 && e.z < lookahead)
            .filter(|e| matches!(e.kind, EntityKind::Obstacle(_)))
            .map(|e| e.z)
            .fold(None, |acc: Option<f32>, z| Some(acc.map_or(z, |a| a.min(z))))
    };

    let neighbours = [
        (LaneShift::Left, shift_lane(lane, LaneShift::Left, tuning)),
        (LaneShift::Right, shift_lane(lane, LaneShift::Right, tuning)),
    ];

    if let Some(z) = nearest_hazard(lane) {
        if let Some((shift, _)) = neighbours
            .iter()
            .find(|(_, l)| *l != lane && nearest_hazard(*l).is_none())
        {
            input.lane_shift = Some(*shift);
        } else if z < speed * (tuning.jump_duration_ticks as f32 / 2.0) + tuning.collision_z {
            input.jump = true;
        }
        return;
    }

    // Nothing to dodge: drift toward the closest pickup in a safe lane
    let pickup = state
        .entities
        .iter()
        .filter(|e| e.active && e.z > 0.0 && e.z < lookahead)
        .filter(|e| !matches!(e.kind, EntityKind::Obstacle(_)))
        .filter(|e| nearest_hazard(e.lane).is_none())
        .min_by(|a, b| a.z.partial_cmp(&b.z).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(target) = pickup {
        input.lane_shift = match target.lane.cmp(&lane) {
            std::cmp::Ordering::Less => Some(LaneShift::Left),
            std::cmp::Ordering::Greater => Some(LaneShift::Right),
            std::cmp::Ordering::Equal => None,
        };
    }
}
