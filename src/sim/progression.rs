//! Score, combo, speed and level progression
//!
//! Speed is always derived: `speed = base_speed * active effect factors`.
//! Effects never write to `base_speed`, so when the last one runs out the
//! speed falls back to exactly the baseline no matter how often boosts were
//! stacked.

use super::state::{
    Achievement, ActiveEffects, GameEvent, GameSession, GameState, PowerUpKind,
};
use crate::tuning::Tuning;

/// A full minute (at 60 Hz) without losing a life
const SURVIVOR_TICKS: u64 = 60 * 60;
const HIGH_FLYER_JUMPS: u32 = 25;
const SPEED_DEMON_LEVEL: u32 = 5;

/// Advance score, speed and timers by one Playing tick
pub fn advance(state: &mut GameState) {
    state.time_ticks += 1;
    state.session.ticks_since_hit += 1;

    let session = &mut state.session;
    let tuning = &state.tuning;
    if session.base_speed < tuning.max_ramp_speed {
        session.base_speed = (session.base_speed + tuning.speed_ramp).min(tuning.max_ramp_speed);
    }

    tick_effects(state);
    recompute_speed(state);

    let speed = state.session.speed;
    state.session.score += (speed * state.tuning.score_factor).floor() as u64;
    state.session.distance += speed;

    check_level_up(state);

    if state.session.ticks_since_hit >= SURVIVOR_TICKS {
        unlock(state, Achievement::Survivor);
    }
}

/// Count effect timers down, announcing the ones that run out
fn tick_effects(state: &mut GameState) {
    let effects = &mut state.effects;
    let mut expired = Vec::new();
    if countdown(&mut effects.boost_ticks) {
        expired.push(PowerUpKind::SpeedBoost);
    }
    if countdown(&mut effects.invincible_ticks) {
        expired.push(PowerUpKind::Invincibility);
    }
    // Puddle slowdowns end silently
    countdown(&mut effects.slow_ticks);

    state.player.is_invincible = state.effects.invincible_ticks > 0;
    for kind in expired {
        log::debug!("{:?} wore off", kind);
        state.emit(GameEvent::EffectExpired { kind });
    }
}

/// Decrement a timer; true on the tick it reaches zero
fn countdown(ticks: &mut u32) -> bool {
    if *ticks == 0 {
        return false;
    }
    *ticks -= 1;
    *ticks == 0
}

/// Effective speed from the baseline and whatever effects are running
pub fn effective_speed(session: &GameSession, effects: &ActiveEffects, tuning: &Tuning) -> f32 {
    let mut speed = session.base_speed;
    if effects.boost_ticks > 0 {
        speed *= tuning.boost_factor;
    }
    if effects.slow_ticks > 0 {
        speed *= tuning.puddle_slow_factor;
    }
    speed
}

pub fn recompute_speed(state: &mut GameState) {
    state.session.speed = effective_speed(&state.session, &state.effects, &state.tuning);
}

/// Start or extend the speed boost (stacking extends, never compounds)
pub fn apply_boost(state: &mut GameState) {
    state.effects.boost_ticks = state.effects.boost_ticks.max(state.tuning.boost_ticks);
    recompute_speed(state);
}

/// Start or extend invincibility
pub fn apply_invincibility(state: &mut GameState) {
    state.effects.invincible_ticks = state
        .effects
        .invincible_ticks
        .max(state.tuning.invincibility_ticks);
    state.player.is_invincible = true;
}

/// Puddle slowdown
pub fn apply_slow(state: &mut GameState) {
    state.effects.slow_ticks = state.effects.slow_ticks.max(state.tuning.puddle_ticks);
    recompute_speed(state);
}

/// Extra life, up to the cap
pub fn apply_extra_life(state: &mut GameState) {
    state.player.lives = (state.player.lives + 1).min(state.tuning.max_lives);
}

/// Score a coin and update the combo. Returns the points awarded.
pub fn collect_coin(state: &mut GameState) -> u64 {
    let now = state.time_ticks;
    let tuning = &state.tuning;
    let session = &mut state.session;

    session.combo_multiplier = match session.last_coin_tick {
        Some(prev) if now.saturating_sub(prev) <= tuning.combo_window_ticks => {
            (session.combo_multiplier + tuning.combo_step).min(tuning.combo_max)
        }
        _ => 1,
    };
    session.last_coin_tick = Some(now);
    session.coins += 1;

    let multiplier = session.combo_multiplier;
    let points = tuning.coin_value * multiplier as u64;
    session.score += points;
    let maxed = multiplier >= tuning.combo_max;

    state.emit(GameEvent::Coin { points, multiplier });
    unlock(state, Achievement::FirstCoin);
    if maxed {
        unlock(state, Achievement::ComboMaster);
    }
    check_level_up(state);
    points
}

/// Count a jump toward the jump achievement
pub fn record_jump(state: &mut GameState) {
    state.session.jumps += 1;
    if state.session.jumps >= HIGH_FLYER_JUMPS {
        unlock(state, Achievement::HighFlyer);
    }
}

/// Level up for every threshold the score has crossed
pub fn check_level_up(state: &mut GameState) {
    let step = state.tuning.level_score_step;
    if step == 0 {
        return;
    }
    while state.session.score >= state.session.level as u64 * step {
        state.session.level += 1;
        state.session.base_speed *= state.tuning.level_speed_factor;
        let level = state.session.level;
        log::info!("Level {} (base speed {:.3})", level, state.session.base_speed);
        state.emit(GameEvent::LevelUp { level });
        if level >= SPEED_DEMON_LEVEL {
            unlock(state, Achievement::SpeedDemon);
        }
    }
    recompute_speed(state);
}

/// Unlock an achievement once per run
pub fn unlock(state: &mut GameState, achievement: Achievement) {
    if state.session.has_achievement(achievement) {
        return;
    }
    log::info!("Achievement unlocked: {}", achievement.title());
    state.session.achievements.push(achievement);
    state.emit(GameEvent::Achievement { achievement });
}

/// Record the final score against the high score. Returns true on a new best.
pub fn settle_high_score(session: &mut GameSession) -> bool {
    if session.score > session.high_score {
        session.high_score = session.score;
        true
    } else {
        false
    }
}
