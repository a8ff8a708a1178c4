//! Rider kinematics: lane changes, jump arc and banking
//!
//! The horizontal motion is a smoothing heuristic (close a fixed fraction of
//! the gap each tick), not physics. The jump is a fixed-length half sine.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::state::Player;
use crate::tuning::Tuning;

/// Direction of a lane change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneShift {
    Left,
    Right,
}

/// Clamp an arbitrary lane request to the road
pub fn clamp_lane(requested: i32, tuning: &Tuning) -> u8 {
    requested.clamp(0, tuning.max_lane() as i32) as u8
}

/// Lane after applying a shift; stays put at the road edges
pub fn shift_lane(lane: u8, shift: LaneShift, tuning: &Tuning) -> u8 {
    let delta = match shift {
        LaneShift::Left => -1,
        LaneShift::Right => 1,
    };
    clamp_lane(lane as i32 + delta, tuning)
}

/// Height above ground `ticks` into a jump
pub fn jump_height(ticks: u32, tuning: &Tuning) -> f32 {
    if ticks >= tuning.jump_duration_ticks {
        return 0.0;
    }
    let t = ticks as f32 / tuning.jump_duration_ticks as f32;
    (PI * t).sin() * tuning.jump_height
}

/// Whether the rider is clear of the road
pub fn is_airborne(player: &Player, tuning: &Tuning) -> bool {
    player.is_jumping || player.y > tuning.ground_height + tuning.jump_grace_height
}

/// Start a jump. Refused while already in the air.
pub fn try_jump(player: &mut Player, tuning: &Tuning) -> bool {
    if is_airborne(player, tuning) {
        return false;
    }
    player.is_jumping = true;
    player.jump_ticks = 0;
    true
}

/// Advance the rider one tick toward `lane`. Returns true on the tick the
/// rider lands.
pub fn update_player(player: &mut Player, lane: u8, tuning: &Tuning) -> bool {
    let target_x = tuning.lane_x(lane);
    let offset = target_x - player.x;
    player.x += offset * tuning.lane_ease;
    // Lean toward the lane we're heading for
    player.bank = (-offset * tuning.bank_factor).clamp(-tuning.max_bank, tuning.max_bank);

    let prev_y = player.y;
    let mut landed = false;
    if player.is_jumping {
        player.jump_ticks += 1;
        if player.jump_ticks >= tuning.jump_duration_ticks {
            player.y = tuning.ground_height;
            player.is_jumping = false;
            player.jump_ticks = 0;
            landed = true;
        } else {
            player.y = tuning.ground_height + jump_height(player.jump_ticks, tuning);
        }
    } else {
        player.y = tuning.ground_height;
    }
    player.vertical_velocity = player.y - prev_y;

    landed
}
