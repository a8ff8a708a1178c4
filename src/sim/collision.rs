//! Rider vs. road entity collisions
//!
//! Not geometric intersection: an entity is "hit" when it is within a fixed
//! distance of the rider on both the z and x axes independently. Cheap, and
//! forgiving enough for three wide lanes.

use glam::Vec3;

use super::particles::{ParticleKind, emit_burst};
use super::player::is_airborne;
use super::progression;
use super::state::{Entity, EntityKind, GameEvent, GamePhase, GameState, Player, PowerUpKind};
use super::tick::end_run;
use crate::tuning::Tuning;

/// What happened during one collision pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Lives lost
    pub crashes: u32,
    pub puddles: u32,
    pub powerups: u32,
    pub coins: u32,
    /// Obstacles ridden through while invincible
    pub shielded: u32,
    /// Entities that scrolled past the rider untouched
    pub passed: u32,
}

/// Per-axis proximity test
pub fn overlaps(player: &Player, entity: &Entity, tuning: &Tuning) -> bool {
    let dz = (entity.z - player.z).abs();
    let dx = (tuning.lane_x(entity.lane) - player.x).abs();
    dz < tuning.collision_z && dx < tuning.collision_x
}

/// Test every active entity against the rider, apply the consequences, and
/// recycle whatever was consumed or has scrolled out of play.
pub fn resolve_collisions(state: &mut GameState) -> CollisionReport {
    let mut report = CollisionReport::default();
    let airborne = is_airborne(&state.player, &state.tuning);
    let behind = state.player.z - state.tuning.despawn_distance;

    let mut hits: Vec<(usize, EntityKind)> = Vec::new();
    for (idx, entity) in state.entities.iter_mut().enumerate() {
        if !entity.active {
            continue;
        }
        if entity.z < behind {
            entity.active = false;
            report.passed += 1;
            continue;
        }
        if !overlaps(&state.player, entity, &state.tuning) {
            continue;
        }
        // Jumping clears anything on the road, but pickups float at bike height
        if airborne && matches!(entity.kind, EntityKind::Obstacle(_)) {
            continue;
        }
        hits.push((idx, entity.kind));
    }

    for (idx, kind) in hits {
        if state.session.phase != GamePhase::Playing {
            break;
        }
        // Every hit consumes the entity
        state.entities[idx].active = false;
        apply_hit(state, kind, &mut report);
    }

    state.recycle_inactive();
    report
}

/// Apply the consequences of one hit
fn apply_hit(state: &mut GameState, kind: EntityKind, report: &mut CollisionReport) {
    let at = Vec3::new(state.player.x, state.player.y, state.player.z);
    match kind {
        // Ridden through; consumed so it can't land a hit once the shield drops
        EntityKind::Obstacle(obstacle) if state.player.is_invincible => {
            log::debug!("Shield took a {:?}", obstacle);
            emit_burst(state, ParticleKind::Sparkle, at);
            report.shielded += 1;
        }
        EntityKind::Obstacle(obstacle) if !obstacle.is_hazard() => {
            progression::apply_slow(state);
            state.emit(GameEvent::Splash);
            report.puddles += 1;
        }
        EntityKind::Obstacle(obstacle) => {
            state.player.lives = state.player.lives.saturating_sub(1);
            state.session.ticks_since_hit = 0;
            let lives = state.player.lives;
            log::info!("Crashed into {:?}, {} lives left", obstacle, lives);
            state.emit(GameEvent::Crash {
                kind: obstacle,
                lives,
            });
            emit_burst(state, ParticleKind::Debris, at);
            report.crashes += 1;
            if lives == 0 {
                end_run(state);
            }
        }
        EntityKind::PowerUp(powerup) => {
            match powerup {
                PowerUpKind::SpeedBoost => progression::apply_boost(state),
                PowerUpKind::Invincibility => progression::apply_invincibility(state),
                PowerUpKind::ExtraLife => progression::apply_extra_life(state),
            }
            log::debug!("Picked up {:?}", powerup);
            state.emit(GameEvent::PowerUp { kind: powerup });
            emit_burst(state, ParticleKind::Sparkle, at);
            report.powerups += 1;
        }
        EntityKind::Coin => {
            progression::collect_coin(state);
            emit_burst(state, ParticleKind::Sparkle, at);
            report.coins += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::try_jump;
    use crate::sim::state::ObstacleKind;

    fn playing() -> GameState {
        let mut state = GameState::with_tuning(11, Tuning::calm());
        state.session.phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_overlap_is_per_axis() {
        let t = Tuning::default();
        let p = Player::new(&t);
        let mut e = Entity::blank(crate::sim::state::EntityCategory::Coin);
        e.lane = 1;
        e.z = 0.9;
        assert!(overlaps(&p, &e, &t));
        e.z = 1.0;
        assert!(!overlaps(&p, &e, &t));
        e.z = 0.0;
        e.lane = 2;
        assert!(!overlaps(&p, &e, &t));
    }

    #[test]
    fn test_grounded_obstacle_costs_exactly_one_life() {
        let mut state = playing();
        state.spawn_entity(EntityKind::Obstacle(ObstacleKind::Barrier), 1, 0.5);
        let report = resolve_collisions(&mut state);
        assert_eq!(report.crashes, 1);
        assert_eq!(state.player.lives, 2);
        assert!(state.entities.is_empty(), "obstacle is consumed");

        // Nothing left to hit
        let report = resolve_collisions(&mut state);
        assert_eq!(report.crashes, 0);
        assert_eq!(state.player.lives, 2);
    }

    #[test]
    fn test_airborne_player_clears_obstacle() {
        let mut state = playing();
        state.spawn_entity(EntityKind::Obstacle(ObstacleKind::Car), 1, 0.5);
        assert!(try_jump(&mut state.player, &state.tuning));
        let report = resolve_collisions(&mut state);
        assert_eq!(report.crashes, 0);
        assert_eq!(state.player.lives, 3);
        assert_eq!(state.entities.len(), 1);
    }

    #[test]
    fn test_airborne_player_still_collects() {
        let mut state = playing();
        state.spawn_entity(EntityKind::Coin, 1, 0.2);
        try_jump(&mut state.player, &state.tuning);
        let report = resolve_collisions(&mut state);
        assert_eq!(report.coins, 1);
        assert_eq!(state.session.score, state.tuning.coin_value);
    }

    #[test]
    fn test_invincible_player_ignores_obstacles() {
        let mut state = playing();
        progression::apply_invincibility(&mut state);
        state.spawn_entity(EntityKind::Obstacle(ObstacleKind::Barrier), 1, 0.0);
        let report = resolve_collisions(&mut state);
        assert_eq!(report.crashes, 0);
        assert_eq!(report.shielded, 1);
        assert_eq!(state.player.lives, 3);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_obstacle_cannot_hit_after_shield_drops() {
        let mut state = playing();
        progression::apply_invincibility(&mut state);
        state.effects.invincible_ticks = 2;
        state.spawn_entity(EntityKind::Obstacle(ObstacleKind::Car), 1, 0.9);
        for _ in 0..4 {
            crate::sim::tick(&mut state, &crate::sim::TickInput::default());
        }
        assert!(!state.player.is_invincible);
        assert_eq!(state.player.lives, 3);
    }

    #[test]
    fn test_puddle_slows_instead_of_hurting() {
        let mut state = playing();
        let before = state.session.speed;
        state.spawn_entity(EntityKind::Obstacle(ObstacleKind::Puddle), 1, 0.0);
        let report = resolve_collisions(&mut state);
        assert_eq!(report.puddles, 1);
        assert_eq!(state.player.lives, 3);
        assert!(state.session.speed < before);
        assert!(state.events().contains(&GameEvent::Splash));
    }

    #[test]
    fn test_last_life_ends_the_run() {
        let mut state = playing();
        state.player.lives = 1;
        state.session.score = 42;
        state.spawn_entity(EntityKind::Obstacle(ObstacleKind::Cone), 1, 0.0);
        state.spawn_entity(EntityKind::Coin, 1, 0.1);
        resolve_collisions(&mut state);
        assert_eq!(state.session.phase, GamePhase::GameOver);
        assert_eq!(state.session.high_score, 42);
        assert_eq!(state.session.coins, 0, "hits after game over are ignored");
    }

    #[test]
    fn test_powerups_apply_effects() {
        let mut state = playing();
        state.spawn_entity(EntityKind::PowerUp(PowerUpKind::SpeedBoost), 1, 0.0);
        resolve_collisions(&mut state);
        assert_eq!(state.effects.boost_ticks, state.tuning.boost_ticks);

        state.spawn_entity(EntityKind::PowerUp(PowerUpKind::ExtraLife), 1, 0.0);
        resolve_collisions(&mut state);
        assert_eq!(state.player.lives, 4);
    }

    #[test]
    fn test_passed_entities_are_recycled() {
        let mut state = playing();
        state.spawn_entity(EntityKind::Coin, 0, -10.0);
        let report = resolve_collisions(&mut state);
        assert_eq!(report.passed, 1);
        assert!(state.entities.is_empty());
        assert_eq!(
            state
                .entity_pool
                .free_count(crate::sim::state::EntityCategory::Coin),
            1
        );
    }
}
