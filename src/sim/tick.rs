//! Per-frame simulation tick
//!
//! Order within a frame: timers, locomotion, fall check, integration,
//! player collisions and push-out, throws, projectiles, NPC steering, then
//! the game clock. The rider is rotated, moved, tested and corrected
//! exactly once per frame.

use glam::Vec2;

use super::balance::FallCause;
use super::locomotion::{self, Controls};
use super::projectile::{self, Flight};
use super::resolve::SearchPattern;
use super::state::{GameEvent, GamePhase, GameState};
use super::steering;
use super::world::{EntityId, EntityKind, Filter};
use crate::consts::THROW_AHEAD_DISTANCE;

/// Input snapshot for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Throw at this world point (pointer click)
    pub throw_at: Option<Vec2>,
    /// Throw straight ahead (spacebar), edge-triggered
    pub throw_ahead: bool,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    pub fn controls(&self) -> Controls {
        Controls {
            forward: self.forward,
            backward: self.backward,
            left: self.left,
            right: self.right,
        }
    }
}

/// Advance the game by one frame of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;
    let delta_ms = dt * 1000.0;

    // Fall lockout and blink
    let timers = state.player.balance.advance(delta_ms);
    if let Some(visible) = timers.visibility {
        state.emit(GameEvent::PlayerBlink { visible });
    }
    if timers.unlocked {
        state.emit(GameEvent::Recovered);
    }

    let thresholds = state.modifiers.fall_thresholds;
    locomotion::drive(
        &mut state.player,
        input.controls(),
        &thresholds,
        &state.tuning,
        dt,
    );
    if !state.player.balance.is_locked() && state.player.balance.check(&thresholds) {
        state.fall(FallCause::LostBalance);
    }

    let start = state.player.pos;
    state.player.pos = (start + state.player.velocity * dt).clamp(Vec2::ZERO, state.world_size);
    let travel = state.player.pos - start;

    player_collisions(state, travel);

    if let Some(target) = input.throw_at {
        let _ = state.throw_item(target);
    }
    if input.throw_ahead {
        let target = state.player.pos + state.player.facing() * THROW_AHEAD_DISTANCE;
        let _ = state.throw_item(target);
    }

    update_projectiles(state, dt);
    update_npcs(state, dt);

    if state.clock.advance(delta_ms) {
        state.phase = GamePhase::GameOver;
        log::info!("Time up: final score {}", state.score);
        state.emit(GameEvent::GameOver { score: state.score });
    }
}

/// React to everything the rider overlaps this frame
fn player_collisions(state: &mut GameState, travel: Vec2) {
    let shape = state.player.collision_shape();
    let hits = state.world.query_overlapping(&shape, &Filter::default());

    let mut on_grass = false;
    let mut hard_hit = false;
    let mut push = false;

    for id in hits {
        let Some((kind, patrolling)) = state.world.get(id).map(|e| (e.kind(), e.is_patrol_vehicle()))
        else {
            continue;
        };
        match kind {
            EntityKind::Road | EntityKind::Tree => {}
            EntityKind::Grass => on_grass = true,
            EntityKind::Building => {
                push = true;
                if !hard_hit {
                    hard_hit = true;
                    hard_collision(state, id, kind);
                }
            }
            EntityKind::Car if !patrolling => {
                push = true;
                if !hard_hit {
                    hard_hit = true;
                    hard_collision(state, id, kind);
                }
            }
            EntityKind::Car | EntityKind::Person => {
                push = true;
                state.fall(FallCause::Collision(kind));
            }
            EntityKind::RefillZone => state.refill(),
            EntityKind::Destination => state.reach_destination(false),
            // Never registered in the world
            EntityKind::Projectile | EntityKind::Player => {}
        }
    }

    if on_grass {
        let damping = state.tuning.grass_damping;
        state.player.momentum *= damping;
        state.player.balance.scale(damping);
    }

    if push {
        state.push_player_out(travel);
    }
}

fn hard_collision(state: &mut GameState, id: EntityId, kind: EntityKind) {
    let player = &mut state.player;
    player.momentum = (player.momentum - state.tuning.hard_collision_momentum_loss).max(0.0);
    player.balance.set(state.tuning.hard_collision_balance);
    state.emit(GameEvent::HardCollision { entity: id, kind });
}

fn update_projectiles(state: &mut GameState, dt: f32) {
    let in_flight = std::mem::take(&mut state.projectiles);
    let mut survivors = Vec::with_capacity(in_flight.len());

    for mut p in in_flight {
        match projectile::step(&mut p, &state.world, state.world_size, dt) {
            Flight::Flying => survivors.push(p),
            Flight::Expired | Flight::OutOfBounds => {
                state.emit(GameEvent::ProjectileExpired { projectile: p.id });
            }
            Flight::Hit(entity) => {
                let outcome = projectile::apply_hit(&mut state.world, entity);
                state.score_hit(p.id, entity, outcome);
            }
        }
    }

    state.projectiles = survivors;
}

fn update_npcs(state: &mut GameState, dt: f32) {
    let pattern = SearchPattern::from_tuning(&state.tuning);
    let pedestrians = steering::pedestrians(&state.world);

    if state.pedestrian_clock.advance(dt * 1000.0) > 0 {
        for &id in &pedestrians {
            steering::steer_pedestrian(&mut state.world, id, &state.tuning, &mut state.rng);
        }
    }
    for &id in &pedestrians {
        steering::move_pedestrian(&mut state.world, id, dt, &pattern);
    }

    for id in steering::patrol_vehicles(&state.world) {
        steering::steer_vehicle(&mut state.world, id, dt, &state.tuning, &mut state.rng);
    }
}
