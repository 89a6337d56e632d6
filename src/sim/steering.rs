//! NPC steering
//!
//! Pedestrians and patrol vehicles seek a single destination point in a
//! straight line. Pedestrians re-steer on a slow fixed tick and get nudged
//! out of solid shapes; vehicles re-steer every frame and never leave the
//! road network.

use glam::Vec2;
use rand::Rng;

use super::resolve::{Resolution, SearchPattern, find_free_position};
use super::world::{EntityId, EntityKind, Filter, KindSet, World};
use crate::tuning::{ArrivalPolicy, Tuning};

/// Velocity toward `destination` at `speed`
#[inline]
pub fn seek(position: Vec2, destination: Vec2, speed: f32) -> Vec2 {
    (destination - position).normalize_or_zero() * speed
}

/// Re-steer one pedestrian. Returns true if it arrived this tick.
pub fn steer_pedestrian(
    world: &mut World,
    id: EntityId,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> bool {
    let Some((position, destination)) = world.get(id).map(|e| (e.position(), e.destination()))
    else {
        return false;
    };
    let Some(destination) = destination else {
        world.set_velocity(id, Vec2::ZERO);
        return false;
    };

    if position.distance(destination) >= tuning.arrival_epsilon {
        world.set_velocity(id, seek(position, destination, tuning.pedestrian_speed));
        return false;
    }

    world.set_velocity(id, Vec2::ZERO);
    let next = match tuning.pedestrian_arrival {
        ArrivalPolicy::Idle => None,
        ArrivalPolicy::Retarget => world
            .random_road_point(rng, None, tuning.placement_attempts)
            .map(|(_, p)| p),
    };
    world.set_destination(id, next);
    true
}

/// Integrate one pedestrian and relocate it if it ended up inside something
/// solid. Returns the displacement outcome when one was needed.
pub fn move_pedestrian(
    world: &mut World,
    id: EntityId,
    dt: f32,
    pattern: &SearchPattern,
) -> Option<Resolution> {
    let (position, velocity) = world.get(id).map(|e| (e.position(), e.velocity()))?;
    if velocity != Vec2::ZERO {
        world.set_position(id, position + velocity * dt);
    }

    let filter = Filter::excluding(KindSet::PEDESTRIAN_PASSABLE).without(id);
    let entity = world.get(id)?;
    let shape = entity.shape().clone();
    let here = entity.position();
    world.first_overlapping(&shape, &filter)?;

    let resolution = find_free_position(world, &shape, here, &filter, pattern);
    if let Resolution::Moved(p) = resolution {
        world.set_position(id, p);
    }
    Some(resolution)
}

/// What a vehicle did this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStep {
    Moved,
    /// Reached its destination and picked a new one
    Arrived,
    /// Would have left the road; picked a new destination
    Retargeted,
    /// No road-bound move was possible this frame
    Stalled,
}

/// Steer and move one patrol vehicle
pub fn steer_vehicle(
    world: &mut World,
    id: EntityId,
    dt: f32,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> VehicleStep {
    let Some((position, destination)) = world.get(id).map(|e| (e.position(), e.destination()))
    else {
        return VehicleStep::Stalled;
    };

    let Some(destination) = destination else {
        world.set_velocity(id, Vec2::ZERO);
        return VehicleStep::Stalled;
    };

    if position.distance(destination) < tuning.arrival_epsilon {
        world.set_velocity(id, Vec2::ZERO);
        retarget_vehicle(world, id, position, tuning, rng);
        return VehicleStep::Arrived;
    }

    let velocity = seek(position, destination, tuning.vehicle_speed);
    let next = position + velocity * dt;
    if world.is_on_road(next) {
        world.set_velocity(id, velocity);
        world.set_position(id, next);
        return VehicleStep::Moved;
    }

    // Off-road: head somewhere else and only move if that keeps us on the road.
    let Some(new_destination) = retarget_vehicle(world, id, position, tuning, rng) else {
        world.set_velocity(id, Vec2::ZERO);
        return VehicleStep::Stalled;
    };
    let velocity = seek(position, new_destination, tuning.vehicle_speed);
    let next = position + velocity * dt;
    if world.is_on_road(next) {
        world.set_velocity(id, velocity);
        world.set_position(id, next);
    } else {
        world.set_velocity(id, Vec2::ZERO);
    }
    VehicleStep::Retargeted
}

/// Pick a random point on a road other than the one the vehicle is on
fn retarget_vehicle(
    world: &mut World,
    id: EntityId,
    position: Vec2,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    let current_road = world.road_at(position);
    let (_, point) = world.random_road_point(rng, current_road, tuning.placement_attempts)?;
    world.set_destination(id, Some(point));
    Some(point)
}

/// Ids of the NPCs steering drives, in registry order
pub fn pedestrians(world: &World) -> Vec<EntityId> {
    world.ids_of_kind(EntityKind::Person)
}

pub fn patrol_vehicles(world: &World) -> Vec<EntityId> {
    world
        .iter()
        .filter(|e| e.is_patrol_vehicle())
        .map(|e| e.id())
        .collect()
}
