//! Thrown items
//!
//! A throw aims at a point, inherits part of the rider's velocity, spins,
//! and lives until it hits something solid, leaves the world or times out.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Shape;
use super::state::Inventory;
use super::world::{EntityId, EntityKind, Filter, KindSet, World};
use crate::consts::PROJECTILE_RADIUS;
use crate::tuning::Tuning;

/// Why a throw was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ThrowError {
    #[error("No items left to throw")]
    OutOfItems,
}

/// A flying item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Sprite angle (radians)
    pub angle: f32,
    /// Angular velocity (radians/s)
    pub spin: f32,
    pub age_ms: f32,
    pub ttl_ms: f32,
    pub radius: f32,
}

impl Projectile {
    pub fn shape(&self) -> Shape {
        Shape::circle(self.pos, self.radius)
    }

    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.angle += self.spin * dt;
        self.age_ms += dt * 1000.0;
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age_ms >= self.ttl_ms
    }
}

/// Launch velocity: full speed toward the target plus a share of the
/// thrower's own velocity.
pub fn launch_velocity(origin: Vec2, origin_velocity: Vec2, target: Vec2, tuning: &Tuning) -> Vec2 {
    (target - origin).normalize_or_zero() * tuning.projectile_speed
        + origin_velocity * tuning.inherited_velocity_factor
}

/// Throw one item from `origin` toward `target`.
///
/// Takes an item from `inventory` unless `infinite_items` is set.
#[allow(clippy::too_many_arguments)]
pub fn throw(
    id: u32,
    origin: Vec2,
    origin_velocity: Vec2,
    target: Vec2,
    inventory: &mut Inventory,
    infinite_items: bool,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Result<Projectile, ThrowError> {
    if !infinite_items && !inventory.take_one() {
        return Err(ThrowError::OutOfItems);
    }

    let max_spin = tuning.max_spin_deg.abs();
    let spin_deg = if max_spin > 0.0 {
        rng.random_range(-max_spin..=max_spin)
    } else {
        0.0
    };

    Ok(Projectile {
        id,
        pos: origin,
        vel: launch_velocity(origin, origin_velocity, target, tuning),
        angle: 0.0,
        spin: spin_deg.to_radians(),
        age_ms: 0.0,
        ttl_ms: tuning.projectile_ttl_ms,
        radius: PROJECTILE_RADIUS,
    })
}

/// Result of advancing a projectile one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    Flying,
    Expired,
    OutOfBounds,
    /// First solid entity touched, in registry order
    Hit(EntityId),
}

/// Advance one frame and report whether the projectile survives
pub fn step(projectile: &mut Projectile, world: &World, world_size: Vec2, dt: f32) -> Flight {
    projectile.advance(dt);

    if projectile.is_expired() {
        return Flight::Expired;
    }
    let p = projectile.pos;
    if p.x < 0.0 || p.y < 0.0 || p.x > world_size.x || p.y > world_size.y {
        return Flight::OutOfBounds;
    }

    let filter = Filter::excluding(KindSet::PROJECTILE_PASSABLE);
    match world.first_overlapping(&projectile.shape(), &filter) {
        Some(id) => Flight::Hit(id),
        None => Flight::Flying,
    }
}

/// What a hit achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitOutcome {
    /// A pedestrian got their first item
    PedestrianServed,
    /// Something that wanted an item got one
    Delivered,
    /// Hit something that did not want an item
    Wasted,
    /// Struck the destination marker
    Destination,
}

/// Apply a hit to the struck entity and classify it
pub fn apply_hit(world: &mut World, id: EntityId) -> HitOutcome {
    let Some(kind) = world.get(id).map(|e| e.kind()) else {
        return HitOutcome::Wasted;
    };
    match kind {
        EntityKind::Person => {
            if world.mark_served(id) {
                HitOutcome::PedestrianServed
            } else {
                HitOutcome::Wasted
            }
        }
        EntityKind::Destination => HitOutcome::Destination,
        EntityKind::Building
        | EntityKind::Car
        | EntityKind::Road
        | EntityKind::Tree
        | EntityKind::Grass
        | EntityKind::RefillZone
        | EntityKind::Projectile
        | EntityKind::Player => {
            if world.clear_needs_item(id) {
                HitOutcome::Delivered
            } else {
                HitOutcome::Wasted
            }
        }
    }
}
