//! Displacement resolver
//!
//! Radial search for the nearest spot where a shape stops overlapping solid
//! entities. Rings grow outward in fixed radius steps; each ring is sampled
//! at fixed angle steps starting from angle 0 (pointing +x) and turning
//! counter-clockwise. The first free candidate wins, so the smallest
//! displacement is preferred and, within a ring, the lowest angle.

use glam::Vec2;
use std::f32::consts::TAU;

use super::geometry::Shape;
use super::world::{Filter, World};
use crate::polar_to_cartesian;
use crate::tuning::Tuning;

/// Search ring spacing and extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPattern {
    pub radius_step: f32,
    pub max_radius: f32,
    pub angle_step: f32,
}

impl SearchPattern {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            radius_step: tuning.resolver_radius_step,
            max_radius: tuning.resolver_max_radius,
            angle_step: tuning.resolver_angle_step,
        }
    }

    /// Candidate offsets in search order
    pub fn offsets(&self) -> impl Iterator<Item = Vec2> + '_ {
        let step = self.radius_step.max(f32::EPSILON);
        let rings = (self.max_radius / step).floor() as u32;
        let samples = ((TAU / self.angle_step.max(f32::EPSILON)).round() as u32).max(1);
        (1..=rings).flat_map(move |ring| {
            let r = ring as f32 * step;
            (0..samples).map(move |k| polar_to_cartesian(r, k as f32 * self.angle_step))
        })
    }
}

/// Outcome of a displacement search
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Nothing to resolve; the shape was already free
    Clear(Vec2),
    /// Free spot found
    Moved(Vec2),
    /// Search exhausted; the original position is returned unchanged
    Unresolved(Vec2),
}

impl Resolution {
    /// Position the caller should use
    pub fn position(&self) -> Vec2 {
        match *self {
            Resolution::Clear(p) | Resolution::Moved(p) | Resolution::Unresolved(p) => p,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved(_))
    }
}

/// Find the nearest position for `shape` (anchored at `origin`) that overlaps
/// nothing accepted by `filter`.
pub fn find_free_position(
    world: &World,
    shape: &Shape,
    origin: Vec2,
    filter: &Filter,
    pattern: &SearchPattern,
) -> Resolution {
    if world.is_position_free(origin, shape, filter) {
        return Resolution::Clear(origin);
    }

    for offset in pattern.offsets() {
        let candidate = origin + offset;
        if world.is_position_free(candidate, shape, filter) {
            return Resolution::Moved(candidate);
        }
    }

    log::debug!(
        "No free position within {} of ({:.0}, {:.0})",
        pattern.max_radius,
        origin.x,
        origin.y
    );
    Resolution::Unresolved(origin)
}

/// Push a moving shape out of an obstacle: step back against `travel` by
/// `nudge`, then search outward from there.
pub fn push_out(
    world: &World,
    shape: &Shape,
    origin: Vec2,
    travel: Vec2,
    nudge: f32,
    filter: &Filter,
    pattern: &SearchPattern,
) -> Resolution {
    let start = origin - travel.normalize_or_zero() * nudge;
    match find_free_position(world, shape, start, filter, pattern) {
        Resolution::Clear(p) if start != origin => Resolution::Moved(p),
        Resolution::Unresolved(_) => Resolution::Unresolved(origin),
        other => other,
    }
}
