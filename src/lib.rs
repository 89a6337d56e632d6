//! Comic Courier - a top-down arcade delivery game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, collisions, steering, game state)
//! - `tuning`: Data-driven game balance
//! - `map`: City layout data
//!
//! Rendering, audio and UI live in the host and talk to the simulation
//! through `sim::TickInput` and `sim::GameEvent`.

pub mod error;
pub mod map;
pub mod sim;
pub mod tuning;

pub use error::LoadError;
pub use map::CityMap;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference frame length the per-frame tuning values were balanced at (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Default world extent (the scaled city background)
    pub const WORLD_WIDTH: f32 = 15_000.0;
    pub const WORLD_HEIGHT: f32 = 6_000.0;

    /// Player spawn point
    pub const PLAYER_START_X: f32 = 100.0;
    pub const PLAYER_START_Y: f32 = 100.0;

    /// Player collision diamond: half-length along heading, half-width across it
    pub const PLAYER_HALF_LENGTH: f32 = 20.0;
    pub const PLAYER_HALF_WIDTH: f32 = 10.0;

    /// Refill zone (green circle near spawn)
    pub const REFILL_X: f32 = 300.0;
    pub const REFILL_Y: f32 = 300.0;
    pub const REFILL_RADIUS: f32 = 50.0;

    /// Entity body sizes
    pub const PEDESTRIAN_WIDTH: f32 = 12.0;
    pub const PEDESTRIAN_HEIGHT: f32 = 16.0;
    pub const PATROL_CAR_WIDTH: f32 = 40.0;
    pub const PATROL_CAR_HEIGHT: f32 = 40.0;
    pub const DESTINATION_RADIUS: f32 = 40.0;
    pub const PROJECTILE_RADIUS: f32 = 8.0;

    /// Distance ahead of the player targeted by a spacebar throw
    pub const THROW_AHEAD_DISTANCE: f32 = 100.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Distance and bearing of `offset` (bearing 0 = +x, matching `Player::rotation`)
#[inline]
pub fn cartesian_to_polar(offset: Vec2) -> (f32, f32) {
    (offset.length(), offset.y.atan2(offset.x))
}

/// Move `value` toward zero by `amount` without crossing it
#[inline]
pub fn approach_zero(value: f32, amount: f32) -> f32 {
    if value > 0.0 {
        (value - amount).max(0.0)
    } else if value < 0.0 {
        (value + amount).min(0.0)
    } else {
        0.0
    }
}
