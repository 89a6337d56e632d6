//! Data-driven game balance
//!
//! Every gameplay constant lives here so a JSON document can override any
//! subset of them. Per-frame values were balanced at 60 Hz.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::error::LoadError;

/// What a fall costs the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallPenalty {
    /// Every carried item is lost
    #[default]
    DropAll,
    /// A single item is lost
    DropOne,
}

/// What a pedestrian does after reaching its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalPolicy {
    /// Stop for good
    #[default]
    Idle,
    /// Pick a new random destination
    Retarget,
}

/// Gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Locomotion ===
    /// Heading change per frame while turning (radians)
    pub rotation_speed: f32,
    /// Balance drift per millisecond of turning
    pub balance_turn_rate: f32,
    /// Balance correction per millisecond while pedaling straight
    pub balance_correction_rate: f32,
    /// Balance regeneration per millisecond while stopped
    pub balance_regen_rate: f32,
    /// Fixed reverse speed (units/s)
    pub backward_speed: f32,
    pub max_momentum: f32,
    /// Momentum gained per frame while pedaling
    pub momentum_increase: f32,
    /// Momentum lost per frame while gliding
    pub glide_friction: f32,
    /// Momentum is dropped after this long without directional input
    pub input_timeout_ms: f32,

    // === Falling ===
    pub fall_lockout_ms: f32,
    pub blink_interval_ms: f32,
    pub blink_toggles: u32,
    /// Minimum gap between collision-triggered falls
    pub collision_fall_cooldown_ms: f32,
    pub fall_penalty: FallPenalty,

    // === Collisions ===
    /// Momentum lost on hitting a building or parked car
    pub hard_collision_momentum_loss: f32,
    /// Balance the rider is knocked to by a hard collision
    pub hard_collision_balance: f32,
    /// Momentum and balance scale per frame while on grass
    pub grass_damping: f32,
    /// Push opposite the travel direction before searching for free space
    pub collision_nudge: f32,
    pub resolver_radius_step: f32,
    pub resolver_max_radius: f32,
    pub resolver_angle_step: f32,

    // === Projectiles ===
    pub projectile_speed: f32,
    pub inherited_velocity_factor: f32,
    /// Symmetric spin range (degrees/s)
    pub max_spin_deg: f32,
    pub projectile_ttl_ms: f32,

    // === Inventory & scoring ===
    pub start_items: u32,
    pub max_items: u32,
    pub pedestrian_score: i64,
    pub delivery_score: i64,
    pub wrong_delivery_penalty: i64,
    pub destination_score: i64,
    /// Time added to the countdown for a successful delivery
    pub delivery_time_bonus_ms: f32,
    pub game_duration_ms: f32,

    // === NPCs ===
    pub pedestrian_count: u32,
    pub pedestrian_speed: f32,
    pub pedestrian_tick_ms: f32,
    pub pedestrian_arrival: ArrivalPolicy,
    pub patrol_car_count: u32,
    pub vehicle_speed: f32,
    pub arrival_epsilon: f32,
    /// Rejection-sampling attempts before giving up on a random placement
    pub placement_attempts: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            rotation_speed: 0.05,
            balance_turn_rate: 0.1,
            balance_correction_rate: 0.2,
            balance_regen_rate: 0.5,
            backward_speed: 100.0,
            max_momentum: 300.0,
            momentum_increase: 5.0,
            glide_friction: 5.0,
            input_timeout_ms: 1000.0,

            fall_lockout_ms: 1000.0,
            blink_interval_ms: 100.0,
            blink_toggles: 10,
            collision_fall_cooldown_ms: 3000.0,
            fall_penalty: FallPenalty::DropAll,

            hard_collision_momentum_loss: 100.0,
            hard_collision_balance: 50.0,
            grass_damping: 0.67,
            collision_nudge: 10.0,
            resolver_radius_step: 5.0,
            resolver_max_radius: 200.0,
            resolver_angle_step: PI / 16.0,

            projectile_speed: 300.0,
            inherited_velocity_factor: 0.8,
            max_spin_deg: 300.0,
            projectile_ttl_ms: 3000.0,

            start_items: 10,
            max_items: 20,
            pedestrian_score: 5,
            delivery_score: 10,
            wrong_delivery_penalty: 1,
            destination_score: 25,
            delivery_time_bonus_ms: 5000.0,
            game_duration_ms: 120_000.0,

            pedestrian_count: 20,
            pedestrian_speed: 40.0,
            pedestrian_tick_ms: 50.0,
            pedestrian_arrival: ArrivalPolicy::Idle,
            patrol_car_count: 3,
            vehicle_speed: 120.0,
            arrival_epsilon: 5.0,
            placement_attempts: 200,
        }
    }
}

impl Tuning {
    /// Overlay a (possibly partial) JSON document on the defaults
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        log::info!(
            "Loaded tuning (max momentum {}, {} pedestrians)",
            tuning.max_momentum,
            tuning.pedestrian_count
        );
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
