//! Vehicle locomotion
//!
//! Turns the four directional inputs into heading, momentum and velocity for
//! the rider. Heading and momentum steps are per frame; balance drift is per
//! millisecond. Position integration is left to the tick.

use glam::Vec2;

use super::balance::FallThresholds;
use super::state::Player;
use crate::tuning::Tuning;
use crate::{approach_zero, normalize_angle};

/// Directional input sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl Controls {
    /// Any directional key held
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    pub fn turning(&self) -> bool {
        self.left || self.right
    }

    /// -1 for left, +1 for right, 0 for neither. Left wins when both are held.
    fn turn_sign(&self) -> f32 {
        if self.left {
            -1.0
        } else if self.right {
            1.0
        } else {
            0.0
        }
    }
}

/// Run one frame of the locomotion model, leaving the result in
/// `player.velocity`.
pub fn drive(
    player: &mut Player,
    controls: Controls,
    thresholds: &FallThresholds,
    tuning: &Tuning,
    dt: f32,
) {
    let delta_ms = dt * 1000.0;

    if controls.any() {
        player.idle_ms = 0.0;
    } else {
        player.idle_ms += delta_ms;
        if player.idle_ms > tuning.input_timeout_ms {
            player.momentum = 0.0;
        }
    }

    if player.balance.is_locked() || player.balance.check(thresholds) {
        player.velocity = Vec2::ZERO;
        player.momentum = 0.0;
        return;
    }

    // Backward outranks forward and glide
    player.going_backward = controls.backward;

    // Steering mirrors while backing up: left raises the heading.
    let turn = controls.turn_sign();
    if turn != 0.0 && (player.going_backward || player.momentum > 0.0) {
        let steer = if player.going_backward { -turn } else { turn };
        player.rotation = normalize_angle(player.rotation + steer * tuning.rotation_speed);
        player
            .balance
            .shift(steer * delta_ms * tuning.balance_turn_rate);
    }

    if controls.backward {
        player.momentum = 0.0;
        player.velocity = -player.facing() * tuning.backward_speed;
    } else if controls.forward {
        player.velocity = player.facing() * player.momentum;
        player.momentum = (player.momentum + tuning.momentum_increase).min(tuning.max_momentum);
        if !controls.turning() {
            player
                .balance
                .recover(delta_ms * tuning.balance_correction_rate);
        }
    } else {
        player.momentum = approach_zero(player.momentum, tuning.glide_friction);
        player.velocity = if player.momentum > 0.0 {
            player.facing() * player.momentum
        } else {
            Vec2::ZERO
        };
    }

    if player.momentum == 0.0 && !controls.backward {
        player.balance.recover(delta_ms * tuning.balance_regen_rate);
    }
}
