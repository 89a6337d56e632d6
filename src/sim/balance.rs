//! Balance meter and fall state machine
//!
//! The meter is a signed lean: negative leans left, positive leans right.
//! Crossing either threshold knocks the rider over. A fall is transient: it
//! zeroes the meter, locks movement for a fixed delay and runs a blink
//! sequence for the renderer, then the rider is stable again.

use serde::{Deserialize, Serialize};

use super::timer::{Blink, Countdown};
use super::world::EntityKind;
use crate::approach_zero;
use crate::tuning::Tuning;

/// Lean limits. Owned by the host (power-ups may widen them); read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallThresholds {
    pub left: f32,
    pub right: f32,
}

impl Default for FallThresholds {
    fn default() -> Self {
        Self {
            left: -100.0,
            right: 100.0,
        }
    }
}

impl FallThresholds {
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.left.min(self.right), self.right.max(self.left))
    }

    /// At or beyond either limit
    #[inline]
    pub fn exceeded_by(&self, value: f32) -> bool {
        value >= self.right || value <= self.left
    }
}

/// Why the rider went down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallCause {
    LostBalance,
    Collision(EntityKind),
}

/// Coarse state for the renderer and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceState {
    Stable,
    /// Movement locked after a fall
    Falling,
}

/// What advancing the balance timers produced this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceTimers {
    /// Movement lock just expired
    pub unlocked: bool,
    /// Blink toggled to this visibility
    pub visibility: Option<bool>,
}

/// Balance meter plus fall bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balance {
    meter: f32,
    lockout: Countdown,
    blink: Option<Blink>,
    collision_cooldown: Countdown,
    falls: u32,
}

impl Balance {
    #[inline]
    pub fn meter(&self) -> f32 {
        self.meter
    }

    /// Shift the lean (turning, collisions)
    pub fn shift(&mut self, delta: f32) {
        self.meter += delta;
    }

    pub fn set(&mut self, value: f32) {
        self.meter = value;
    }

    /// Recover toward upright by `amount`, never overshooting
    pub fn recover(&mut self, amount: f32) {
        self.meter = approach_zero(self.meter, amount);
    }

    pub fn scale(&mut self, factor: f32) {
        self.meter *= factor;
    }

    /// Clamp to the active thresholds, then test them
    pub fn check(&mut self, thresholds: &FallThresholds) -> bool {
        self.meter = thresholds.clamp(self.meter);
        thresholds.exceeded_by(self.meter)
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lockout.is_active()
    }

    pub fn state(&self) -> BalanceState {
        if self.is_locked() {
            BalanceState::Falling
        } else {
            BalanceState::Stable
        }
    }

    /// Rider sprite visibility (false during blink-off frames)
    pub fn visible(&self) -> bool {
        self.blink.is_none_or(|b| b.visible())
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_some()
    }

    pub fn falls(&self) -> u32 {
        self.falls
    }

    /// A collision can knock the rider over only once per cooldown window
    pub fn collision_fall_ready(&self) -> bool {
        !self.collision_cooldown.is_active()
    }

    /// Enter the fall: zero the meter, lock movement, restart the blink.
    ///
    /// A new fall replaces any in-flight lock and blink rather than stacking.
    pub fn begin_fall(&mut self, tuning: &Tuning) {
        self.meter = 0.0;
        self.lockout.start(tuning.fall_lockout_ms);
        self.blink = Some(Blink::new(tuning.blink_interval_ms, tuning.blink_toggles));
        self.collision_cooldown.start(tuning.collision_fall_cooldown_ms);
        self.falls += 1;
    }

    /// Advance lockout, blink and cooldown timers by `ms`
    pub fn advance(&mut self, ms: f32) -> BalanceTimers {
        let mut out = BalanceTimers {
            unlocked: self.lockout.advance(ms),
            ..Default::default()
        };
        self.collision_cooldown.advance(ms);
        if let Some(blink) = &mut self.blink {
            if blink.advance(ms) {
                out.visibility = Some(blink.visible());
            }
            if blink.is_finished() {
                self.blink = None;
            }
        }
        out
    }
}
