//! Cooperative timers advanced by the simulation tick
//!
//! Timers never fire on their own: `tick()` advances them by the frame's
//! elapsed milliseconds between updates, so callbacks always run to
//! completion in a known order. Restarting a timer replaces it.

use serde::{Deserialize, Serialize};

/// One-shot countdown in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    remaining_ms: f32,
}

impl Countdown {
    pub fn started(ms: f32) -> Self {
        Self { remaining_ms: ms }
    }

    /// Start or restart; any in-flight countdown is replaced
    pub fn start(&mut self, ms: f32) {
        self.remaining_ms = ms;
    }

    /// Add time to a running countdown
    pub fn extend(&mut self, ms: f32) {
        self.remaining_ms += ms;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining_ms > 0.0
    }

    #[inline]
    pub fn remaining_ms(&self) -> f32 {
        self.remaining_ms
    }

    /// Advance by `ms`; returns true on the frame the countdown expires
    pub fn advance(&mut self, ms: f32) -> bool {
        if !self.is_active() {
            return false;
        }
        self.remaining_ms -= ms;
        if self.remaining_ms <= 0.0 {
            self.remaining_ms = 0.0;
            return true;
        }
        false
    }
}

/// Repeating fixed-period timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    period_ms: f32,
    accumulated_ms: f32,
}

impl Interval {
    pub fn new(period_ms: f32) -> Self {
        Self {
            period_ms: period_ms.max(1.0),
            accumulated_ms: 0.0,
        }
    }

    /// Advance by `ms`; returns how many periods elapsed
    pub fn advance(&mut self, ms: f32) -> u32 {
        self.accumulated_ms += ms;
        let mut fired = 0;
        while self.accumulated_ms >= self.period_ms {
            self.accumulated_ms -= self.period_ms;
            fired += 1;
        }
        fired
    }
}

/// Finite visibility toggle sequence (the post-fall blink)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blink {
    interval: Interval,
    toggles_left: u32,
    visible: bool,
}

impl Blink {
    pub fn new(interval_ms: f32, toggles: u32) -> Self {
        Self {
            interval: Interval::new(interval_ms),
            toggles_left: toggles,
            visible: true,
        }
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.toggles_left == 0
    }

    /// Advance the sequence; returns true if visibility changed
    pub fn advance(&mut self, ms: f32) -> bool {
        let before = self.visible;
        for _ in 0..self.interval.advance(ms) {
            if self.toggles_left == 0 {
                break;
            }
            self.visible = !self.visible;
            self.toggles_left -= 1;
        }
        if self.toggles_left == 0 {
            self.visible = true;
        }
        before != self.visible
    }
}
