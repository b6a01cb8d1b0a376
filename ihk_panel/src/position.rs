//! Axis position simulator.
//!
//! Integrates the motor contactor outputs into a position in `[0, 27648]`
//! once per polling tick. Close to the right end stop the axis snaps to the
//! end (ramp zone), mirroring the final slow-down of the real conveyor.

use bitflags::bitflags;
use tracing::{debug, trace};

use ihk_common::consts::{POSITION_MAX, RAMP_THRESHOLD};

bitflags! {
    /// Motor contactor outputs as read from the Output Area.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MotorCommand: u8 {
        /// Q1, right at `speed`.
        const RIGHT_SLOW = 0x01;
        /// Q2, left at `speed`.
        const LEFT_SLOW  = 0x02;
        /// Q3, right at `2 * speed`.
        const RIGHT_FAST = 0x04;
    }
}

impl MotorCommand {
    /// Any right-moving contactor energized.
    #[inline]
    pub fn moving_right(self) -> bool {
        self.intersects(Self::RIGHT_SLOW | Self::RIGHT_FAST)
    }

    /// Net displacement per tick; contributions of simultaneous contactors
    /// are summed.
    pub fn displacement(self, speed: i32) -> i64 {
        let speed = i64::from(speed);
        let mut delta = 0;
        if self.contains(Self::RIGHT_SLOW) {
            delta += speed;
        }
        if self.contains(Self::LEFT_SLOW) {
            delta -= speed;
        }
        if self.contains(Self::RIGHT_FAST) {
            delta += 2 * speed;
        }
        delta
    }
}

/// One simulation step. Pure.
///
/// The result always lies in `[0, POSITION_MAX]`. Moving right from below
/// the end stop into the ramp zone (`>= RAMP_THRESHOLD`) lands exactly on
/// `POSITION_MAX`.
pub fn next_position(current: i32, speed: i32, motor: MotorCommand) -> i32 {
    let max = i64::from(POSITION_MAX);
    let candidate = i64::from(current) + motor.displacement(speed);

    let candidate =
        if motor.moving_right() && current < POSITION_MAX && candidate >= i64::from(RAMP_THRESHOLD) {
            max
        } else {
            candidate
        };

    // Clamped into [0, POSITION_MAX], so the cast cannot truncate.
    candidate.clamp(0, max) as i32
}

/// Stateful wrapper around [`next_position`].
#[derive(Debug, Clone)]
pub struct PositionSimulator {
    position: i32,
    speed: i32,
}

impl PositionSimulator {
    /// Simulator at position 0.
    pub fn new(speed: i32) -> Self {
        Self {
            position: 0,
            speed: speed.max(0),
        }
    }

    /// Current position.
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Current speed.
    pub fn speed(&self) -> i32 {
        self.speed
    }

    /// Change the speed; negative values stop the axis.
    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed.max(0);
        debug!("Motor speed set to {}", self.speed);
    }

    /// Advance one tick. Returns the new position if it changed.
    pub fn step(&mut self, motor: MotorCommand) -> Option<i32> {
        let next = next_position(self.position, self.speed, motor);
        if next == self.position {
            return None;
        }
        trace!("Position {} -> {} ({:?})", self.position, next, motor);
        self.position = next;
        Some(next)
    }

    /// Jump to a setpoint, clamped into the valid range.
    pub fn force(&mut self, setpoint: i32) -> i32 {
        self.position = setpoint.clamp(0, POSITION_MAX);
        debug!("Position forced to {}", self.position);
        self.position
    }
}
