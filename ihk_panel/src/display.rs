//! Display state handed to the UI layer after every event and tick.

use std::collections::BTreeMap;

use ihk_common::io::signal::SignalId;

use crate::estop::ResetLamp;
use crate::position::MotorCommand;

/// Conveyor motor indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorIndicator {
    /// No contactor energized.
    Stopped,
    /// Q2.
    Left,
    /// Q1 only.
    RightSlow,
    /// Q3, with or without Q1.
    RightFast,
    /// Left and right energized together.
    Conflict,
}

impl From<MotorCommand> for MotorIndicator {
    fn from(motor: MotorCommand) -> Self {
        let left = motor.contains(MotorCommand::LEFT_SLOW);
        match (left, motor.moving_right()) {
            (false, false) => Self::Stopped,
            (true, false) => Self::Left,
            (true, true) => Self::Conflict,
            (false, true) if motor.contains(MotorCommand::RIGHT_FAST) => Self::RightFast,
            (false, true) => Self::RightSlow,
        }
    }
}

/// Valve indicator of one cylinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CylinderIndicator {
    /// Neither solenoid energized.
    Idle,
    /// Extend solenoid energized.
    Extending,
    /// Retract solenoid energized.
    Retracting,
    /// Both solenoids energized.
    Conflict,
}

impl CylinderIndicator {
    /// Indicator for a pair of solenoid states.
    pub fn from_solenoids(extend: bool, retract: bool) -> Self {
        match (extend, retract) {
            (false, false) => Self::Idle,
            (true, false) => Self::Extending,
            (false, true) => Self::Retracting,
            (true, true) => Self::Conflict,
        }
    }
}

/// Snapshot of everything the panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelDisplay {
    /// Logical state of every discrete input (true = actuated).
    pub inputs: BTreeMap<SignalId, bool>,
    /// Logical state of every discrete output as last read.
    pub outputs: BTreeMap<SignalId, bool>,
    /// Conveyor motor.
    pub motor: MotorIndicator,
    /// Cylinder 1 and cylinder 2 valves.
    pub cylinders: [CylinderIndicator; 2],
    /// Simulated axis position.
    pub position: i32,
    /// Value published on the position feedback word.
    pub feedback: i16,
    /// Motor speed.
    pub speed: i32,
    /// Last accepted temperature setpoint.
    pub temperature_setpoint: Option<i16>,
    /// Reset button lamp.
    pub reset_lamp: ResetLamp,
    /// E-stop held down.
    pub emergency_stop: bool,
}

impl PanelDisplay {
    /// Logical state of a discrete input or output; `false` if unknown.
    pub fn is_active(&self, id: SignalId) -> bool {
        self.inputs
            .get(&id)
            .or_else(|| self.outputs.get(&id))
            .copied()
            .unwrap_or(false)
    }
}
