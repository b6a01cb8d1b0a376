//! Signal identities.
//!
//! `SignalId` maps a panel tag like `"B7"` to a typed enum variant. Both the
//! address map and the bridge resolve I/O points by identity rather than by
//! byte/bit coordinates.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::image::Area;

// ─── SignalType ─────────────────────────────────────────────────────

/// I/O point type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SignalType {
    /// Discrete input of the controller (Input Area bit).
    Di = 0,
    /// Discrete output of the controller (Output Area bit).
    Do = 1,
    /// Analog input of the controller (Input Area word).
    Ai = 2,
}

impl SignalType {
    /// Area the point lives in.
    pub const fn area(self) -> Area {
        match self {
            Self::Di | Self::Ai => Area::Input,
            Self::Do => Area::Output,
        }
    }

    /// Direction of data flow for points of this type.
    pub const fn direction(self) -> Direction {
        match self {
            Self::Di | Self::Ai => Direction::PanelToController,
            Self::Do => Direction::ControllerToPanel,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Di => write!(f, "di"),
            Self::Do => write!(f, "do"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

/// Data flow direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Written by the panel, read by the controller.
    PanelToController,
    /// Written by the controller, read by the panel.
    ControllerToPanel,
}

// ─── ContactLogic ───────────────────────────────────────────────────

/// Contact logic of a discrete point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContactLogic {
    /// Normally open: bit set when active.
    #[default]
    #[serde(rename = "NO")]
    NO = 0,
    /// Normally closed: bit clear when active.
    #[serde(rename = "NC")]
    NC = 1,
}

impl ContactLogic {
    /// Physical bit value for a logical state.
    #[inline]
    pub const fn to_bit(self, active: bool) -> bool {
        match self {
            Self::NO => active,
            Self::NC => !active,
        }
    }

    /// Logical state for a physical bit value.
    #[inline]
    pub const fn from_bit(self, bit: bool) -> bool {
        // The mapping is its own inverse.
        self.to_bit(bit)
    }
}

impl FromStr for ContactLogic {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NO" => Ok(Self::NO),
            "NC" => Ok(Self::NC),
            _ => Err(format!("unknown ContactLogic: {s:?}, expected \"NO\" or \"NC\"")),
        }
    }
}

// ─── ControlKind ────────────────────────────────────────────────────

/// How a panel control reacts to operator events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Active only while held.
    Momentary,
    /// Flips on each press (selector switch, manual sensor).
    Latching,
    /// Two-position sensor; activating it forces its partner off.
    Interlocked,
    /// Emergency stop mushroom button with latch.
    EmergencyStop,
    /// Illuminated reset button acknowledging the e-stop.
    Reset,
    /// Written only by the panel logic, never directly by the operator.
    Driven,
    /// Analog channel fed from operator text.
    AnalogEntry,
    /// Analog channel fed by the position simulator.
    Simulated,
}

// ─── SignalId ───────────────────────────────────────────────────────

/// Identity of every signal of the manufacturing cell.
///
/// Tags follow the wiring diagram: `S` push buttons and switches, `B`
/// sensors, `F` protective devices, `P`/`H` lamps and horn, `Q` motor
/// contactors, `Y` valve solenoids, `K` relays, `IW` analog input words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalId {
    // ── Operator controls (Input Area) ──
    /// S1
    Start,
    /// S2
    Stop,
    /// S0
    EmergencyStop,
    /// F9
    SafetyRelay,
    /// S12
    Reset,
    /// S3
    AutoMode,
    /// S4
    JogLeft,
    /// S5
    JogRight,
    /// S6
    Acknowledge,

    // ── Sensors (Input Area) ──
    /// B1
    PartPresent,
    /// B2
    PressureSwitch,
    /// B3
    CarriageLeft,
    /// B4
    CarriageRight,
    /// B5
    Cylinder1Retracted,
    /// B6
    Cylinder1Extended,
    /// B7
    Cylinder2Retracted,
    /// B8
    Cylinder2Extended,
    /// B9
    LightBarrier,

    // ── Analog channels (Input Area words) ──
    /// IW6
    TemperatureSetpoint,
    /// IW8
    PositionFeedback,

    // ── Controller outputs (Output Area) ──
    /// P1
    RunLamp,
    /// P2
    FaultLamp,
    /// P3
    AutoLamp,
    /// Q1
    MotorRightSlow,
    /// Q2
    MotorLeftSlow,
    /// Q3
    MotorRightFast,
    /// Y1
    Cylinder1Extend,
    /// Y2
    Cylinder1Retract,
    /// Y3
    Cylinder2Extend,
    /// Y4
    Cylinder2Retract,
    /// K1
    Heater,
    /// H1
    Horn,
}

impl SignalId {
    /// Every signal, in table order.
    pub const ALL: [SignalId; 32] = [
        Self::Start,
        Self::Stop,
        Self::EmergencyStop,
        Self::SafetyRelay,
        Self::Reset,
        Self::AutoMode,
        Self::JogLeft,
        Self::JogRight,
        Self::Acknowledge,
        Self::PartPresent,
        Self::PressureSwitch,
        Self::CarriageLeft,
        Self::CarriageRight,
        Self::Cylinder1Retracted,
        Self::Cylinder1Extended,
        Self::Cylinder2Retracted,
        Self::Cylinder2Extended,
        Self::LightBarrier,
        Self::TemperatureSetpoint,
        Self::PositionFeedback,
        Self::RunLamp,
        Self::FaultLamp,
        Self::AutoLamp,
        Self::MotorRightSlow,
        Self::MotorLeftSlow,
        Self::MotorRightFast,
        Self::Cylinder1Extend,
        Self::Cylinder1Retract,
        Self::Cylinder2Extend,
        Self::Cylinder2Retract,
        Self::Heater,
        Self::Horn,
    ];

    /// Wiring-diagram tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Start => "S1",
            Self::Stop => "S2",
            Self::EmergencyStop => "S0",
            Self::SafetyRelay => "F9",
            Self::Reset => "S12",
            Self::AutoMode => "S3",
            Self::JogLeft => "S4",
            Self::JogRight => "S5",
            Self::Acknowledge => "S6",
            Self::PartPresent => "B1",
            Self::PressureSwitch => "B2",
            Self::CarriageLeft => "B3",
            Self::CarriageRight => "B4",
            Self::Cylinder1Retracted => "B5",
            Self::Cylinder1Extended => "B6",
            Self::Cylinder2Retracted => "B7",
            Self::Cylinder2Extended => "B8",
            Self::LightBarrier => "B9",
            Self::TemperatureSetpoint => "IW6",
            Self::PositionFeedback => "IW8",
            Self::RunLamp => "P1",
            Self::FaultLamp => "P2",
            Self::AutoLamp => "P3",
            Self::MotorRightSlow => "Q1",
            Self::MotorLeftSlow => "Q2",
            Self::MotorRightFast => "Q3",
            Self::Cylinder1Extend => "Y1",
            Self::Cylinder1Retract => "Y2",
            Self::Cylinder2Extend => "Y3",
            Self::Cylinder2Retract => "Y4",
            Self::Heater => "K1",
            Self::Horn => "H1",
        }
    }

    /// The I/O type this signal must be bound to.
    pub const fn expected_type(self) -> SignalType {
        match self {
            Self::TemperatureSetpoint | Self::PositionFeedback => SignalType::Ai,
            Self::RunLamp
            | Self::FaultLamp
            | Self::AutoLamp
            | Self::MotorRightSlow
            | Self::MotorLeftSlow
            | Self::MotorRightFast
            | Self::Cylinder1Extend
            | Self::Cylinder1Retract
            | Self::Cylinder2Extend
            | Self::Cylinder2Retract
            | Self::Heater
            | Self::Horn => SignalType::Do,
            _ => SignalType::Di,
        }
    }

    /// Panel behavior of an input signal; `None` for controller outputs.
    pub const fn control(self) -> Option<ControlKind> {
        let kind = match self {
            Self::Start | Self::Stop | Self::JogLeft | Self::JogRight | Self::Acknowledge => {
                ControlKind::Momentary
            }
            Self::EmergencyStop => ControlKind::EmergencyStop,
            Self::Reset => ControlKind::Reset,
            Self::SafetyRelay => ControlKind::Driven,
            Self::AutoMode
            | Self::PartPresent
            | Self::PressureSwitch
            | Self::CarriageLeft
            | Self::CarriageRight
            | Self::LightBarrier => ControlKind::Latching,
            Self::Cylinder1Retracted
            | Self::Cylinder1Extended
            | Self::Cylinder2Retracted
            | Self::Cylinder2Extended => ControlKind::Interlocked,
            Self::TemperatureSetpoint => ControlKind::AnalogEntry,
            Self::PositionFeedback => ControlKind::Simulated,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SignalId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown signal tag: {s:?}"))
    }
}
