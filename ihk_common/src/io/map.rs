//! Address map. Binds every signal to its coordinate in the controller image.
//!
//! Built once at startup, either from the built-in table or from `io.toml`,
//! and immutable afterwards. Construction runs all validation rules, so a
//! successfully built map is complete (every `SignalId` bound exactly once)
//! and every coordinate lies inside its area.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::IoError;
use crate::image::{Area, Location};

use super::config::{IoConfig, IoPoint};
use super::signal::ContactLogic::{NC, NO};
use super::signal::{ContactLogic, SignalId, SignalType};

// ─── Error Types ────────────────────────────────────────────────────

/// Address table validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressMapError {
    /// Tag string does not name a known signal.
    TagParseError { tag: String, error: String },
    /// Two points bind the same tag.
    TagDuplicate { tag: SignalId },
    /// Tag bound to the wrong I/O type.
    TypeMismatch {
        tag: SignalId,
        expected_type: SignalType,
        actual_type: SignalType,
    },
    /// Discrete point without a bit offset.
    BitMissing { tag: SignalId },
    /// Analog word with a bit offset.
    BitNotAllowed { tag: SignalId },
    /// Coordinate outside its area.
    OutOfRange { tag: SignalId, source: IoError },
    /// Two points claim the same bit.
    AddressOverlap {
        area: Area,
        location: Location,
        tag_a: SignalId,
        tag_b: SignalId,
    },
    /// A signal the panel depends on is not bound.
    SignalMissing { tag: SignalId },
}

impl fmt::Display for AddressMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagParseError { tag, error } => write!(f, "tag parse error for '{tag}': {error}"),
            Self::TagDuplicate { tag } => write!(f, "duplicate tag '{tag}'"),
            Self::TypeMismatch {
                tag,
                expected_type,
                actual_type,
            } => write!(
                f,
                "tag '{tag}' expects {expected_type} but is configured as {actual_type}"
            ),
            Self::BitMissing { tag } => write!(f, "discrete point '{tag}' has no bit offset"),
            Self::BitNotAllowed { tag } => {
                write!(f, "analog word '{tag}' must not have a bit offset")
            }
            Self::OutOfRange { tag, source } => write!(f, "'{tag}': {source}"),
            Self::AddressOverlap {
                area,
                location,
                tag_a,
                tag_b,
            } => write!(
                f,
                "'{tag_a}' and '{tag_b}' overlap at {area}:{location}"
            ),
            Self::SignalMissing { tag } => write!(f, "missing required signal '{tag}'"),
        }
    }
}

impl std::error::Error for AddressMapError {}

// ─── Signal ─────────────────────────────────────────────────────────

/// Runtime binding of a signal to its coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    /// Identity.
    pub id: SignalId,
    /// I/O type (selects area and direction).
    pub signal_type: SignalType,
    /// Coordinate inside the area.
    pub location: Location,
    /// Contact logic. Only meaningful for discrete points.
    pub logic: ContactLogic,
    /// Display name.
    pub name: String,
}

impl Signal {
    /// Area this signal lives in.
    pub fn area(&self) -> Area {
        self.signal_type.area()
    }
}

// ─── Built-in table ─────────────────────────────────────────────────

const fn bit(byte: usize, bit: u8) -> Location {
    Location::Bit { byte, bit }
}

const fn word(byte: usize) -> Location {
    Location::Word { byte }
}

/// The cell's wiring. Must stay bit-exact: the controller program addresses
/// these coordinates directly.
const STANDARD_TABLE: [(SignalId, Location, ContactLogic, &str); 32] = [
    (SignalId::Start, bit(0, 1), NO, "Start"),
    (SignalId::Stop, bit(0, 2), NC, "Stop"),
    (SignalId::EmergencyStop, bit(0, 3), NC, "Emergency stop"),
    (SignalId::SafetyRelay, bit(0, 4), NO, "Safety relay"),
    (SignalId::Reset, bit(0, 5), NO, "Reset"),
    (SignalId::AutoMode, bit(0, 6), NO, "Auto/manual selector"),
    (SignalId::JogLeft, bit(3, 0), NO, "Jog left"),
    (SignalId::JogRight, bit(3, 1), NO, "Jog right"),
    (SignalId::Acknowledge, bit(5, 4), NO, "Acknowledge"),
    (SignalId::PartPresent, bit(1, 0), NO, "Part present"),
    (SignalId::PressureSwitch, bit(1, 1), NO, "Pressure switch"),
    (SignalId::CarriageLeft, bit(1, 2), NO, "Carriage left end"),
    (SignalId::CarriageRight, bit(1, 3), NO, "Carriage right end"),
    (SignalId::Cylinder1Retracted, bit(2, 0), NO, "Cylinder 1 retracted"),
    (SignalId::Cylinder1Extended, bit(2, 1), NO, "Cylinder 1 extended"),
    (SignalId::Cylinder2Retracted, bit(2, 2), NO, "Cylinder 2 retracted"),
    (SignalId::Cylinder2Extended, bit(2, 3), NO, "Cylinder 2 extended"),
    (SignalId::LightBarrier, bit(4, 0), NO, "Light barrier"),
    (SignalId::TemperatureSetpoint, word(6), NO, "Temperature setpoint"),
    (SignalId::PositionFeedback, word(8), NO, "Position feedback"),
    (SignalId::RunLamp, bit(0, 0), NO, "Run lamp"),
    (SignalId::FaultLamp, bit(0, 1), NO, "Fault lamp"),
    (SignalId::AutoLamp, bit(0, 2), NO, "Auto lamp"),
    (SignalId::MotorRightSlow, bit(1, 0), NO, "Motor right slow"),
    (SignalId::MotorLeftSlow, bit(1, 1), NO, "Motor left slow"),
    (SignalId::MotorRightFast, bit(1, 2), NO, "Motor right fast"),
    (SignalId::Cylinder1Extend, bit(2, 0), NO, "Cylinder 1 extend"),
    (SignalId::Cylinder1Retract, bit(2, 1), NO, "Cylinder 1 retract"),
    (SignalId::Cylinder2Extend, bit(3, 0), NO, "Cylinder 2 extend"),
    (SignalId::Cylinder2Retract, bit(3, 1), NO, "Cylinder 2 retract"),
    (SignalId::Heater, bit(4, 0), NO, "Heater"),
    (SignalId::Horn, bit(4, 6), NO, "Horn"),
];

// ─── AddressMap ─────────────────────────────────────────────────────

/// Complete, validated signal → coordinate table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMap {
    /// Indexed by `SignalId as usize` (declaration order of `SignalId::ALL`).
    signals: Vec<Signal>,
}

impl AddressMap {
    /// The built-in wiring of the cell.
    pub fn standard() -> Self {
        let signals = STANDARD_TABLE
            .iter()
            .map(|&(id, location, logic, name)| Signal {
                id,
                signal_type: id.expected_type(),
                location,
                logic,
                name: name.to_string(),
            })
            .collect::<Vec<_>>();
        Self::index(signals)
    }

    /// Build the map from an `IoConfig`, running all validation rules.
    ///
    /// Returns the first validation error encountered.
    pub fn from_config(config: &IoConfig) -> Result<Self, AddressMapError> {
        let signals = config
            .all_points()
            .map(|(_, point)| Self::point_to_signal(point))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_signals(signals)
    }

    /// Validate an arbitrary list of bindings.
    pub fn from_signals(signals: Vec<Signal>) -> Result<Self, AddressMapError> {
        let mut seen: HashSet<SignalId> = HashSet::new();
        // (area, byte, bit) → owner, for overlap detection.
        let mut claimed: HashMap<(Area, usize, u8), SignalId> = HashMap::new();

        for signal in &signals {
            if !seen.insert(signal.id) {
                return Err(AddressMapError::TagDuplicate { tag: signal.id });
            }

            let expected = signal.id.expected_type();
            if expected != signal.signal_type {
                return Err(AddressMapError::TypeMismatch {
                    tag: signal.id,
                    expected_type: expected,
                    actual_type: signal.signal_type,
                });
            }

            match (signal.signal_type, signal.location) {
                (SignalType::Ai, Location::Bit { .. }) => {
                    return Err(AddressMapError::BitNotAllowed { tag: signal.id });
                }
                (SignalType::Di | SignalType::Do, Location::Word { .. }) => {
                    return Err(AddressMapError::BitMissing { tag: signal.id });
                }
                _ => {}
            }

            let area = signal.area();
            signal
                .location
                .check(area)
                .map_err(|source| AddressMapError::OutOfRange {
                    tag: signal.id,
                    source,
                })?;

            for key in claimed_bits(area, signal.location) {
                if let Some(&owner) = claimed.get(&key) {
                    return Err(AddressMapError::AddressOverlap {
                        area,
                        location: signal.location,
                        tag_a: owner,
                        tag_b: signal.id,
                    });
                }
                claimed.insert(key, signal.id);
            }
        }

        if let Some(&tag) = SignalId::ALL.iter().find(|id| !seen.contains(*id)) {
            return Err(AddressMapError::SignalMissing { tag });
        }

        Ok(Self::index(signals))
    }

    fn point_to_signal(point: &IoPoint) -> Result<Signal, AddressMapError> {
        let id: SignalId = point
            .tag
            .parse()
            .map_err(|error| AddressMapError::TagParseError {
                tag: point.tag.clone(),
                error,
            })?;

        let location = match (point.io_type, point.bit) {
            (SignalType::Ai, None) => Location::Word { byte: point.byte },
            (SignalType::Ai, Some(_)) => return Err(AddressMapError::BitNotAllowed { tag: id }),
            (_, Some(bit)) => Location::Bit {
                byte: point.byte,
                bit,
            },
            (_, None) => return Err(AddressMapError::BitMissing { tag: id }),
        };

        Ok(Signal {
            id,
            signal_type: point.io_type,
            location,
            logic: point.logic.unwrap_or_default(),
            name: point.name.clone().unwrap_or_else(|| id.tag().to_string()),
        })
    }

    /// Sort bindings into `SignalId` order. Callers guarantee completeness.
    fn index(mut signals: Vec<Signal>) -> Self {
        signals.sort_by_key(|s| s.id);
        Self { signals }
    }

    /// Binding of `id`.
    pub fn signal(&self, id: SignalId) -> &Signal {
        &self.signals[id as usize]
    }

    /// Override the contact logic of a discrete signal (configuration only).
    pub fn set_logic(&mut self, id: SignalId, logic: ContactLogic) {
        self.signals[id as usize].logic = logic;
    }

    /// All bindings in `SignalId` order.
    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }

    /// Discrete points of the Input Area.
    pub fn discrete_inputs(&self) -> impl Iterator<Item = &Signal> {
        self.signals
            .iter()
            .filter(|s| s.signal_type == SignalType::Di)
    }

    /// Discrete points of the Output Area.
    pub fn discrete_outputs(&self) -> impl Iterator<Item = &Signal> {
        self.signals
            .iter()
            .filter(|s| s.signal_type == SignalType::Do)
    }

    /// Convert the map back into an `IoConfig` with one group per area.
    pub fn to_config(&self) -> IoConfig {
        let mut groups = std::collections::BTreeMap::new();
        for (key, name, ty) in [
            ("Inputs", "Panel controls and sensors", SignalType::Di),
            ("Outputs", "Controller outputs", SignalType::Do),
            ("Analog", "Analog input words", SignalType::Ai),
        ] {
            let io = self
                .signals
                .iter()
                .filter(|s| s.signal_type == ty)
                .map(|s| {
                    let (byte, bit) = match s.location {
                        Location::Bit { byte, bit } => (byte, Some(bit)),
                        Location::Word { byte } => (byte, None),
                    };
                    IoPoint {
                        io_type: s.signal_type,
                        tag: s.id.tag().to_string(),
                        byte,
                        bit,
                        logic: (ty != SignalType::Ai).then_some(s.logic),
                        name: Some(s.name.clone()),
                    }
                })
                .collect();
            groups.insert(
                key.to_string(),
                super::config::IoGroup {
                    name: Some(name.to_string()),
                    io,
                },
            );
        }
        IoConfig { groups }
    }
}

/// Every `(area, byte, bit)` a location occupies.
fn claimed_bits(area: Area, location: Location) -> Vec<(Area, usize, u8)> {
    match location {
        Location::Bit { byte, bit } => vec![(area, byte, bit)],
        Location::Word { .. } => location
            .bytes()
            .flat_map(|byte| (0..8).map(move |bit| (area, byte, bit)))
            .collect(),
    }
}
