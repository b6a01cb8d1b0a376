//! Address table configuration structs.
//!
//! Deserialized from `io.toml` at startup. Each group contains an array of
//! I/O points; every point binds one signal tag to a coordinate.

use serde::{Deserialize, Serialize};

use super::signal::{ContactLogic, SignalType};

// ─── IoPoint ────────────────────────────────────────────────────────

/// A single I/O point definition from `io.toml`.
///
/// `bit` is required for `di`/`do` points and rejected for `ai` words;
/// this is validated when the address map is built, not at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoPoint {
    /// I/O type discriminator.
    #[serde(rename = "type")]
    pub io_type: SignalType,

    /// Wiring-diagram tag (parsed into `SignalId` at map construction).
    pub tag: String,

    /// Byte offset inside the area selected by `io_type`.
    pub byte: usize,

    /// Bit offset (discrete points only).
    #[serde(default)]
    pub bit: Option<u8>,

    /// NO (Normally Open) or NC (Normally Closed). Default: NO.
    #[serde(default)]
    pub logic: Option<ContactLogic>,

    /// Human-readable display name.
    #[serde(default)]
    pub name: Option<String>,
}

// ─── IoGroup ────────────────────────────────────────────────────────

/// A named group of I/O points from `io.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoGroup {
    /// Group display name.
    #[serde(default)]
    pub name: Option<String>,

    /// I/O points in this group.
    pub io: Vec<IoPoint>,
}

// ─── IoConfig ───────────────────────────────────────────────────────

/// Top-level address table configuration.
///
/// The TOML file is a map of group keys to `IoGroup` structs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoConfig {
    /// Groups by key.
    #[serde(flatten)]
    pub groups: std::collections::BTreeMap<String, IoGroup>,
}

impl IoConfig {
    /// Parse from TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Iterate all I/O points with their group key.
    pub fn all_points(&self) -> impl Iterator<Item = (&str, &IoPoint)> {
        self.groups
            .iter()
            .flat_map(|(key, group)| group.io.iter().map(move |point| (key.as_str(), point)))
    }
}
