//! Prelude module for common re-exports.
//!
//! ```rust
//! use ihk_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, LoadedConfig, LogLevel, PanelConfig, SharedConfig, load_config_dir,
};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{CYCLE_PERIOD_MS, POSITION_MAX};

// ─── Memory image ───────────────────────────────────────────────────
pub use crate::controller::ControllerIo;
pub use crate::error::IoError;
pub use crate::image::{Area, Location, MemoryImage};

// ─── I/O ────────────────────────────────────────────────────────────
pub use crate::io::map::{AddressMap, AddressMapError, Signal};
pub use crate::io::signal::{ContactLogic, ControlKind, SignalId, SignalType};

// ─── Analog ─────────────────────────────────────────────────────────
pub use crate::codec::{AnalogChannel, InvalidUserInput};
