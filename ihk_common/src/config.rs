//! Configuration loading traits and types.
//!
//! The panel reads two TOML files from its configuration directory:
//!
//! - `panel.toml`: logging, polling period, simulation options (required)
//! - `io.toml`: the address table (optional; the built-in table is used
//!   when the file is absent)
//!
//! # Usage
//!
//! ```rust,no_run
//! use ihk_common::config::{load_config_dir, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let loaded = load_config_dir(Path::new("config"))?;
//!     println!("Service: {}", loaded.panel.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::consts::{CYCLE_PERIOD_MS, DEFAULT_SPEED, POSITION_MAX};
use crate::io::config::IoConfig;
use crate::io::map::AddressMap;
use crate::io::signal::{ContactLogic, SignalId};

/// Panel configuration file name.
pub const PANEL_CONFIG_FILE: &str = "panel.toml";

/// Address table file name.
pub const IO_CONFIG_FILE: &str = "io.toml";

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "ihk-panel-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Polling cycle timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleConfig {
    /// Tick period in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

fn default_period_ms() -> u64 {
    CYCLE_PERIOD_MS
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_ms: CYCLE_PERIOD_MS,
        }
    }
}

/// Simulation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Initial motor speed (position units per tick).
    #[serde(default = "default_speed")]
    pub speed: i32,

    /// Position forced when the modeled cylinder's extend output engages.
    /// Unset: the extend output does not force the position.
    #[serde(default)]
    pub extend_setpoint: Option<i32>,

    /// Treat the pressure switch (B2) as normally closed.
    #[serde(default)]
    pub pressure_switch_inverted: bool,

    /// Drive the cylinder end-position sensors from the valve outputs.
    #[serde(default)]
    pub cylinder_feedback: bool,
}

fn default_speed() -> i32 {
    DEFAULT_SPEED
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            extend_setpoint: None,
            pressure_switch_inverted: false,
            cylinder_feedback: false,
        }
    }
}

/// Contents of `panel.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelConfig {
    /// Logging and identity.
    pub shared: SharedConfig,
    /// Polling cycle.
    #[serde(default)]
    pub cycle: CycleConfig,
    /// Simulation options.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig {
                log_level: LogLevel::Info,
                service_name: "ihk-panel".to_string(),
            },
            cycle: CycleConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl PanelConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.cycle.period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "cycle.period_ms must be greater than 0".to_string(),
            ));
        }
        if self.simulation.speed < 0 {
            return Err(ConfigError::ValidationError(format!(
                "simulation.speed must not be negative, got {}",
                self.simulation.speed
            )));
        }
        if let Some(setpoint) = self.simulation.extend_setpoint {
            if !(0..=POSITION_MAX).contains(&setpoint) {
                return Err(ConfigError::ValidationError(format!(
                    "simulation.extend_setpoint {setpoint} outside [0, {POSITION_MAX}]"
                )));
            }
        }
        Ok(())
    }

    /// Apply the signal-level overrides of `[simulation]` to an address map.
    pub fn apply_overrides(&self, map: &mut AddressMap) {
        if self.simulation.pressure_switch_inverted {
            map.set_logic(SignalId::PressureSwitch, ContactLogic::NC);
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Everything loaded from a configuration directory.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Contents of `panel.toml`.
    pub panel: PanelConfig,
    /// Validated address map as listed in `io.toml` (overrides not applied).
    pub map: AddressMap,
}

/// Load `panel.toml` and `io.toml` from `dir`.
///
/// A missing `io.toml` selects the built-in address table. An `io.toml` that
/// is present but invalid is an error: a wrong address silently breaks the
/// controller program.
pub fn load_config_dir(dir: &Path) -> Result<LoadedConfig, ConfigError> {
    let panel = PanelConfig::load(&dir.join(PANEL_CONFIG_FILE))?;
    panel.validate()?;

    let io_path = dir.join(IO_CONFIG_FILE);
    let map = match IoConfig::load(&io_path) {
        Ok(io_config) => AddressMap::from_config(&io_config)
            .map_err(|e| ConfigError::ValidationError(format!("{}: {e}", io_path.display())))?,
        Err(ConfigError::FileNotFound) => {
            info!("No {} found, using built-in address table", IO_CONFIG_FILE);
            AddressMap::standard()
        }
        Err(e) => return Err(e),
    };

    Ok(LoadedConfig { panel, map })
}
