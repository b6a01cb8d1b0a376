//! # IHK Panel Library
//!
//! Operator-panel bridge for the IHK manufacturing cell: maps panel controls
//! onto the controller's Input Area, mirrors the Output Area back onto panel
//! lamps and simulates the axis position sensor from the motor outputs.
//!
//! # Module Structure
//!
//! - [`bridge`] - `Bridge` context object, panel events, tick sequence
//! - [`cycle`] - Polling cycle state and statistics
//! - [`display`] - Display state handed to the UI
//! - [`drivers`] - Controller backends
//! - [`estop`] - Emergency-stop latch
//! - [`interlock`] - Mutually exclusive sensor pairs
//! - [`position`] - Position simulator
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          ihk_panel                           │
//! │  PanelEvent ──► ┌──────────────────────────┐                 │
//! │                 │          Bridge          │  Input Area     │
//! │  PanelDisplay ◄─│  Interlock  EStopLatch   │────────────►┌──────────────┐
//! │                 │  Position   PollingCycle │             │ ControllerIo │
//! │       tick() ──►│                          │◄────────────└──────────────┘
//! │                 └──────────────────────────┘  Output Area    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod bridge;
pub mod cycle;
pub mod display;
pub mod drivers;
pub mod error;
pub mod estop;
pub mod interlock;
pub mod position;

// Re-export key types for convenience
pub use crate::bridge::{Bridge, PanelEvent};
pub use crate::cycle::{CycleState, CycleStats, TickOutcome};
pub use crate::display::{CylinderIndicator, MotorIndicator, PanelDisplay};
pub use crate::drivers::SimulatedController;
pub use crate::error::BridgeError;
pub use crate::estop::ResetLamp;
pub use crate::position::MotorCommand;
