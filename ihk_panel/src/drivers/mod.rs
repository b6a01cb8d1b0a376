//! Controller backends.
//!
//! - [`simulation`] - in-process controller image for development and tests
//!
//! A live PLC backend implements [`ihk_common::controller::ControllerIo`]
//! the same way and is handed to [`crate::bridge::Bridge::new`].

pub mod simulation;

pub use simulation::SimulatedController;
