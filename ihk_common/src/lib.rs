//! IHK Common Library
//!
//! Shared building blocks of the operator-panel simulator: the controller
//! memory image, the signal address table, the analog codec and
//! configuration loading.
//!
//! # Module Structure
//!
//! - [`consts`] - Area sizes, analog ranges, timing defaults
//! - [`image`] - Input/Output Area with bounds-checked bit and word access
//! - [`controller`] - `ControllerIo` trait implemented by controller backends
//! - [`io`] - Signal identities, `io.toml` structs, the `AddressMap`
//! - [`codec`] - Big-endian analog words and operator text parsing
//! - [`config`] - Configuration loading traits and types
//! - [`error`] - Memory-image access errors
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use ihk_common::prelude::*;
//!
//! let map = AddressMap::standard();
//! let b7 = map.signal(SignalId::Cylinder2Retracted);
//! assert_eq!(b7.location, Location::Bit { byte: 2, bit: 2 });
//! ```

pub mod codec;
pub mod config;
pub mod consts;
pub mod controller;
pub mod error;
pub mod image;
pub mod io;
pub mod prelude;
