//! Controller I/O error types.

use thiserror::Error;

use crate::image::{Area, Location};

/// Error types for memory-image access.
///
/// Every bit/word operation against the controller image returns one of
/// these; no operation panics on a bad address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    /// Coordinate lies outside the area. Programming error: the address map
    /// is validated at startup, so this never occurs for mapped signals.
    #[error("Address {area}:{location} out of range (area is {len} bytes)")]
    AddressOutOfRange {
        /// Area that was addressed
        area: Area,
        /// Offending coordinate
        location: Location,
        /// Length of the area in bytes
        len: usize,
    },

    /// No controller runtime attached.
    #[error("Controller not connected")]
    NotConnected,

    /// Underlying read/write against the controller runtime failed.
    #[error("Controller communication error: {0}")]
    Communication(String),
}

impl IoError {
    /// Whether this error is a transient communication problem (as opposed
    /// to a programming error in the address table).
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::AddressOutOfRange { .. })
    }
}
