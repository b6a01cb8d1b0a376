//! Bridge error types.

use ihk_common::error::IoError;
use ihk_common::io::map::AddressMapError;
use ihk_common::io::signal::SignalId;
use thiserror::Error;

use crate::interlock::InterlockError;

/// Errors returned by [`crate::bridge::Bridge`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Controller read or write failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// The address table handed to the bridge is invalid.
    #[error("Invalid address map: {0}")]
    AddressMap(#[from] AddressMapError),

    /// The interlock pair table is invalid.
    #[error("Invalid interlock table: {0}")]
    Interlock(#[from] InterlockError),

    /// Event targets a signal the operator cannot actuate (driven relay,
    /// analog channel or controller output).
    #[error("{0} is not an operator control")]
    NotAPanelControl(SignalId),

    /// Discrete operation on a signal not bound to a single bit.
    #[error("{0} is not mapped to a single bit")]
    NotDiscrete(SignalId),

    /// The polling cycle has stopped and cannot be re-attached.
    #[error("Polling cycle has stopped")]
    Stopped,
}
