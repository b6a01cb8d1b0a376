//! Controller I/O contract.
//!
//! The controller runtime (a live PLC or a simulation of one) is the actual
//! backing store of the memory image. The bridge talks to it only through
//! this trait:
//!
//! - `read_bit(area, byte, bit)` - read one discrete point
//! - `write_bit(area, byte, bit, value)` - write one discrete point
//! - `write_word(area, byte, bytes)` - write one big-endian analog word
//!
//! # Failure modes
//!
//! | Error | Meaning |
//! |-------|---------|
//! | `IoError::NotConnected` | No runtime attached |
//! | `IoError::AddressOutOfRange` | Coordinate outside the area |
//! | `IoError::Communication` | Transport failed mid-operation |

use crate::consts::WORD_WIDTH;
use crate::error::IoError;
use crate::image::{Area, MemoryImage};

/// Interface to the controller's memory image.
///
/// Calls are synchronous and bounded; implementations must not block
/// indefinitely.
pub trait ControllerIo {
    /// Short identifier of the backend (e.g. "image", "simulation").
    fn name(&self) -> &'static str;

    /// Whether the backend currently accepts reads and writes.
    fn is_connected(&self) -> bool {
        true
    }

    /// Read one bit.
    fn read_bit(&mut self, area: Area, byte: usize, bit: u8) -> Result<bool, IoError>;

    /// Write one bit.
    fn write_bit(&mut self, area: Area, byte: usize, bit: u8, value: bool) -> Result<(), IoError>;

    /// Write one word; `bytes` is already in wire (big-endian) order.
    fn write_word(&mut self, area: Area, byte: usize, bytes: [u8; WORD_WIDTH]) -> Result<(), IoError>;
}

/// A bare image is an always-connected backend.
impl ControllerIo for MemoryImage {
    fn name(&self) -> &'static str {
        "image"
    }

    fn read_bit(&mut self, area: Area, byte: usize, bit: u8) -> Result<bool, IoError> {
        MemoryImage::read_bit(self, area, byte, bit)
    }

    fn write_bit(&mut self, area: Area, byte: usize, bit: u8, value: bool) -> Result<(), IoError> {
        MemoryImage::write_bit(self, area, byte, bit, value)
    }

    fn write_word(&mut self, area: Area, byte: usize, bytes: [u8; WORD_WIDTH]) -> Result<(), IoError> {
        MemoryImage::write_word(self, area, byte, bytes)
    }
}

impl<C: ControllerIo + ?Sized> ControllerIo for &mut C {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn read_bit(&mut self, area: Area, byte: usize, bit: u8) -> Result<bool, IoError> {
        (**self).read_bit(area, byte, bit)
    }

    fn write_bit(&mut self, area: Area, byte: usize, bit: u8, value: bool) -> Result<(), IoError> {
        (**self).write_bit(area, byte, bit, value)
    }

    fn write_word(&mut self, area: Area, byte: usize, bytes: [u8; WORD_WIDTH]) -> Result<(), IoError> {
        (**self).write_word(area, byte, bytes)
    }
}
