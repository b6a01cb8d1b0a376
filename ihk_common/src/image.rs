//! Memory image of the controller's I/O areas.
//!
//! Two fixed-size byte buffers with bounds-checked bit and word access:
//!
//! - **Input Area**: written by the panel, read by the controller
//! - **Output Area**: written by the controller, read by the panel
//!
//! ## Addressing
//!
//! Discrete points use `byte.bit` notation. Bit 0 is the least significant
//! bit of its byte, so `4.1` and `4.7` are distinct points of byte 4.
//! Analog words are two bytes wide and stored big-endian (most significant
//! byte at the lower offset).

use core::fmt;

use crate::consts::{BITS_PER_BYTE, INPUT_AREA_LEN, OUTPUT_AREA_LEN, WORD_WIDTH};
use crate::error::IoError;

// ─── Area ───────────────────────────────────────────────────────────

/// One of the two I/O areas of the controller image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Area {
    /// Panel → controller.
    Input,
    /// Controller → panel.
    Output,
}

impl Area {
    /// Length of the area in bytes.
    pub const fn byte_len(self) -> usize {
        match self {
            Self::Input => INPUT_AREA_LEN,
            Self::Output => OUTPUT_AREA_LEN,
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

// ─── Location ───────────────────────────────────────────────────────

/// Coordinate of a signal inside an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    /// Single bit at `byte.bit`.
    Bit {
        /// Byte offset
        byte: usize,
        /// Bit offset, 0 = least significant
        bit: u8,
    },
    /// Two-byte word starting at `byte`.
    Word {
        /// Byte offset of the most significant byte
        byte: usize,
    },
}

impl Location {
    /// Byte offsets covered by this location.
    pub fn bytes(self) -> core::ops::Range<usize> {
        match self {
            Self::Bit { byte, .. } => byte..byte + 1,
            Self::Word { byte } => byte..byte + WORD_WIDTH,
        }
    }

    /// Check the coordinate against the bounds of `area`.
    pub fn check(self, area: Area) -> Result<(), IoError> {
        let in_range = match self {
            Self::Bit { byte, bit } => byte < area.byte_len() && bit < BITS_PER_BYTE,
            Self::Word { byte } => byte
                .checked_add(WORD_WIDTH)
                .is_some_and(|end| end <= area.byte_len()),
        };
        if in_range {
            Ok(())
        } else {
            Err(IoError::AddressOutOfRange {
                area,
                location: self,
                len: area.byte_len(),
            })
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bit { byte, bit } => write!(f, "{byte}.{bit}"),
            Self::Word { byte } => write!(f, "W{byte}"),
        }
    }
}

// ─── Bit helpers ────────────────────────────────────────────────────

/// Read bit `bit` of `byte` (0 = least significant).
#[inline]
pub fn get_bit(byte: u8, bit: u8) -> bool {
    (byte >> bit) & 1 == 1
}

/// Return `byte` with bit `bit` set to `value`; all other bits untouched.
#[inline]
pub fn with_bit(byte: u8, bit: u8, value: bool) -> u8 {
    if value {
        byte | (1u8 << bit)
    } else {
        byte & !(1u8 << bit)
    }
}

// ─── MemoryImage ────────────────────────────────────────────────────

/// Input and Output Area of the controller image.
///
/// Accessed only through the bit/word operations below; there is no raw
/// mutable buffer access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    input: [u8; INPUT_AREA_LEN],
    output: [u8; OUTPUT_AREA_LEN],
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryImage {
    /// Create a zeroed image.
    pub const fn new() -> Self {
        Self {
            input: [0; INPUT_AREA_LEN],
            output: [0; OUTPUT_AREA_LEN],
        }
    }

    fn area(&self, area: Area) -> &[u8] {
        match area {
            Area::Input => &self.input,
            Area::Output => &self.output,
        }
    }

    fn area_mut(&mut self, area: Area) -> &mut [u8] {
        match area {
            Area::Input => &mut self.input,
            Area::Output => &mut self.output,
        }
    }

    /// Read a single bit. Non-destructive.
    pub fn read_bit(&self, area: Area, byte: usize, bit: u8) -> Result<bool, IoError> {
        Location::Bit { byte, bit }.check(area)?;
        Ok(get_bit(self.area(area)[byte], bit))
    }

    /// Write a single bit, leaving the other seven bits of the byte as they were.
    pub fn write_bit(&mut self, area: Area, byte: usize, bit: u8, value: bool) -> Result<(), IoError> {
        Location::Bit { byte, bit }.check(area)?;
        let slot = &mut self.area_mut(area)[byte];
        *slot = with_bit(*slot, bit, value);
        Ok(())
    }

    /// Read a two-byte word as stored (big-endian byte order).
    pub fn read_word(&self, area: Area, byte: usize) -> Result<[u8; WORD_WIDTH], IoError> {
        Location::Word { byte }.check(area)?;
        let data = self.area(area);
        Ok([data[byte], data[byte + 1]])
    }

    /// Write a two-byte word. `bytes[0]` lands at `byte`, `bytes[1]` at `byte + 1`.
    pub fn write_word(&mut self, area: Area, byte: usize, bytes: [u8; WORD_WIDTH]) -> Result<(), IoError> {
        Location::Word { byte }.check(area)?;
        self.area_mut(area)[byte..byte + WORD_WIDTH].copy_from_slice(&bytes);
        Ok(())
    }

    /// Number of set bits in an area (diagnostics).
    pub fn count_set(&self, area: Area) -> u32 {
        self.area(area).iter().map(|b| b.count_ones()).sum()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
