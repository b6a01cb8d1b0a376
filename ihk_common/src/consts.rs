//! Panel-wide constants.
//!
//! Single source of truth for area sizes, analog ranges and timing.
//! Shared by both crates; values are defined here only.

use static_assertions::const_assert;

/// Input Area length in bytes (panel → controller).
///
/// Highest discrete address is 5.4; the analog word at offset 8 occupies
/// bytes 8 and 9.
pub const INPUT_AREA_LEN: usize = 10;

/// Output Area length in bytes (controller → panel).
///
/// Highest discrete address is 4.6.
pub const OUTPUT_AREA_LEN: usize = 5;

/// Number of addressable bits in one byte.
pub const BITS_PER_BYTE: u8 = 8;

/// Width of an analog channel in bytes.
pub const WORD_WIDTH: usize = 2;

/// Byte offset of the temperature setpoint word (IW6).
pub const TEMPERATURE_WORD_OFFSET: usize = 6;

/// Byte offset of the position feedback word (IW8).
pub const POSITION_WORD_OFFSET: usize = 8;

/// Full-scale value of the simulated position sensor.
pub const POSITION_MAX: i32 = 27_648;

/// Distance below [`POSITION_MAX`] at which rightward travel snaps to the end stop.
pub const RAMP_WINDOW: i32 = 600;

/// Candidate position at or above which rightward travel snaps to [`POSITION_MAX`].
pub const RAMP_THRESHOLD: i32 = POSITION_MAX - RAMP_WINDOW;

/// Position forced when the modeled cylinder's retract output engages.
pub const RETRACT_SETPOINT: i32 = 27_048;

/// Position documented for the modeled cylinder's extend output.
pub const EXTEND_SETPOINT: i32 = 600;

/// Default polling period in milliseconds.
pub const CYCLE_PERIOD_MS: u64 = 500;

/// Default motor speed (position units per tick).
pub const DEFAULT_SPEED: i32 = 100;

/// Default configuration directory path.
pub const DEFAULT_CONFIG_PATH: &str = "config";

const_assert!(TEMPERATURE_WORD_OFFSET + WORD_WIDTH <= INPUT_AREA_LEN);
const_assert!(POSITION_WORD_OFFSET + WORD_WIDTH <= INPUT_AREA_LEN);
const_assert!(POSITION_MAX <= i16::MAX as i32);
const_assert!(RETRACT_SETPOINT <= POSITION_MAX);
