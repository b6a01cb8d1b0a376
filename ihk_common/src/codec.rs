//! Analog codec for the Input Area words.
//!
//! Analog channels are signed 16-bit values transmitted big-endian (most
//! significant byte first) regardless of host byte order.
//!
//! | Channel | Word | Value sent |
//! |---------|------|------------|
//! | Temperature setpoint | IW6 | operator-entered integer |
//! | Position feedback | IW8 | `27648 - position` (inverted transducer) |

use thiserror::Error;

use crate::consts::{POSITION_MAX, WORD_WIDTH};
use crate::io::signal::SignalId;

/// Operator text that is not a valid integer. Recovered locally as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid numeric input {text:?}")]
pub struct InvalidUserInput {
    /// The rejected text.
    pub text: String,
}

/// Analog channels of the Input Area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogChannel {
    /// IW6, fed from operator text.
    TemperatureSetpoint,
    /// IW8, fed by the position simulator.
    PositionFeedback,
}

impl AnalogChannel {
    /// Signal this channel is bound to in the address map.
    pub const fn signal(self) -> SignalId {
        match self {
            Self::TemperatureSetpoint => SignalId::TemperatureSetpoint,
            Self::PositionFeedback => SignalId::PositionFeedback,
        }
    }
}

/// Encode a signed 16-bit value as big-endian wire bytes.
#[inline]
pub fn encode_word(value: i16) -> [u8; WORD_WIDTH] {
    value.to_be_bytes()
}

/// Decode big-endian wire bytes into a signed 16-bit value.
#[inline]
pub fn decode_word(bytes: [u8; WORD_WIDTH]) -> i16 {
    i16::from_be_bytes(bytes)
}

/// Feedback value reported for a position: `27648 - position`, wrapped to
/// 16 bits for positions outside the sensor range.
#[inline]
pub fn position_feedback(position: i32) -> i16 {
    POSITION_MAX.wrapping_sub(position) as i16
}

/// Parse a temperature setpoint entered as text.
pub fn parse_setpoint(text: &str) -> Result<i16, InvalidUserInput> {
    text.trim().parse::<i16>().map_err(|_| InvalidUserInput {
        text: text.to_string(),
    })
}

/// Parse the motor speed entered as text.
///
/// Unparsable or negative input yields 0 (no movement).
pub fn parse_speed(text: &str) -> i32 {
    text.trim().parse::<i32>().map_or(0, |speed| speed.max(0))
}
