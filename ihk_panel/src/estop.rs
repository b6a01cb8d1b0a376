//! Emergency-stop latch.
//!
//! The safety relay F9 drops out whenever the e-stop S0 is pressed and only
//! re-engages through the reset button S12 once S0 has been released.
//!
//! ```text
//!   press S0 ──► [Pressed]  F9 off, reset lamp lit
//!                   │ release S0
//!                   ▼
//!               [Released] F9 off, reset lamp blinking
//!                   │ press S12
//!                   ▼
//!               [Armed]    F9 on, reset lamp off
//! ```

use tracing::{info, warn};

/// Indicator inside the reset button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetLamp {
    /// E-stop is held down.
    Lit,
    /// E-stop released, reset pending.
    Blinking,
    /// Safety relay engaged.
    Off,
}

/// E-stop and safety-relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EStopLatch {
    pressed: bool,
    relay: bool,
}

impl Default for EStopLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EStopLatch {
    /// Power-up state: e-stop pressed, relay dropped out.
    pub const fn new() -> Self {
        Self {
            pressed: true,
            relay: false,
        }
    }

    /// S0 held down.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// F9 engaged.
    pub fn relay_engaged(&self) -> bool {
        self.relay
    }

    /// Press S0. Always drops the relay.
    pub fn press(&mut self) {
        if self.relay {
            warn!("Emergency stop pressed, safety relay dropped out");
        }
        self.pressed = true;
        self.relay = false;
    }

    /// Release S0. The relay stays off until reset.
    pub fn release(&mut self) {
        self.pressed = false;
    }

    /// Press S12. Returns `true` if the relay was re-engaged.
    pub fn reset(&mut self) -> bool {
        if self.pressed || self.relay {
            return false;
        }
        self.relay = true;
        info!("Safety relay re-engaged");
        true
    }

    /// Reset lamp state.
    pub fn lamp(&self) -> ResetLamp {
        match (self.pressed, self.relay) {
            (true, _) => ResetLamp::Lit,
            (false, false) => ResetLamp::Blinking,
            (false, true) => ResetLamp::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_up_state() {
        let latch = EStopLatch::new();
        assert!(latch.is_pressed());
        assert!(!latch.relay_engaged());
        assert_eq!(latch.lamp(), ResetLamp::Lit);
    }

    #[test]
    fn test_reset_requires_release() {
        let mut latch = EStopLatch::new();
        assert!(!latch.reset());
        assert_eq!(latch.lamp(), ResetLamp::Lit);

        latch.release();
        assert_eq!(latch.lamp(), ResetLamp::Blinking);
        assert!(latch.reset());
        assert!(latch.relay_engaged());
        assert_eq!(latch.lamp(), ResetLamp::Off);

        // Second reset is a no-op.
        assert!(!latch.reset());
    }

    #[test]
    fn test_press_drops_relay() {
        let mut latch = EStopLatch::new();
        latch.release();
        latch.reset();
        latch.press();
        assert!(!latch.relay_engaged());
        assert_eq!(latch.lamp(), ResetLamp::Lit);

        latch.release();
        assert!(!latch.relay_engaged());
        assert_eq!(latch.lamp(), ResetLamp::Blinking);
    }
}
