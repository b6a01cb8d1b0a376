//! In-process controller simulation.
//!
//! Holds the memory image locally. Tests and the binary play the role of
//! the controller program by setting Output Area bits directly. Connection
//! loss and transport errors can be injected to exercise failure paths.

use ihk_common::consts::WORD_WIDTH;
use ihk_common::controller::ControllerIo;
use ihk_common::error::IoError;
use ihk_common::image::{Area, Location, MemoryImage};
use ihk_common::io::map::AddressMap;
use ihk_common::io::signal::{SignalId, SignalType};
use tracing::debug;

/// Simulated controller runtime.
#[derive(Debug, Clone)]
pub struct SimulatedController {
    image: MemoryImage,
    connected: bool,
    /// Fail this many further operations before recovering.
    pending_faults: u32,
    /// Operations left to succeed before a single injected failure.
    fault_countdown: Option<u32>,
    /// Reject every word write (bit access unaffected).
    fail_word_writes: bool,
    reads: u64,
    writes: u64,
}

impl Default for SimulatedController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedController {
    /// Connected controller with a zeroed image.
    pub fn new() -> Self {
        Self {
            image: MemoryImage::new(),
            connected: true,
            pending_faults: 0,
            fault_countdown: None,
            fail_word_writes: false,
            reads: 0,
            writes: 0,
        }
    }

    /// The backing image.
    pub fn image(&self) -> &MemoryImage {
        &self.image
    }

    /// Mutable backing image (controller-program side).
    pub fn image_mut(&mut self) -> &mut MemoryImage {
        &mut self.image
    }

    /// Drop the connection.
    pub fn disconnect(&mut self) {
        debug!("Simulated controller disconnected");
        self.connected = false;
    }

    /// Restore the connection.
    pub fn connect(&mut self) {
        self.connected = true;
    }

    /// Make the next `count` operations fail with a communication error.
    pub fn inject_faults(&mut self, count: u32) {
        self.pending_faults = count;
    }

    /// Let `skip` operations succeed, then fail exactly one.
    pub fn inject_fault_after(&mut self, skip: u32) {
        self.fault_countdown = Some(skip);
    }

    /// Reject all word writes.
    pub fn set_fail_word_writes(&mut self, fail: bool) {
        self.fail_word_writes = fail;
    }

    /// Completed reads.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Completed writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Set a controller output the way the controller program would, using
    /// the physical bit level implied by the signal's contact logic.
    pub fn set_output(&mut self, map: &AddressMap, id: SignalId, active: bool) -> Result<(), IoError> {
        let signal = map.signal(id);
        if signal.signal_type != SignalType::Do {
            return Err(IoError::Communication(format!(
                "{id} is not a controller output"
            )));
        }
        let Location::Bit { byte, bit } = signal.location else {
            return Err(IoError::Communication(format!("{id} is not a bit")));
        };
        self.image
            .write_bit(Area::Output, byte, bit, signal.logic.to_bit(active))
    }

    /// Physical level of a mapped input bit, for inspection.
    pub fn input_bit(&self, map: &AddressMap, id: SignalId) -> Result<bool, IoError> {
        match map.signal(id).location {
            Location::Bit { byte, bit } => self.image.read_bit(Area::Input, byte, bit),
            Location::Word { .. } => Err(IoError::Communication(format!("{id} is not a bit"))),
        }
    }

    fn check(&mut self) -> Result<(), IoError> {
        if !self.connected {
            return Err(IoError::NotConnected);
        }
        if self.pending_faults > 0 {
            self.pending_faults -= 1;
            return Err(IoError::Communication("injected fault".to_string()));
        }
        match self.fault_countdown {
            Some(0) => {
                self.fault_countdown = None;
                Err(IoError::Communication("injected fault".to_string()))
            }
            Some(n) => {
                self.fault_countdown = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ControllerIo for SimulatedController {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn read_bit(&mut self, area: Area, byte: usize, bit: u8) -> Result<bool, IoError> {
        self.check()?;
        let value = self.image.read_bit(area, byte, bit)?;
        self.reads += 1;
        Ok(value)
    }

    fn write_bit(&mut self, area: Area, byte: usize, bit: u8, value: bool) -> Result<(), IoError> {
        self.check()?;
        self.image.write_bit(area, byte, bit, value)?;
        self.writes += 1;
        Ok(())
    }

    fn write_word(&mut self, area: Area, byte: usize, bytes: [u8; WORD_WIDTH]) -> Result<(), IoError> {
        self.check()?;
        if self.fail_word_writes {
            return Err(IoError::Communication("word write rejected".to_string()));
        }
        self.image.write_word(area, byte, bytes)?;
        self.writes += 1;
        Ok(())
    }
}
