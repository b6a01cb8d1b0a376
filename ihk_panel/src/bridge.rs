//! I/O bridge context object.
//!
//! [`Bridge`] owns everything the panel needs: the controller handle, the
//! address map, the local input state, the interlock table, the e-stop
//! latch, the position simulator and the polling cycle. Operator events
//! and timer ticks are both plain method calls on it and run strictly one
//! after another.
//!
//! # Tick sequence
//!
//! 1. Read every discrete output bit and apply its contact logic
//! 2. Derive the motor command from Q1/Q2/Q3
//! 3. Detect rising edges of the cylinder valve outputs (sensor feedback,
//!    position forcing)
//! 4. Step the position simulator unless a forcing event fired
//! 5. Publish a changed position on the feedback word (best effort)
//!
//! A bit read or write failing anywhere in the tick stops the cycle for
//! good. Analog writes never do: their failures are logged and dropped.

use std::collections::BTreeMap;
use std::time::Duration;

use ihk_common::codec::{self, AnalogChannel};
use ihk_common::config::PanelConfig;
use ihk_common::consts::RETRACT_SETPOINT;
use ihk_common::controller::ControllerIo;
use ihk_common::error::IoError;
use ihk_common::image::{Area, Location};
use ihk_common::io::config::IoConfig;
use ihk_common::io::map::AddressMap;
use ihk_common::io::signal::{ControlKind, SignalId};
use tracing::{debug, info, trace, warn};

use crate::cycle::{CycleState, CycleStats, PollingCycle, TickOutcome};
use crate::display::{CylinderIndicator, MotorIndicator, PanelDisplay};
use crate::error::BridgeError;
use crate::estop::EStopLatch;
use crate::interlock::{CYLINDER_INTERLOCKS, InterlockEngine};
use crate::position::{MotorCommand, PositionSimulator};

// ─── Panel events ───────────────────────────────────────────────────

/// Operator input coming from the panel UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// Control actuated (button down, checkbox checked).
    Press(SignalId),
    /// Control released (button up, checkbox cleared).
    Release(SignalId),
    /// Flip the control's current state.
    Toggle(SignalId),
    /// Motor speed text box changed.
    SpeedText(String),
    /// Temperature setpoint text box changed.
    TemperatureText(String),
}

// ─── Cylinders ──────────────────────────────────────────────────────

/// Valve outputs and end-position sensors of one pneumatic cylinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cylinder {
    /// Extend solenoid (output).
    pub extend: SignalId,
    /// Retract solenoid (output).
    pub retract: SignalId,
    /// Retracted end-position sensor (input).
    pub retracted: SignalId,
    /// Extended end-position sensor (input).
    pub extended: SignalId,
    /// Whether this cylinder moves the simulated position sensor.
    pub drives_position: bool,
}

/// Cylinders of the cell; index matches [`PanelDisplay::cylinders`].
pub const CYLINDERS: [Cylinder; 2] = [
    Cylinder {
        extend: SignalId::Cylinder1Extend,
        retract: SignalId::Cylinder1Retract,
        retracted: SignalId::Cylinder1Retracted,
        extended: SignalId::Cylinder1Extended,
        drives_position: false,
    },
    Cylinder {
        extend: SignalId::Cylinder2Extend,
        retract: SignalId::Cylinder2Retract,
        retracted: SignalId::Cylinder2Retracted,
        extended: SignalId::Cylinder2Extended,
        drives_position: true,
    },
];

/// Simulation options taken from `[simulation]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    extend_setpoint: Option<i32>,
    cylinder_feedback: bool,
}

// ─── Bridge ─────────────────────────────────────────────────────────

/// Panel-side owner of the controller I/O image.
pub struct Bridge<C: ControllerIo> {
    controller: C,
    map: AddressMap,
    interlocks: InterlockEngine,
    latch: EStopLatch,
    simulator: PositionSimulator,
    cycle: PollingCycle,
    options: Options,
    /// Logical state of every discrete input.
    inputs: BTreeMap<SignalId, bool>,
    /// Logical state of every discrete output, as of the last tick.
    outputs: BTreeMap<SignalId, bool>,
    temperature: Option<i16>,
    /// Input Area must be pushed again before the next tick.
    resync: bool,
}

impl<C: ControllerIo> Bridge<C> {
    /// Create an idle bridge. Nothing is written until [`Bridge::attach`].
    ///
    /// Signal-level overrides from `config` (pressure switch inversion) are
    /// applied to `map` here.
    pub fn new(controller: C, mut map: AddressMap, config: &PanelConfig) -> Result<Self, BridgeError> {
        config.apply_overrides(&mut map);
        let interlocks = InterlockEngine::new(&CYLINDER_INTERLOCKS)?;
        let inputs = map.discrete_inputs().map(|s| (s.id, false)).collect();
        let outputs = map.discrete_outputs().map(|s| (s.id, false)).collect();

        let mut bridge = Self {
            controller,
            map,
            interlocks,
            latch: EStopLatch::new(),
            simulator: PositionSimulator::new(config.simulation.speed),
            cycle: PollingCycle::new(Duration::from_millis(config.cycle.period_ms)),
            options: Options {
                extend_setpoint: config.simulation.extend_setpoint,
                cylinder_feedback: config.simulation.cylinder_feedback,
            },
            inputs,
            outputs,
            temperature: None,
            resync: false,
        };
        bridge.sync_latch();

        debug!(
            "Bridge created for '{}' controller ({} inputs, {} outputs)",
            bridge.controller.name(),
            bridge.inputs.len(),
            bridge.outputs.len()
        );
        Ok(bridge)
    }

    /// Create a bridge from an unvalidated I/O table.
    pub fn from_io_config(controller: C, io: &IoConfig, config: &PanelConfig) -> Result<Self, BridgeError> {
        let map = AddressMap::from_config(io)?;
        Self::new(controller, map, config)
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Push the complete local input state into the Input Area and start
    /// the polling cycle.
    ///
    /// No-op when already running. A failed attach leaves the cycle idle so
    /// it can be retried.
    pub fn attach(&mut self) -> Result<(), BridgeError> {
        match self.cycle.state() {
            CycleState::Running => return Ok(()),
            CycleState::Stopped => return Err(BridgeError::Stopped),
            CycleState::Idle => {}
        }
        if !self.controller.is_connected() {
            return Err(IoError::NotConnected.into());
        }

        self.push_inputs()?;
        if let Some(value) = self.temperature {
            self.write_analog(AnalogChannel::TemperatureSetpoint, value);
        }
        self.publish_position();

        self.cycle.start();
        info!("Bridge attached to '{}' controller", self.controller.name());
        Ok(())
    }

    /// Stop the polling cycle. Terminal.
    pub fn shutdown(&mut self) {
        self.cycle.stop();
    }

    // ─── Panel events ───────────────────────────────────────────────

    /// Apply one operator event and return the resulting display state.
    ///
    /// Before [`Bridge::attach`] and after the cycle stopped, changes are
    /// kept locally only. While running, a failing write is returned to the
    /// caller; the local state already reflects the request.
    pub fn handle(&mut self, event: PanelEvent) -> Result<PanelDisplay, BridgeError> {
        match event {
            PanelEvent::Press(id) => self.actuate(id, Some(true))?,
            PanelEvent::Release(id) => self.actuate(id, Some(false))?,
            PanelEvent::Toggle(id) => self.actuate(id, None)?,
            PanelEvent::SpeedText(text) => self.simulator.set_speed(codec::parse_speed(&text)),
            PanelEvent::TemperatureText(text) => self.enter_temperature(&text),
        }
        Ok(self.display())
    }

    /// Dispatch on the control kind. `None` toggles.
    fn actuate(&mut self, id: SignalId, requested: Option<bool>) -> Result<(), BridgeError> {
        let kind = id.control().ok_or(BridgeError::NotAPanelControl(id))?;
        let active = requested.unwrap_or(!self.input(id));

        match kind {
            ControlKind::Momentary | ControlKind::Latching => self.commit([(id, active)].into_iter()),
            ControlKind::Interlocked => self.commit(self.interlocks.project(id, active).changes()),
            ControlKind::EmergencyStop => {
                if active {
                    self.latch.press();
                } else {
                    self.latch.release();
                }
                self.commit_latch()
            }
            ControlKind::Reset => {
                self.commit([(id, active)].into_iter())?;
                if active && self.latch.reset() {
                    self.commit_latch()?;
                }
                Ok(())
            }
            ControlKind::Driven | ControlKind::AnalogEntry | ControlKind::Simulated => {
                Err(BridgeError::NotAPanelControl(id))
            }
        }
    }

    fn enter_temperature(&mut self, text: &str) {
        let value = match codec::parse_setpoint(text) {
            Ok(value) => value,
            Err(e) => {
                debug!("{}, temperature setpoint unchanged", e);
                return;
            }
        };
        self.temperature = Some(value);
        if self.cycle.is_running() {
            self.write_analog(AnalogChannel::TemperatureSetpoint, value);
        }
    }

    // ─── Polling cycle ──────────────────────────────────────────────

    /// Run one polling tick.
    ///
    /// Skipped unless the cycle is running. The first failure is returned
    /// once and stops the cycle; later calls report `Skipped(Stopped)`.
    pub fn tick(&mut self) -> Result<TickOutcome, BridgeError> {
        if !self.cycle.is_running() {
            trace!("Tick skipped, cycle {}", self.cycle.state());
            return Ok(TickOutcome::Skipped(self.cycle.state()));
        }

        if let Err(err) = self.run_tick() {
            self.cycle.fail(err.clone());
            return Err(err);
        }
        self.cycle.record_tick();
        Ok(TickOutcome::Completed(self.display()))
    }

    fn run_tick(&mut self) -> Result<(), BridgeError> {
        if self.resync {
            self.push_inputs()?;
            info!("Input Area resynchronized after failed write");
        }

        let previous = self.outputs.clone();
        self.read_outputs()?;

        let motor = self.motor_command();
        if self.apply_cylinder_events(&previous)? {
            self.cycle.stats_mut().forced += 1;
            self.publish_position();
        } else if self.simulator.step(motor).is_some() {
            self.publish_position();
        }
        Ok(())
    }

    fn read_outputs(&mut self) -> Result<(), BridgeError> {
        for signal in self.map.discrete_outputs() {
            let Location::Bit { byte, bit } = signal.location else {
                return Err(BridgeError::NotDiscrete(signal.id));
            };
            let level = self.controller.read_bit(Area::Output, byte, bit)?;
            self.outputs.insert(signal.id, signal.logic.from_bit(level));
        }
        Ok(())
    }

    /// Handle rising edges of the valve outputs. Returns `true` if the
    /// position was forced.
    fn apply_cylinder_events(&mut self, previous: &BTreeMap<SignalId, bool>) -> Result<bool, BridgeError> {
        let rose = |now: &BTreeMap<SignalId, bool>, id: SignalId| {
            now.get(&id).copied().unwrap_or(false) && !previous.get(&id).copied().unwrap_or(false)
        };

        let mut forced = None;
        for cylinder in CYLINDERS {
            if rose(&self.outputs, cylinder.extend) {
                debug!("{} engaged", cylinder.extend);
                if self.options.cylinder_feedback {
                    self.commit(self.interlocks.project(cylinder.extended, true).changes())?;
                }
                if cylinder.drives_position {
                    forced = self.options.extend_setpoint.or(forced);
                }
            }
            if rose(&self.outputs, cylinder.retract) {
                debug!("{} engaged", cylinder.retract);
                if self.options.cylinder_feedback {
                    self.commit(self.interlocks.project(cylinder.retracted, true).changes())?;
                }
                if cylinder.drives_position {
                    forced = Some(RETRACT_SETPOINT);
                }
            }
        }

        if let Some(setpoint) = forced {
            self.simulator.force(setpoint);
        }
        Ok(forced.is_some())
    }

    // ─── Input Area writes ──────────────────────────────────────────

    /// Update local input state, then write it through if running.
    ///
    /// All local changes land before the first write. A failed write
    /// schedules a full push of the Input Area at the start of the next tick.
    fn commit<I>(&mut self, changes: I) -> Result<(), BridgeError>
    where
        I: Iterator<Item = (SignalId, bool)> + Clone,
    {
        for (id, active) in changes.clone() {
            self.inputs.insert(id, active);
        }
        if !self.cycle.is_running() {
            trace!("Cycle {}, input change kept locally", self.cycle.state());
            return Ok(());
        }
        if let Err(err) = self.write_inputs(changes) {
            warn!("Input write failed, resync scheduled: {}", err);
            self.resync = true;
            return Err(err);
        }
        Ok(())
    }

    fn commit_latch(&mut self) -> Result<(), BridgeError> {
        self.commit(
            [
                (SignalId::SafetyRelay, self.latch.relay_engaged()),
                (SignalId::EmergencyStop, self.latch.is_pressed()),
            ]
            .into_iter(),
        )
    }

    /// Write the complete local input state.
    fn push_inputs(&mut self) -> Result<(), BridgeError> {
        let snapshot: Vec<(SignalId, bool)> = self.inputs.iter().map(|(id, on)| (*id, *on)).collect();
        self.write_inputs(snapshot.into_iter())?;
        self.resync = false;
        Ok(())
    }

    /// Deactivations go out before activations: a write failing halfway
    /// never leaves an interlocked pair both active, nor the safety relay
    /// engaged with the e-stop pressed.
    fn write_inputs<I>(&mut self, changes: I) -> Result<(), BridgeError>
    where
        I: Iterator<Item = (SignalId, bool)> + Clone,
    {
        for pass in [false, true] {
            for (id, active) in changes.clone().filter(|(_, active)| *active == pass) {
                self.write_input(id, active)?;
            }
        }
        Ok(())
    }

    fn sync_latch(&mut self) {
        self.inputs.insert(SignalId::EmergencyStop, self.latch.is_pressed());
        self.inputs.insert(SignalId::SafetyRelay, self.latch.relay_engaged());
    }

    fn write_input(&mut self, id: SignalId, active: bool) -> Result<(), BridgeError> {
        let signal = self.map.signal(id);
        let Location::Bit { byte, bit } = signal.location else {
            return Err(BridgeError::NotDiscrete(id));
        };
        let level = signal.logic.to_bit(active);
        self.controller.write_bit(Area::Input, byte, bit, level)?;
        debug!("{} ({}) I{} <- {}", id, signal.name, signal.location, u8::from(level));
        Ok(())
    }

    /// Best-effort word write. Failures are logged and counted, never
    /// propagated.
    fn write_analog(&mut self, channel: AnalogChannel, value: i16) -> bool {
        let signal = self.map.signal(channel.signal());
        let Location::Word { byte } = signal.location else {
            warn!("{} is not bound to a word, dropping value {}", signal.id, value);
            return false;
        };
        let bytes = codec::encode_word(value);
        match self.controller.write_word(Area::Input, byte, bytes) {
            Ok(()) => {
                debug!("{} I{} <- {} ({:02X}{:02X})", signal.id, signal.location, value, bytes[0], bytes[1]);
                true
            }
            Err(e) => {
                warn!("Dropping {} write of {}: {}", signal.id, value, e);
                self.cycle.stats_mut().dropped_writes += 1;
                false
            }
        }
    }

    fn publish_position(&mut self) {
        let feedback = codec::position_feedback(self.simulator.position());
        if self.write_analog(AnalogChannel::PositionFeedback, feedback) {
            self.cycle.stats_mut().publications += 1;
        }
    }

    // ─── State access ───────────────────────────────────────────────

    /// Logical state of a discrete input.
    pub fn input(&self, id: SignalId) -> bool {
        self.inputs.get(&id).copied().unwrap_or(false)
    }

    /// Logical state of a discrete output as of the last tick.
    pub fn output(&self, id: SignalId) -> bool {
        self.outputs.get(&id).copied().unwrap_or(false)
    }

    /// Motor contactors as of the last tick.
    pub fn motor_command(&self) -> MotorCommand {
        let mut motor = MotorCommand::empty();
        motor.set(MotorCommand::RIGHT_SLOW, self.output(SignalId::MotorRightSlow));
        motor.set(MotorCommand::LEFT_SLOW, self.output(SignalId::MotorLeftSlow));
        motor.set(MotorCommand::RIGHT_FAST, self.output(SignalId::MotorRightFast));
        motor
    }

    /// Current display state.
    pub fn display(&self) -> PanelDisplay {
        let position = self.simulator.position();
        PanelDisplay {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            motor: MotorIndicator::from(self.motor_command()),
            cylinders: CYLINDERS
                .map(|c| CylinderIndicator::from_solenoids(self.output(c.extend), self.output(c.retract))),
            position,
            feedback: codec::position_feedback(position),
            speed: self.simulator.speed(),
            temperature_setpoint: self.temperature,
            reset_lamp: self.latch.lamp(),
            emergency_stop: self.latch.is_pressed(),
        }
    }

    /// Simulated position.
    pub fn position(&self) -> i32 {
        self.simulator.position()
    }

    /// Polling cycle state.
    pub fn state(&self) -> CycleState {
        self.cycle.state()
    }

    /// Polling cycle counters.
    pub fn stats(&self) -> &CycleStats {
        self.cycle.stats()
    }

    /// Failure that stopped the cycle.
    pub fn last_failure(&self) -> Option<&BridgeError> {
        self.cycle.last_failure()
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.cycle.period()
    }

    /// Address map in use.
    pub fn map(&self) -> &AddressMap {
        &self.map
    }

    /// Controller backend.
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Mutable controller backend.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }
}
