//! Bridge behaviour against the simulated controller.

use std::path::Path;

use ihk_common::codec::{decode_word, encode_word};
use ihk_common::config::{PanelConfig, load_config_dir};
use ihk_common::controller::ControllerIo;
use ihk_common::error::IoError;
use ihk_common::image::Area;
use ihk_common::io::config::IoConfig;
use ihk_common::io::map::AddressMap;
use ihk_common::io::signal::{ContactLogic, SignalId};
use ihk_panel::interlock::CYLINDER_INTERLOCKS;
use ihk_panel::{
    Bridge, BridgeError, CycleState, CylinderIndicator, MotorIndicator, PanelEvent, ResetLamp,
    SimulatedController, TickOutcome,
};

fn config() -> PanelConfig {
    PanelConfig::default()
}

fn attached(config: &PanelConfig) -> Bridge<SimulatedController> {
    let mut bridge = Bridge::new(SimulatedController::new(), AddressMap::standard(), config).unwrap();
    bridge.attach().unwrap();
    bridge
}

fn set_output(bridge: &mut Bridge<SimulatedController>, id: SignalId, on: bool) {
    let map = bridge.map().clone();
    bridge.controller_mut().set_output(&map, id, on).unwrap();
}

fn input_bit(bridge: &Bridge<SimulatedController>, id: SignalId) -> bool {
    bridge.controller().input_bit(bridge.map(), id).unwrap()
}

fn feedback_word(bridge: &Bridge<SimulatedController>) -> [u8; 2] {
    bridge.controller().image().read_word(Area::Input, 8).unwrap()
}

fn tick(bridge: &mut Bridge<SimulatedController>) {
    match bridge.tick().unwrap() {
        TickOutcome::Completed(_) => {}
        TickOutcome::Skipped(state) => panic!("tick skipped in state {state}"),
    }
}

// ─── Position simulation ────────────────────────────────────────────

#[test]
fn test_right_slow_publishes_feedback() {
    let mut bridge = attached(&config());
    set_output(&mut bridge, SignalId::MotorRightSlow, true);

    for _ in 0..5 {
        tick(&mut bridge);
    }
    assert_eq!(bridge.position(), 500);

    tick(&mut bridge);
    assert_eq!(bridge.position(), 600);
    assert_eq!(feedback_word(&bridge), [0x69, 0xA8]);
    assert_eq!(decode_word(feedback_word(&bridge)), 27_048);
}

#[test]
fn test_fast_right_snaps_to_end() {
    let mut bridge = attached(&config());

    set_output(&mut bridge, SignalId::Cylinder2Retract, true);
    tick(&mut bridge);
    assert_eq!(bridge.position(), 27_048);

    set_output(&mut bridge, SignalId::Cylinder2Retract, false);
    set_output(&mut bridge, SignalId::MotorLeftSlow, true);
    bridge.handle(PanelEvent::SpeedText("48".into())).unwrap();
    tick(&mut bridge);
    assert_eq!(bridge.position(), 27_000);

    set_output(&mut bridge, SignalId::MotorLeftSlow, false);
    set_output(&mut bridge, SignalId::MotorRightFast, true);
    bridge.handle(PanelEvent::SpeedText("100".into())).unwrap();
    tick(&mut bridge);
    assert_eq!(bridge.position(), 27_648);
    assert_eq!(feedback_word(&bridge), [0x00, 0x00]);
}

#[test]
fn test_retract_edge_overrides_motor() {
    let mut bridge = attached(&config());
    set_output(&mut bridge, SignalId::MotorRightSlow, true);
    set_output(&mut bridge, SignalId::Cylinder2Retract, true);

    tick(&mut bridge);
    assert_eq!(bridge.position(), 27_048);
    assert_eq!(bridge.stats().forced, 1);
    assert_eq!(decode_word(feedback_word(&bridge)), 600);

    // Output held: no new edge, the motor moves the axis again.
    tick(&mut bridge);
    assert_eq!(bridge.position(), 27_648);
    assert_eq!(bridge.stats().forced, 1);
}

#[test]
fn test_extend_forcing_is_optional() {
    let mut bridge = attached(&config());
    set_output(&mut bridge, SignalId::Cylinder2Extend, true);
    tick(&mut bridge);
    assert_eq!(bridge.position(), 0);
    assert_eq!(bridge.stats().forced, 0);

    let mut cfg = config();
    cfg.simulation.extend_setpoint = Some(600);
    let mut bridge = attached(&cfg);
    set_output(&mut bridge, SignalId::Cylinder2Extend, true);
    tick(&mut bridge);
    assert_eq!(bridge.position(), 600);
}

#[test]
fn test_cylinder_one_does_not_force() {
    let mut bridge = attached(&config());
    set_output(&mut bridge, SignalId::Cylinder1Retract, true);
    tick(&mut bridge);
    assert_eq!(bridge.position(), 0);
}

#[test]
fn test_left_stops_at_zero() {
    let mut bridge = attached(&config());
    set_output(&mut bridge, SignalId::MotorLeftSlow, true);
    let publications = bridge.stats().publications;
    tick(&mut bridge);
    assert_eq!(bridge.position(), 0);
    assert_eq!(bridge.stats().publications, publications);
}

// ─── Analog entry ───────────────────────────────────────────────────

#[test]
fn test_invalid_temperature_writes_nothing() {
    let mut bridge = attached(&config());
    let writes = bridge.controller().writes();

    let display = bridge
        .handle(PanelEvent::TemperatureText("abc".into()))
        .unwrap();
    assert_eq!(display.temperature_setpoint, None);
    assert_eq!(bridge.controller().writes(), writes);
    assert_eq!(bridge.controller().image().read_word(Area::Input, 6).unwrap(), [0, 0]);

    bridge
        .handle(PanelEvent::TemperatureText(" -40 ".into()))
        .unwrap();
    assert_eq!(
        bridge.controller().image().read_word(Area::Input, 6).unwrap(),
        encode_word(-40)
    );
}

#[test]
fn test_analog_failure_does_not_stop_cycle() {
    let mut bridge = attached(&config());
    let publications = bridge.stats().publications;
    bridge.controller_mut().set_fail_word_writes(true);
    set_output(&mut bridge, SignalId::MotorRightSlow, true);

    tick(&mut bridge);
    assert_eq!(bridge.state(), CycleState::Running);
    assert_eq!(bridge.position(), 100);
    assert_eq!(bridge.stats().publications, publications);
    assert_eq!(bridge.stats().dropped_writes, 1);

    bridge
        .handle(PanelEvent::TemperatureText("20".into()))
        .unwrap();
    assert_eq!(bridge.stats().dropped_writes, 2);
}

// ─── Interlocks ─────────────────────────────────────────────────────

#[test]
fn test_interlock_b7_clears_b8() {
    let mut bridge = attached(&config());
    bridge
        .handle(PanelEvent::Press(SignalId::Cylinder2Extended))
        .unwrap();
    assert!(input_bit(&bridge, SignalId::Cylinder2Extended));

    let display = bridge
        .handle(PanelEvent::Press(SignalId::Cylinder2Retracted))
        .unwrap();
    assert!(display.is_active(SignalId::Cylinder2Retracted));
    assert!(!display.is_active(SignalId::Cylinder2Extended));
    assert!(input_bit(&bridge, SignalId::Cylinder2Retracted));
    assert!(!input_bit(&bridge, SignalId::Cylinder2Extended));
    let image = bridge.controller().image();
    assert!(image.read_bit(Area::Input, 2, 2).unwrap());
    assert!(!image.read_bit(Area::Input, 2, 3).unwrap());
}

#[test]
fn test_interlock_pairs_exclusive() {
    let mut bridge = attached(&config());
    for pair in CYLINDER_INTERLOCKS {
        for (on, off) in [(pair.a, pair.b), (pair.b, pair.a)] {
            bridge.handle(PanelEvent::Press(off)).unwrap();
            bridge.handle(PanelEvent::Press(on)).unwrap();
            assert!(bridge.input(on));
            assert!(!bridge.input(off));
            assert!(input_bit(&bridge, on));
            assert!(!input_bit(&bridge, off));
        }
    }
}

#[test]
fn test_interlock_partial_write_never_sets_both() {
    let mut bridge = attached(&config());
    bridge
        .handle(PanelEvent::Press(SignalId::Cylinder2Extended))
        .unwrap();

    // Partner write succeeds, target write fails.
    bridge.controller_mut().inject_fault_after(1);
    let err = bridge
        .handle(PanelEvent::Press(SignalId::Cylinder2Retracted))
        .unwrap_err();
    assert!(matches!(err, BridgeError::Io(IoError::Communication(_))));
    assert!(!input_bit(&bridge, SignalId::Cylinder2Extended));
    assert!(!input_bit(&bridge, SignalId::Cylinder2Retracted));
    assert!(bridge.input(SignalId::Cylinder2Retracted));
    assert_eq!(bridge.state(), CycleState::Running);

    // Next tick pushes the local state again.
    tick(&mut bridge);
    assert!(input_bit(&bridge, SignalId::Cylinder2Retracted));
    assert!(!input_bit(&bridge, SignalId::Cylinder2Extended));
}

#[test]
fn test_interlock_first_write_failure_keeps_image() {
    let mut bridge = attached(&config());
    bridge
        .handle(PanelEvent::Press(SignalId::Cylinder1Retracted))
        .unwrap();

    bridge.controller_mut().inject_fault_after(0);
    assert!(bridge
        .handle(PanelEvent::Press(SignalId::Cylinder1Extended))
        .is_err());
    assert!(input_bit(&bridge, SignalId::Cylinder1Retracted));
    assert!(!input_bit(&bridge, SignalId::Cylinder1Extended));

    tick(&mut bridge);
    assert!(!input_bit(&bridge, SignalId::Cylinder1Retracted));
    assert!(input_bit(&bridge, SignalId::Cylinder1Extended));
}

#[test]
fn test_failed_resync_stops_cycle() {
    let mut bridge = attached(&config());
    bridge.controller_mut().inject_faults(1);
    assert!(bridge.handle(PanelEvent::Press(SignalId::Start)).is_err());

    bridge.controller_mut().inject_faults(1);
    assert!(matches!(
        bridge.tick(),
        Err(BridgeError::Io(IoError::Communication(_)))
    ));
    assert_eq!(bridge.state(), CycleState::Stopped);
    assert!(!input_bit(&bridge, SignalId::Start));
}

#[test]
fn test_interlock_release_keeps_partner() {
    let mut bridge = attached(&config());
    bridge
        .handle(PanelEvent::Press(SignalId::Cylinder1Retracted))
        .unwrap();
    bridge
        .handle(PanelEvent::Release(SignalId::Cylinder1Retracted))
        .unwrap();
    assert!(!bridge.input(SignalId::Cylinder1Retracted));
    assert!(!bridge.input(SignalId::Cylinder1Extended));
}

#[test]
fn test_cylinder_feedback_drives_sensors() {
    let mut cfg = config();
    cfg.simulation.cylinder_feedback = true;
    let mut bridge = attached(&cfg);

    set_output(&mut bridge, SignalId::Cylinder2Retract, true);
    tick(&mut bridge);
    assert!(input_bit(&bridge, SignalId::Cylinder2Retracted));
    assert!(!input_bit(&bridge, SignalId::Cylinder2Extended));

    set_output(&mut bridge, SignalId::Cylinder2Retract, false);
    set_output(&mut bridge, SignalId::Cylinder2Extend, true);
    tick(&mut bridge);
    assert!(!input_bit(&bridge, SignalId::Cylinder2Retracted));
    assert!(input_bit(&bridge, SignalId::Cylinder2Extended));

    set_output(&mut bridge, SignalId::Cylinder1Extend, true);
    let display = match bridge.tick().unwrap() {
        TickOutcome::Completed(display) => display,
        other => panic!("unexpected {other:?}"),
    };
    assert!(display.is_active(SignalId::Cylinder1Extended));
    assert_eq!(display.cylinders[0], CylinderIndicator::Extending);
    assert_eq!(display.cylinders[1], CylinderIndicator::Extending);
}

// ─── Emergency stop ─────────────────────────────────────────────────

#[test]
fn test_estop_reset_sequence() {
    let mut bridge = attached(&config());
    // Pressed at power-up: NC contact open.
    assert!(!input_bit(&bridge, SignalId::EmergencyStop));
    assert!(!input_bit(&bridge, SignalId::SafetyRelay));
    assert_eq!(bridge.display().reset_lamp, ResetLamp::Lit);

    // Reset while pressed only pulses S12.
    let display = bridge.handle(PanelEvent::Press(SignalId::Reset)).unwrap();
    assert!(input_bit(&bridge, SignalId::Reset));
    assert!(!display.is_active(SignalId::SafetyRelay));
    bridge.handle(PanelEvent::Release(SignalId::Reset)).unwrap();
    assert!(!input_bit(&bridge, SignalId::Reset));

    let display = bridge
        .handle(PanelEvent::Release(SignalId::EmergencyStop))
        .unwrap();
    assert!(input_bit(&bridge, SignalId::EmergencyStop));
    assert!(!display.emergency_stop);
    assert_eq!(display.reset_lamp, ResetLamp::Blinking);

    let display = bridge.handle(PanelEvent::Press(SignalId::Reset)).unwrap();
    assert!(input_bit(&bridge, SignalId::SafetyRelay));
    assert_eq!(display.reset_lamp, ResetLamp::Off);

    let display = bridge
        .handle(PanelEvent::Toggle(SignalId::EmergencyStop))
        .unwrap();
    assert!(display.emergency_stop);
    assert!(!input_bit(&bridge, SignalId::EmergencyStop));
    assert!(!input_bit(&bridge, SignalId::SafetyRelay));
    assert_eq!(display.reset_lamp, ResetLamp::Lit);
}

#[test]
fn test_estop_partial_write_drops_relay_first() {
    let mut bridge = attached(&config());
    bridge
        .handle(PanelEvent::Release(SignalId::EmergencyStop))
        .unwrap();
    bridge.handle(PanelEvent::Press(SignalId::Reset)).unwrap();
    assert!(input_bit(&bridge, SignalId::SafetyRelay));

    // F9 drops, then the S0 write fails.
    bridge.controller_mut().inject_fault_after(1);
    assert!(bridge
        .handle(PanelEvent::Press(SignalId::EmergencyStop))
        .is_err());
    assert!(!input_bit(&bridge, SignalId::SafetyRelay));
    assert!(input_bit(&bridge, SignalId::EmergencyStop));
    assert!(bridge.display().emergency_stop);

    tick(&mut bridge);
    assert!(!input_bit(&bridge, SignalId::EmergencyStop));
    assert!(!input_bit(&bridge, SignalId::SafetyRelay));
}

#[test]
fn test_safety_relay_not_operable() {
    let mut bridge = attached(&config());
    assert_eq!(
        bridge.handle(PanelEvent::Press(SignalId::SafetyRelay)),
        Err(BridgeError::NotAPanelControl(SignalId::SafetyRelay))
    );
    assert!(!input_bit(&bridge, SignalId::SafetyRelay));
}

// ─── Contact logic ──────────────────────────────────────────────────

#[test]
fn test_stop_button_is_normally_closed() {
    let mut bridge = attached(&config());
    assert!(input_bit(&bridge, SignalId::Stop));
    bridge.handle(PanelEvent::Press(SignalId::Stop)).unwrap();
    assert!(!input_bit(&bridge, SignalId::Stop));
    assert!(bridge.input(SignalId::Stop));
}

#[test]
fn test_pressure_switch_inversion() {
    let io = AddressMap::standard().to_config();
    let mut cfg = config();
    cfg.simulation.pressure_switch_inverted = true;
    let mut bridge = Bridge::from_io_config(SimulatedController::new(), &io, &cfg).unwrap();
    assert_eq!(
        bridge.map().signal(SignalId::PressureSwitch).logic,
        ContactLogic::NC
    );
    bridge.attach().unwrap();
    assert!(input_bit(&bridge, SignalId::PressureSwitch));

    bridge
        .handle(PanelEvent::Press(SignalId::PressureSwitch))
        .unwrap();
    assert!(!input_bit(&bridge, SignalId::PressureSwitch));
}

#[test]
fn test_pressure_switch_inversion_from_map() {
    let mut cfg = config();
    cfg.simulation.pressure_switch_inverted = true;
    let mut bridge = Bridge::new(SimulatedController::new(), AddressMap::standard(), &cfg).unwrap();
    assert_eq!(
        bridge.map().signal(SignalId::PressureSwitch).logic,
        ContactLogic::NC
    );
    bridge.attach().unwrap();
    assert!(input_bit(&bridge, SignalId::PressureSwitch));
}

#[test]
fn test_invalid_table_rejected() {
    let mut io = AddressMap::standard().to_config();
    for group in io.groups.values_mut() {
        group.io.retain(|p| p.tag != "B9");
    }
    let result = Bridge::from_io_config(SimulatedController::new(), &io, &config());
    assert!(matches!(result, Err(BridgeError::AddressMap(_))));
}

#[test]
fn test_normally_closed_output_lamp() {
    let mut map = AddressMap::standard();
    map.set_logic(SignalId::FaultLamp, ContactLogic::NC);
    let mut bridge = Bridge::new(SimulatedController::new(), map, &config()).unwrap();
    bridge.attach().unwrap();

    let display = match bridge.tick().unwrap() {
        TickOutcome::Completed(display) => display,
        other => panic!("unexpected {other:?}"),
    };
    assert!(display.outputs[&SignalId::FaultLamp]);
    assert!(!display.outputs[&SignalId::RunLamp]);
}

// ─── Display ────────────────────────────────────────────────────────

#[test]
fn test_motor_indicators() {
    let mut bridge = attached(&config());
    set_output(&mut bridge, SignalId::MotorRightSlow, true);
    tick(&mut bridge);
    assert_eq!(bridge.display().motor, MotorIndicator::RightSlow);

    set_output(&mut bridge, SignalId::MotorLeftSlow, true);
    tick(&mut bridge);
    assert_eq!(bridge.display().motor, MotorIndicator::Conflict);

    set_output(&mut bridge, SignalId::MotorRightSlow, false);
    tick(&mut bridge);
    assert_eq!(bridge.display().motor, MotorIndicator::Left);
}

#[test]
fn test_cylinder_conflict_indicator() {
    let mut bridge = attached(&config());
    set_output(&mut bridge, SignalId::Cylinder1Extend, true);
    set_output(&mut bridge, SignalId::Cylinder1Retract, true);
    tick(&mut bridge);
    assert_eq!(bridge.display().cylinders[0], CylinderIndicator::Conflict);
    assert_eq!(bridge.display().cylinders[1], CylinderIndicator::Idle);
}

// ─── Polling cycle ──────────────────────────────────────────────────

#[test]
fn test_idle_tick_is_skipped() {
    let mut bridge = Bridge::new(SimulatedController::new(), AddressMap::standard(), &config()).unwrap();
    assert_eq!(bridge.tick(), Ok(TickOutcome::Skipped(CycleState::Idle)));
    assert_eq!(bridge.controller().reads(), 0);
    assert_eq!(bridge.controller().writes(), 0);
}

#[test]
fn test_attach_requires_connection() {
    let mut controller = SimulatedController::new();
    controller.disconnect();
    let mut bridge = Bridge::new(controller, AddressMap::standard(), &config()).unwrap();
    assert_eq!(bridge.attach(), Err(BridgeError::Io(IoError::NotConnected)));
    assert_eq!(bridge.state(), CycleState::Idle);

    bridge.controller_mut().connect();
    bridge.attach().unwrap();
    assert_eq!(bridge.state(), CycleState::Running);
    assert!(bridge.controller().is_connected());
}

#[test]
fn test_failure_stops_cycle_once() {
    let mut bridge = attached(&config());
    tick(&mut bridge);

    bridge.controller_mut().inject_faults(1);
    let err = bridge.tick().unwrap_err();
    assert!(matches!(err, BridgeError::Io(IoError::Communication(_))));
    assert_eq!(bridge.state(), CycleState::Stopped);
    assert_eq!(bridge.last_failure(), Some(&err));
    assert_eq!(bridge.stats().ticks, 1);

    let reads = bridge.controller().reads();
    assert_eq!(bridge.tick(), Ok(TickOutcome::Skipped(CycleState::Stopped)));
    assert_eq!(bridge.controller().reads(), reads);
    assert_eq!(bridge.attach(), Err(BridgeError::Stopped));
}

#[test]
fn test_disconnect_stops_cycle() {
    let mut bridge = attached(&config());
    bridge.controller_mut().disconnect();
    assert_eq!(bridge.tick(), Err(BridgeError::Io(IoError::NotConnected)));
    assert_eq!(bridge.state(), CycleState::Stopped);
}

#[test]
fn test_shutdown_is_terminal() {
    let mut bridge = attached(&config());
    bridge.shutdown();
    assert_eq!(bridge.state(), CycleState::Stopped);
    assert!(bridge.last_failure().is_none());

    // Events are still accepted but stay local.
    let writes = bridge.controller().writes();
    bridge.handle(PanelEvent::Press(SignalId::Start)).unwrap();
    assert!(bridge.input(SignalId::Start));
    assert_eq!(bridge.controller().writes(), writes);
}

// ─── Shipped configuration ──────────────────────────────────────────

#[test]
fn test_shipped_config_runs() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config");
    let loaded = load_config_dir(&dir).unwrap();
    let mut bridge = Bridge::new(SimulatedController::new(), loaded.map, &loaded.panel).unwrap();
    bridge.attach().unwrap();

    set_output(&mut bridge, SignalId::Cylinder2Extend, true);
    tick(&mut bridge);
    assert_eq!(bridge.position(), 600);
    assert_eq!(bridge.display().speed, 100);
}

#[test]
fn test_io_table_from_toml() {
    let io = IoConfig::from_toml(&std::fs::read_to_string(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/io.toml"),
    )
    .unwrap())
    .unwrap();
    let bridge = Bridge::from_io_config(SimulatedController::new(), &io, &config()).unwrap();
    assert_eq!(bridge.map(), &AddressMap::standard());
}

#[test]
fn test_config_dir_without_io_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("panel.toml"),
        r#"
[shared]
log_level = "debug"
service_name = "panel-test"

[cycle]
period_ms = 50

[simulation]
speed = 250
cylinder_feedback = true
"#,
    )
    .unwrap();

    let loaded = load_config_dir(dir.path()).unwrap();
    assert_eq!(loaded.map, AddressMap::standard());

    let mut bridge = Bridge::new(SimulatedController::new(), loaded.map, &loaded.panel).unwrap();
    assert_eq!(bridge.period(), std::time::Duration::from_millis(50));
    bridge.attach().unwrap();

    set_output(&mut bridge, SignalId::MotorRightFast, true);
    set_output(&mut bridge, SignalId::Cylinder1Retract, true);
    tick(&mut bridge);
    assert_eq!(bridge.position(), 500);
    assert!(input_bit(&bridge, SignalId::Cylinder1Retracted));
}
