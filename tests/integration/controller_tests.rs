//! Integration tests for the controller → safety → heater pipeline.
//!
//! Drives the thermal loop through [`AppService`] with scripted NTC
//! readings and checks what actually reaches the heater.

use crate::mock_hw::{MockHardware, RecordingSink};

use cupwarmer::app::commands::AppCommand;
use cupwarmer::app::events::AppEvent;
use cupwarmer::app::service::AppService;
use cupwarmer::config::SystemConfig;
use cupwarmer::control::HeatMode;
use cupwarmer::error::{SafetyFault, SensorError};
use cupwarmer::scheduler::SchedulerMode;

fn make_app(temp_c: f32) -> (AppService<MockHardware>, MockHardware, RecordingSink) {
    let hw = MockHardware::at(temp_c);
    let app = AppService::new(&SystemConfig::default(), hw.clone());
    (app, hw, RecordingSink::new())
}

#[test]
fn closed_loop_settles_near_target_without_overshoot() {
    let (app, hw, mut sink) = make_app(25.0);
    app.handle_command(AppCommand::SetPower(true)).unwrap();

    let mut peak = f32::MIN;
    for _ in 0..2000 {
        app.control_tick(&mut sink);
        hw.step_plant();
        peak = peak.max(app.controller().current_temperature());
    }

    let t = app.controller().current_temperature();
    assert!((45.0..=58.0).contains(&t), "settled at {t}");
    assert!(peak < 70.0, "peak {peak}");
    assert!(matches!(app.controller().mode(), HeatMode::Heating | HeatMode::Keeping));
}

#[test]
fn drive_always_within_bounds() {
    let (app, hw, mut sink) = make_app(5.0);
    app.handle_command(AppCommand::SetPower(true)).unwrap();
    app.handle_command(AppCommand::SetTargetTemp(90)).unwrap();
    for _ in 0..200 {
        app.control_tick(&mut sink);
        hw.step_plant();
    }
    assert!(hw.drive_history().iter().all(|d| (0.0..=100.0).contains(d)));
}

#[test]
fn hard_limit_latches_power_off_until_requested() {
    let (app, hw, mut sink) = make_app(50.0);
    app.handle_command(AppCommand::SetPower(true)).unwrap();
    app.control_tick(&mut sink);
    assert!(app.controller().is_heating());

    hw.set_temperature(95.0);
    app.control_tick(&mut sink);
    assert!(!app.controller().power());
    assert!(!app.controller().is_heating());
    assert_eq!(app.controller().mode(), HeatMode::Idle);
    assert_eq!(hw.last_drive(), 0.0);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SafetyShutdown { .. })),
        1
    );
    assert_eq!(app.scheduler().mode(), SchedulerMode::Idle);

    // Cooling down alone does not restore power.
    hw.set_temperature(40.0);
    for _ in 0..10 {
        app.control_tick(&mut sink);
    }
    assert!(!app.controller().power());
    assert_eq!(app.controller().faults(), 0);

    app.handle_command(AppCommand::SetPower(true)).unwrap();
    app.control_tick(&mut sink);
    assert_eq!(app.controller().mode(), HeatMode::Heating);
}

#[test]
fn power_request_while_over_limit_is_overridden() {
    let (app, hw, mut sink) = make_app(99.0);
    app.handle_command(AppCommand::SetPower(true)).unwrap();
    for _ in 0..5 {
        app.control_tick(&mut sink);
        assert!(!app.controller().power());
        assert_eq!(hw.last_drive(), 0.0);
    }
    assert_eq!(app.controller().faults(), SafetyFault::OverTemperature.mask());
}

#[test]
fn sensor_fault_forces_error_every_cycle_then_recovers() {
    let (app, hw, mut sink) = make_app(30.0);
    app.handle_command(AppCommand::SetPower(true)).unwrap();
    app.control_tick(&mut sink);
    assert!(app.controller().is_heating());

    hw.fail_sensor(SensorError::OutOfRange(20));
    for _ in 0..20 {
        app.control_tick(&mut sink);
        assert_eq!(app.controller().mode(), HeatMode::Error);
        assert!(!app.controller().is_heating());
        assert!(!app.controller().is_sensor_ok());
        assert_eq!(hw.last_drive(), 0.0);
    }
    // Power intent survives a sensor fault.
    assert!(app.controller().power());

    hw.set_temperature(30.0);
    app.control_tick(&mut sink);
    assert!(app.controller().is_sensor_ok());
    assert_eq!(app.controller().mode(), HeatMode::Heating);
}

#[test]
fn sensor_fault_reports_error_while_off() {
    let (app, hw, mut sink) = make_app(30.0);
    hw.fail_sensor(SensorError::AdcReadFailed);
    app.control_tick(&mut sink);
    assert_eq!(app.controller().mode(), HeatMode::Error);
    assert!(sink.events().contains(&AppEvent::ModeChanged {
        from: HeatMode::Idle,
        to: HeatMode::Error,
    }));
}

#[test]
fn hard_limit_uses_last_valid_reading_during_sensor_fault() {
    let (app, hw, mut sink) = make_app(96.0);
    app.control_tick(&mut sink);
    hw.fail_sensor(SensorError::AdcReadFailed);
    app.control_tick(&mut sink);
    // Over-temperature outranks the sensor fault.
    assert_eq!(app.controller().mode(), HeatMode::Idle);
    assert_eq!(
        app.controller().faults(),
        SafetyFault::OverTemperature.mask() | SafetyFault::SensorFault.mask()
    );
}

#[test]
fn target_is_clamped_and_idempotent() {
    let (app, _, _) = make_app(25.0);
    app.handle_command(AppCommand::SetTargetTemp(5)).unwrap();
    assert_eq!(app.controller().target(), 30);
    app.handle_command(AppCommand::SetTargetTemp(999)).unwrap();
    assert_eq!(app.controller().target(), 90);
    app.handle_command(AppCommand::SetTargetTemp(62)).unwrap();
    app.handle_command(AppCommand::SetTargetTemp(62)).unwrap();
    assert_eq!(app.controller().target(), 62);
}
