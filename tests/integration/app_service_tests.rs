//! Integration tests for the command/status surface and the runtime.
//!
//! JSON bodies go in exactly as the `/control` and `/sync_time`
//! endpoints receive them; status comes out as the `/status` body.

use std::sync::Arc;
use std::time::Duration;

use crate::mock_hw::{MockHardware, RecordingSink};

use cupwarmer::app::events::AppEvent;
use cupwarmer::app::service::AppService;
use cupwarmer::config::SystemConfig;
use cupwarmer::control::HeatMode;
use cupwarmer::error::{Error, ScheduleError};
use cupwarmer::runtime::Runtime;
use cupwarmer::scheduler::SchedulerMode;

fn make_app() -> (AppService<MockHardware>, MockHardware, RecordingSink) {
    let hw = MockHardware::at(20.0);
    let app = AppService::new(&SystemConfig::default(), hw.clone());
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, hw, sink)
}

#[test]
fn start_emits_initial_status() {
    let (_, _, sink) = make_app();
    let events = sink.events();
    assert_eq!(events.len(), 1);
    let AppEvent::Started(s) = &events[0] else {
        panic!("expected Started, got {:?}", events[0]);
    };
    assert_eq!(s.target_temp, 55);
    assert!(!s.power);
    assert_eq!(s.mode, HeatMode::Idle);
    assert_eq!(s.scheduler_mode, SchedulerMode::Idle);
}

#[test]
fn control_body_drives_the_plate() {
    let (app, hw, mut sink) = make_app();
    app.handle_control_json(r#"{"power":1,"set_temp":60,"timer_duration":30}"#)
        .unwrap();
    app.control_tick(&mut sink);

    assert!(app.controller().power());
    assert_eq!(app.controller().target(), 60);
    assert_eq!(app.scheduler().timer_remaining(), 30);
    assert!(hw.last_drive() > 5.0);
}

#[test]
fn control_body_reports_bad_schedule_but_applies_the_rest() {
    let (app, _, _) = make_app();
    let r = app.handle_control_json(r#"{"set_temp":45,"schedule_time":"25:61"}"#);
    assert_eq!(r, Err(Error::Schedule(ScheduleError::InvalidTime)));
    assert_eq!(app.controller().target(), 45);
    assert_eq!(app.scheduler().schedule(), None);
}

#[test]
fn garbage_control_body_changes_nothing() {
    let (app, _, _) = make_app();
    assert!(matches!(
        app.handle_control_json(r#"{"power":1,"#),
        Err(Error::Request(_))
    ));
    assert!(!app.controller().power());
}

#[test]
fn status_json_has_endpoint_shape() {
    let (app, _, mut sink) = make_app();
    app.handle_control_json(r#"{"power":1,"schedule_time":"08:30"}"#)
        .unwrap();
    app.control_tick(&mut sink);

    let json = app.status().to_json().unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["target_temp"], 55);
    assert_eq!(v["is_heating"], 1);
    assert_eq!(v["esp_time"], "00:00");
    assert_eq!(v["weekday"], 3);
    assert_eq!(v["timer_remaining"], 60);
    assert_eq!(v["schedule_time"], "08:30");
    assert_eq!(v["mode"], "heating");
    assert_eq!(v["sensor_ok"], true);
    assert_eq!(v["power"], true);
    assert_eq!(v["scheduler_mode"], "scheduled");
    assert!((v["current_temp"].as_f64().unwrap() - 20.0).abs() < 1e-6);
}

#[test]
fn sync_time_sets_clock() {
    let (app, _, _) = make_app();
    app.handle_sync_time_json(r#"{"time":"2025-12-26 08:00:00","weekday":5}"#)
        .unwrap();
    let s = app.status();
    assert_eq!(s.esp_time.as_str(), "08:00");
    assert_eq!(s.weekday, 5);
}

#[test]
fn sync_time_rejects_bad_input() {
    let (app, _, _) = make_app();
    assert_eq!(
        app.handle_sync_time_json(r#"{"time":"26/12/2025 8am"}"#),
        Err(Error::Schedule(ScheduleError::InvalidCalendarTime))
    );
    assert!(matches!(
        app.handle_sync_time_json(r#"{"weekday":5}"#),
        Err(Error::Request(_))
    ));
    assert_eq!(app.status().esp_time.as_str(), "00:00");
}

#[test]
fn runtime_runs_and_stops() {
    let config = SystemConfig {
        control_period_ms: 10,
        ..SystemConfig::default()
    };
    let hw = MockHardware::at(20.0);
    let app = Arc::new(AppService::new(&config, hw.clone()));
    app.handle_command(cupwarmer::app::commands::AppCommand::SetPower(true))
        .unwrap();

    let sink = RecordingSink::new();
    let rt = Runtime::spawn(app.clone(), &config, sink.clone()).unwrap();
    std::thread::sleep(Duration::from_millis(200));
    rt.shutdown();

    assert!(hw.drive_history().len() >= 2);
    assert!(sink.events().contains(&AppEvent::ModeChanged {
        from: HeatMode::Idle,
        to: HeatMode::Heating,
    }));
}
