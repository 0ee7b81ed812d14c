//! Integration tests for scheduler → controller power handoff.
//!
//! The clock, scheduler and controller are ticked in lockstep the way the
//! runtime drives them, one simulated second per step.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::mock_hw::{MockHardware, RecordingSink};

use cupwarmer::adapters::time::{CalendarTime, SoftRtc};
use cupwarmer::app::commands::AppCommand;
use cupwarmer::app::events::AppEvent;
use cupwarmer::app::service::AppService;
use cupwarmer::config::SystemConfig;
use cupwarmer::scheduler::{SchedulerMode, TimeOfDay};

fn app_at(hour: u8, minute: u8, second: u8) -> (AppService<MockHardware>, RecordingSink) {
    let clock = Arc::new(SoftRtc::starting_at(CalendarTime {
        hour,
        minute,
        second,
        ..CalendarTime::default()
    }));
    let app = AppService::with_clock(&SystemConfig::default(), MockHardware::at(40.0), clock);
    (app, RecordingSink::new())
}

/// One simulated second: the clock advances, then the scheduler ticks.
fn step(app: &AppService<MockHardware>, sink: &mut RecordingSink) {
    app.clock_tick();
    app.scheduler_tick(sink);
}

#[test]
fn one_hour_countdown_powers_off_once() {
    let (app, mut sink) = app_at(12, 0, 0);
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    app.scheduler().set_timeout_callback(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });

    app.handle_command(AppCommand::SetPower(true)).unwrap();
    assert_eq!(app.scheduler().timer_remaining(), 60);

    for _ in 0..3600 {
        step(&app, &mut sink);
    }

    let sched = app.scheduler();
    assert!(!sched.is_timer_running());
    assert_eq!(sched.timer_remaining(), 0);
    assert_eq!(sched.mode(), SchedulerMode::TimedOut);
    assert!(!app.controller().power());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    for _ in 0..120 {
        step(&app, &mut sink);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(sink.count(|e| *e == AppEvent::TimerExpired), 1);
}

#[test]
fn appointment_preheats_five_minutes_early() {
    let (app, mut sink) = app_at(8, 23, 0);
    app.handle_command(AppCommand::SetScheduleTime("08:30".into()))
        .unwrap();

    // Through 08:24:59 nothing happens.
    for _ in 0..119 {
        step(&app, &mut sink);
        assert!(!app.controller().power());
    }
    assert_eq!(app.scheduler().mode(), SchedulerMode::Scheduled);

    // 08:25:00
    step(&app, &mut sink);
    assert!(app.controller().power());
    assert_eq!(app.scheduler().mode(), SchedulerMode::TimerRunning);
    assert_eq!(app.scheduler().timer_remaining(), 60);
    assert!(sink
        .events()
        .contains(&AppEvent::ScheduleFired(TimeOfDay::new(8, 30).unwrap())));
}

#[test]
fn appointment_countdown_uses_configured_duration() {
    let (app, mut sink) = app_at(6, 54, 59);
    app.handle_command(AppCommand::SetTimerDuration(2)).unwrap();
    app.handle_command(AppCommand::SetScheduleTime("07:00".into()))
        .unwrap();

    step(&app, &mut sink); // 06:55:00 fires
    assert!(app.controller().power());
    assert_eq!(app.scheduler().timer_remaining(), 2);

    for _ in 0..120 {
        step(&app, &mut sink);
    }
    assert!(!app.controller().power());
    assert_eq!(app.scheduler().mode(), SchedulerMode::TimedOut);
}

#[test]
fn appointment_does_not_fire_when_already_heating() {
    let (app, mut sink) = app_at(8, 24, 30);
    app.handle_command(AppCommand::SetScheduleTime("08:30".into()))
        .unwrap();
    app.handle_command(AppCommand::SetPower(true)).unwrap();
    for _ in 0..90 {
        step(&app, &mut sink);
    }
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ScheduleFired(_))), 0);
    assert!(app.scheduler().is_schedule_active());
}

#[test]
fn user_power_off_clears_timeout() {
    let (app, mut sink) = app_at(9, 0, 0);
    app.handle_command(AppCommand::SetTimerDuration(1)).unwrap();
    app.handle_command(AppCommand::SetPower(true)).unwrap();
    for _ in 0..60 {
        step(&app, &mut sink);
    }
    assert_eq!(app.scheduler().mode(), SchedulerMode::TimedOut);

    app.handle_command(AppCommand::SetPower(false)).unwrap();
    assert_eq!(app.scheduler().mode(), SchedulerMode::Idle);
}

#[test]
fn duration_change_while_heating_restarts_countdown() {
    let (app, mut sink) = app_at(9, 0, 0);
    app.handle_command(AppCommand::SetPower(true)).unwrap();
    for _ in 0..300 {
        step(&app, &mut sink);
    }
    assert_eq!(app.scheduler().timer_remaining(), 55);
    app.handle_command(AppCommand::SetTimerDuration(90)).unwrap();
    assert_eq!(app.scheduler().timer_remaining(), 90);
    assert_eq!(app.scheduler().timer_remaining_secs(), 90 * 60);
}

#[test]
fn malformed_appointments_leave_schedule_untouched() {
    let (app, _) = app_at(9, 0, 0);
    for bad in ["25:61", "abc", ""] {
        assert!(app
            .handle_command(AppCommand::SetScheduleTime(bad.into()))
            .is_err());
    }
    assert_eq!(app.scheduler().schedule(), None);
    assert_eq!(app.scheduler().mode(), SchedulerMode::Idle);
    assert!(!app.scheduler().is_schedule_active());
}

#[test]
fn cancel_schedule_returns_to_idle() {
    let (app, _) = app_at(9, 0, 0);
    app.handle_command(AppCommand::SetScheduleTime("10:00".into()))
        .unwrap();
    app.handle_command(AppCommand::CancelSchedule).unwrap();
    assert_eq!(app.scheduler().mode(), SchedulerMode::Idle);
    assert_eq!(app.status().schedule_time.as_str(), "");
}
