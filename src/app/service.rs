//! Application service, the hexagonal core.
//!
//! [`AppService`] wires the thermal controller, the heating scheduler and
//! the wall clock together. It exposes a hardware-agnostic API for
//! commands, status reports and the three periodic steps the runtime
//! drives. All I/O flows through port traits, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService          │
//!  HeaterPort ◀── │ Controller · Scheduler · RTC │ ◀── AppCommand
//!                 └──────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::adapters::time::SoftRtc;
use crate::config::SystemConfig;
use crate::control::{CycleReport, HeatMode, ThermalController};
use crate::error::{Error, Result};
use crate::scheduler::{HeatingScheduler, SchedulerTick};

use super::commands::{AppCommand, ControlRequest, SyncTimeRequest};
use super::events::{AppEvent, StatusReport};
use super::ports::{EventSink, HeaterPort, PowerSwitch, SensorPort, TimePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<HW> {
    controller: Arc<ThermalController<HW>>,
    scheduler: Arc<HeatingScheduler>,
    clock: Arc<SoftRtc>,
    /// Mode seen at the end of the previous control cycle.
    reported_mode: Mutex<HeatMode>,
}

impl<HW> AppService<HW>
where
    HW: SensorPort + HeaterPort + Send + 'static,
{
    /// Construct the service from configuration with the clock at its
    /// default start time.
    pub fn new(config: &SystemConfig, hw: HW) -> Self {
        Self::with_clock(config, hw, Arc::new(SoftRtc::new()))
    }

    pub fn with_clock(config: &SystemConfig, hw: HW, clock: Arc<SoftRtc>) -> Self {
        let controller = Arc::new(ThermalController::new(config, hw));
        let power: Arc<dyn PowerSwitch> = controller.clone();
        let time: Arc<dyn TimePort> = clock.clone();
        let scheduler = Arc::new(HeatingScheduler::new(config, power, time));
        let reported_mode = Mutex::new(controller.mode());

        Self {
            controller,
            scheduler,
            clock,
            reported_mode,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&self, sink: &mut impl EventSink) {
        let status = self.status();
        info!(
            "AppService started: target {}°C, timer {} min",
            status.target_temp,
            self.scheduler.timer_duration()
        );
        sink.emit(&AppEvent::Started(status));
    }

    // ── Periodic steps ────────────────────────────────────────

    /// One control cycle. Emits mode changes and safety shutdowns. A
    /// hard-limit shutoff also stops the countdown, so the status never
    /// shows a running timer on an unpowered plate.
    pub fn control_tick(&self, sink: &mut impl EventSink) -> Option<CycleReport> {
        let report = self.controller.tick()?;

        if report.forced_off {
            self.scheduler.stop_timer();
            sink.emit(&AppEvent::SafetyShutdown {
                temp_c: self.controller.current_temperature(),
            });
        }

        let mut last = self
            .reported_mode
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *last != report.mode {
            sink.emit(&AppEvent::ModeChanged {
                from: *last,
                to: report.mode,
            });
            *last = report.mode;
        }
        Some(report)
    }

    /// One scheduler tick. Emits expiry and appointment events.
    pub fn scheduler_tick(&self, sink: &mut impl EventSink) -> Option<SchedulerTick> {
        let tick = self.scheduler.tick()?;
        if tick.expired {
            sink.emit(&AppEvent::TimerExpired);
        }
        if let Some(at) = tick.fired {
            sink.emit(&AppEvent::ScheduleFired(at));
        }
        Some(tick)
    }

    /// Advance the wall clock by one second.
    pub fn clock_tick(&self) {
        self.clock.advance_second();
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one command. Out-of-range numbers are clamped; malformed
    /// strings are rejected without touching state.
    pub fn handle_command(&self, cmd: AppCommand) -> Result<()> {
        match cmd {
            AppCommand::SetPower(true) => {
                if !self.controller.power() {
                    self.controller.set_power(true);
                    self.scheduler.start_timer();
                }
            }
            AppCommand::SetPower(false) => {
                self.controller.set_power(false);
                self.scheduler.stop_timer();
            }
            AppCommand::SetTargetTemp(t) => {
                self.controller.set_target(t);
            }
            AppCommand::SetTimerDuration(m) => {
                self.scheduler.set_timer_duration(m);
            }
            AppCommand::SetScheduleTime(s) => {
                self.scheduler.set_schedule(&s)?;
            }
            AppCommand::CancelSchedule => self.scheduler.cancel_schedule(),
            AppCommand::StartTimer => self.scheduler.start_timer(),
            AppCommand::StopTimer => self.scheduler.stop_timer(),
            AppCommand::SyncTime(t) => self.clock.set_time(t),
        }
        Ok(())
    }

    /// Decode and apply a `/control` body. Every present field is applied
    /// even if an earlier one was rejected; the first rejection is returned.
    pub fn handle_control_json(&self, body: &str) -> Result<()> {
        let req = ControlRequest::from_json(body).map_err(|e| {
            warn!("AppService: bad control body: {e}");
            Error::Request("invalid control JSON")
        })?;
        let mut first_err = None;
        for cmd in req.into_commands() {
            if let Err(e) = self.handle_command(cmd) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Decode and apply a `/sync_time` body.
    pub fn handle_sync_time_json(&self, body: &str) -> Result<()> {
        let req = SyncTimeRequest::from_json(body).map_err(|e| {
            warn!("AppService: bad sync_time body: {e}");
            Error::Request("invalid sync_time JSON")
        })?;
        let cmd = req.into_command().inspect_err(|e| {
            warn!("AppService: {e}");
        })?;
        self.handle_command(cmd)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> StatusReport {
        // Each component is read under its own lock; no nesting.
        let schedule_time = self
            .scheduler
            .schedule()
            .map(|at| {
                let mut s = heapless::String::new();
                // "HH:MM" always fits
                let _ = core::fmt::write(&mut s, format_args!("{at}"));
                s
            })
            .unwrap_or_default();
        let timer_remaining = self.scheduler.timer_remaining();
        let scheduler_mode = self.scheduler.mode();
        let ctl = self.controller.snapshot();
        let now = self.clock.calendar();

        StatusReport {
            current_temp: ctl.current_temp_c,
            target_temp: ctl.target_c,
            is_heating: ctl.heating,
            esp_time: now.hh_mm(),
            weekday: now.weekday,
            timer_remaining,
            schedule_time,
            mode: ctl.mode(),
            sensor_ok: ctl.sensor_ok,
            power: ctl.power_on,
            scheduler_mode,
        }
    }

    pub fn controller(&self) -> &ThermalController<HW> {
        &self.controller
    }

    pub fn scheduler(&self) -> &HeatingScheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> &SoftRtc {
        &self.clock
    }
}
