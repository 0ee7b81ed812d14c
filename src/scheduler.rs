//! Heating scheduler: countdown timer and daily appointment.
//!
//! Decides *when* the plate should be powered. It never touches the
//! heater itself; it flips the controller's [`PowerSwitch`] and reads the
//! wall clock through a [`TimePort`].
//!
//! ```text
//!                 set_schedule            fires (preheat before HH:MM)
//!   ┌──────┐ ───────────────▶ ┌───────────┐ ─────────────▶ ┌──────────────┐
//!   │ Idle │                  │ Scheduled │                │ TimerRunning │
//!   └──────┘ ◀─────────────── └───────────┘                └──────┬───────┘
//!      ▲  ▲    cancel_schedule                  start_timer ▲     │ expires
//!      │  └──────────────────────────────────────────────────┘     ▼
//!      │                stop_timer / user power-off          ┌──────────┐
//!      └─────────────────────────────────────────────────────│ TimedOut │
//!                                                            └──────────┘
//! ```
//!
//! The countdown only advances while the plate is powered. A hard-limit
//! shutoff stops it outright (`AppService::control_tick` calls
//! [`stop_timer`](HeatingScheduler::stop_timer)), so it never sits paused
//! in `TimerRunning` with power off.
//!
//! Both the countdown and the appointment check run inside one critical
//! section per tick. Lock order is always scheduler → controller.

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{PowerSwitch, TimePort};
use crate::config::{SystemConfig, TIMER_MINUTES_CEILING};
use crate::error::ScheduleError;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Scheduler mode as reported on the status interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerMode {
    Idle,
    TimerRunning,
    Scheduled,
    TimedOut,
}

// ═══════════════════════════════════════════════════════════════
//  Appointment time-of-day
// ═══════════════════════════════════════════════════════════════

/// A validated `HH:MM` time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTime);
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// Minute of day `offset` minutes earlier, wrapping past midnight.
    pub fn minutes_before(&self, offset: u32) -> u16 {
        let offset = (offset % u32::from(MINUTES_PER_DAY)) as u16;
        (self.minute_of_day() + MINUTES_PER_DAY - offset) % MINUTES_PER_DAY
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parse an appointment string of the form `HH:MM` (two digits each,
/// surrounding whitespace ignored).
pub fn parse_time_of_day(text: &str) -> Result<TimeOfDay, ScheduleError> {
    let (h, m) = text
        .trim()
        .split_once(':')
        .ok_or(ScheduleError::InvalidTime)?;
    TimeOfDay::new(two_digits(h)?, two_digits(m)?)
}

fn two_digits(part: &str) -> Result<u8, ScheduleError> {
    match part.as_bytes() {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => Ok((a - b'0') * 10 + (b - b'0')),
        _ => Err(ScheduleError::InvalidTime),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTick {
    pub mode: SchedulerMode,
    /// The countdown reached zero and power was dropped.
    pub expired: bool,
    /// The appointment fired and power was raised.
    pub fired: Option<TimeOfDay>,
}

type TimeoutCallback = Box<dyn FnMut() + Send>;

/// Everything guarded by the scheduler lock.
struct ScheduleState {
    duration_minutes: u32,
    remaining_secs: u32,
    running: bool,
    appointment: Option<TimeOfDay>,
    appointment_active: bool,
    mode: SchedulerMode,
    on_timeout: Option<TimeoutCallback>,
}

impl ScheduleState {
    fn arm(&mut self) {
        self.running = true;
        self.remaining_secs = self.duration_minutes.saturating_mul(60);
        self.mode = SchedulerMode::TimerRunning;
    }
}

/// Countdown and appointment engine.
pub struct HeatingScheduler {
    state: Mutex<ScheduleState>,
    power: Arc<dyn PowerSwitch>,
    clock: Arc<dyn TimePort>,
    max_minutes: u32,
    preheat_minutes: u32,
    tick_secs: u32,
}

impl HeatingScheduler {
    pub fn new(config: &SystemConfig, power: Arc<dyn PowerSwitch>, clock: Arc<dyn TimePort>) -> Self {
        let max_minutes = config.max_timer_minutes.clamp(1, TIMER_MINUTES_CEILING);
        Self {
            state: Mutex::new(ScheduleState {
                duration_minutes: config.default_timer_minutes.clamp(1, max_minutes),
                remaining_secs: 0,
                running: false,
                appointment: None,
                appointment_active: false,
                mode: SchedulerMode::Idle,
                on_timeout: None,
            }),
            power,
            clock,
            max_minutes,
            preheat_minutes: config.preheat_offset_minutes,
            tick_secs: config.scheduler_tick_secs(),
        }
    }

    /// Advance the countdown and check the appointment.
    ///
    /// Returns `None` when the lock is contended; the tick is skipped.
    pub fn tick(&self) -> Option<SchedulerTick> {
        let mut st = match self.state.try_lock() {
            Ok(st) => st,
            Err(TryLockError::WouldBlock) => {
                debug!("Scheduler: lock busy, tick skipped");
                return None;
            }
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
        };

        let mut expired = false;
        if st.running && self.power.is_powered() {
            st.remaining_secs = st.remaining_secs.saturating_sub(self.tick_secs);
            if st.remaining_secs == 0 {
                st.running = false;
                st.mode = SchedulerMode::TimedOut;
                info!("Scheduler: timer expired, turning heater off");
                self.power.set_power(false);
                if let Some(cb) = st.on_timeout.as_mut() {
                    cb();
                }
                expired = true;
            }
        }

        let mut fired = None;
        if let Some(at) = st.appointment.filter(|_| st.appointment_active) {
            if !self.power.is_powered()
                && self.clock.now().minute_of_day() == at.minutes_before(self.preheat_minutes)
            {
                info!(
                    "Scheduler: appointment {} triggered, preheating {} min early",
                    at, self.preheat_minutes
                );
                self.power.set_power(true);
                st.appointment_active = false;
                st.arm();
                fired = Some(at);
            }
        }

        Some(SchedulerTick {
            mode: st.mode,
            expired,
            fired,
        })
    }

    // ── Countdown ─────────────────────────────────────────────

    /// Set the countdown length, clamped to 1 – max. While the plate is
    /// powered the running countdown restarts at the new length.
    /// Returns the value applied.
    pub fn set_timer_duration(&self, minutes: i32) -> u32 {
        let minutes = u32::try_from(minutes.max(1)).map_or(1, |m| m.min(self.max_minutes));
        let mut st = self.lock();
        st.duration_minutes = minutes;
        if self.power.is_powered() {
            st.arm();
        } else {
            st.remaining_secs = st.remaining_secs.min(minutes.saturating_mul(60));
        }
        drop(st);
        info!("Scheduler: timer duration {} min", minutes);
        minutes
    }

    pub fn timer_duration(&self) -> u32 {
        self.lock().duration_minutes
    }

    /// Remaining countdown in whole minutes, rounded up.
    pub fn timer_remaining(&self) -> u32 {
        self.lock().remaining_secs.div_ceil(60)
    }

    pub fn timer_remaining_secs(&self) -> u32 {
        self.lock().remaining_secs
    }

    pub fn is_timer_running(&self) -> bool {
        self.lock().running
    }

    /// Arm the countdown with the configured duration.
    pub fn start_timer(&self) {
        let mut st = self.lock();
        st.arm();
        let minutes = st.duration_minutes;
        drop(st);
        info!("Scheduler: timer started, {} min", minutes);
    }

    pub fn stop_timer(&self) {
        let mut st = self.lock();
        st.running = false;
        st.remaining_secs = 0;
        if matches!(st.mode, SchedulerMode::TimerRunning | SchedulerMode::TimedOut) {
            st.mode = SchedulerMode::Idle;
        }
        drop(st);
        info!("Scheduler: timer stopped");
    }

    // ── Appointment ───────────────────────────────────────────

    /// Set the daily appointment. Malformed input is rejected and the
    /// current schedule is left untouched.
    pub fn set_schedule(&self, text: &str) -> Result<TimeOfDay, ScheduleError> {
        let at = parse_time_of_day(text).inspect_err(|_| {
            warn!("Scheduler: rejected appointment {:?}", text);
        })?;
        let mut st = self.lock();
        st.appointment = Some(at);
        st.appointment_active = true;
        st.mode = SchedulerMode::Scheduled;
        drop(st);
        info!(
            "Scheduler: appointment {} (preheat {} min before)",
            at, self.preheat_minutes
        );
        Ok(at)
    }

    /// Last accepted appointment. Kept after it fires, cleared by cancel.
    pub fn schedule(&self) -> Option<TimeOfDay> {
        self.lock().appointment
    }

    pub fn is_schedule_active(&self) -> bool {
        self.lock().appointment_active
    }

    pub fn cancel_schedule(&self) {
        let mut st = self.lock();
        st.appointment = None;
        st.appointment_active = false;
        if st.mode == SchedulerMode::Scheduled {
            st.mode = SchedulerMode::Idle;
        }
        drop(st);
        info!("Scheduler: appointment cancelled");
    }

    // ── Misc ──────────────────────────────────────────────────

    pub fn mode(&self) -> SchedulerMode {
        self.lock().mode
    }

    /// Install the expiry handler. It runs inside the scheduler's critical
    /// section and must not block or call back into the scheduler.
    pub fn set_timeout_callback(&self, callback: impl FnMut() + Send + 'static) {
        self.lock().on_timeout = Some(Box::new(callback));
    }

    fn lock(&self) -> MutexGuard<'_, ScheduleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
