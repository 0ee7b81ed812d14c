//! Thermal control loop.
//!
//! [`ThermalController`] is the sole writer of [`ControlState`]. Each
//! cycle it reads the NTC, lets the [`SafetySupervisor`] decide whether
//! to override, runs the PID and drives the heater.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────────┐ ──▶ HeaterPort
//!                 │  Safety ─▶ PID ─▶ drive     │
//!   set_power ──▶ │  ControlState (one lock)    │ ──▶ snapshots
//!  set_target ──▶ └─────────────────────────────┘
//! ```
//!
//! The whole read-compute-write sequence runs under one mutex, so a
//! reader can never observe e.g. `heating == true` together with
//! `mode == Idle`. The periodic [`tick`](ThermalController::tick) uses
//! `try_lock` and skips the cycle rather than wait on a contended lock.

use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{HeaterPort, PowerSwitch, SensorPort};
use crate::config::SystemConfig;
use crate::control::pid::PidController;
use crate::safety::{SafetySupervisor, Verdict};

/// Temperature reported before the first valid sample arrives.
const AMBIENT_C: f32 = 25.0;

/// Operating mode, derived from [`ControlState`] on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatMode {
    Idle,
    Heating,
    Keeping,
    Error,
}

/// Point-in-time controller state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    /// Last valid plate temperature (°C). Held while the sensor is faulted.
    pub current_temp_c: f32,
    /// User target (°C), always inside the configured range.
    pub target_c: i32,
    pub power_on: bool,
    /// Drive above the active threshold.
    pub heating: bool,
    pub sensor_ok: bool,
    /// Hard limit reached on the last cycle.
    pub over_temperature: bool,
    /// Last commanded heater drive (%).
    pub drive_percent: f32,
}

impl ControlState {
    fn new(target_c: i32) -> Self {
        Self {
            current_temp_c: AMBIENT_C,
            target_c,
            power_on: false,
            heating: false,
            sensor_ok: true,
            over_temperature: false,
            drive_percent: 0.0,
        }
    }

    /// Mode as a pure function of the other fields.
    pub fn mode(&self) -> HeatMode {
        if self.over_temperature {
            HeatMode::Idle
        } else if !self.sensor_ok {
            HeatMode::Error
        } else if !self.power_on {
            HeatMode::Idle
        } else if self.heating {
            HeatMode::Heating
        } else {
            HeatMode::Keeping
        }
    }
}

/// Summary of one completed control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub mode: HeatMode,
    pub drive_percent: f32,
    /// Safety fault bitmask after this cycle.
    pub faults: u8,
    /// Power was on and the hard limit forced it off this cycle.
    pub forced_off: bool,
}

/// Everything guarded by the controller lock.
struct ControlCore<HW> {
    state: ControlState,
    pid: PidController,
    safety: SafetySupervisor,
    hw: HW,
}

impl<HW: SensorPort + HeaterPort> ControlCore<HW> {
    fn cycle(&mut self, active_threshold: f32) -> CycleReport {
        // 1. Acquire
        match self.hw.read_temperature() {
            Ok(t) => {
                self.state.sensor_ok = true;
                self.state.current_temp_c = t;
            }
            Err(e) => {
                if self.state.sensor_ok {
                    warn!("Thermal: NTC sample rejected ({e}), heater disabled");
                }
                self.state.sensor_ok = false;
            }
        }

        // 2-3. Safety overrides
        let had_faults = self.safety.has_faults();
        let verdict = self
            .safety
            .evaluate(self.state.current_temp_c, self.state.sensor_ok);
        if had_faults && !self.safety.has_faults() {
            self.pid.reset();
        }
        self.state.over_temperature = verdict == Verdict::Shutdown;

        let mut forced_off = false;
        match verdict {
            Verdict::Shutdown => {
                if self.state.power_on {
                    warn!(
                        "Thermal: {:.1}°C >= hard limit {:.1}°C, emergency shutoff",
                        self.state.current_temp_c,
                        self.safety.hard_limit_c()
                    );
                    forced_off = true;
                }
                self.state.power_on = false;
                self.drive_off();
            }
            Verdict::SensorFault => self.drive_off(),
            Verdict::Normal if self.state.power_on => {
                // 4. Regulate
                self.pid.set_setpoint(self.state.target_c as f32);
                let output = self.pid.compute(self.state.current_temp_c);
                self.hw.set_drive(output);
                self.state.drive_percent = output;
                self.state.heating = output > active_threshold;
                debug!(
                    "Thermal: {:.1}°C -> {}°C, drive {:.1}%",
                    self.state.current_temp_c, self.state.target_c, output
                );
            }
            Verdict::Normal => {
                // 5. Powered off
                self.drive_off();
                self.pid.reset();
            }
        }

        CycleReport {
            mode: self.state.mode(),
            drive_percent: self.state.drive_percent,
            faults: self.safety.faults(),
            forced_off,
        }
    }

    fn drive_off(&mut self) {
        self.hw.heater_off();
        self.state.drive_percent = 0.0;
        self.state.heating = false;
    }
}

/// Closed-loop plate temperature controller with safety overrides.
pub struct ThermalController<HW> {
    core: Mutex<ControlCore<HW>>,
    target_min_c: i32,
    target_max_c: i32,
    active_threshold: f32,
}

impl<HW: SensorPort + HeaterPort> ThermalController<HW> {
    pub fn new(config: &SystemConfig, hw: HW) -> Self {
        let mut pid = PidController::new(config.pid_kp, config.pid_ki, config.pid_kd);
        pid.set_output_limits(0.0, 100.0);
        pid.set_integral_limit(config.pid_integral_limit);

        let target = config
            .default_target_c
            .clamp(config.target_min_c, config.target_max_c);

        info!(
            "Thermal: PID kp={:.2} ki={:.2} kd={:.2}, range {}–{}°C, hard limit {:.0}°C",
            config.pid_kp,
            config.pid_ki,
            config.pid_kd,
            config.target_min_c,
            config.target_max_c,
            config.hard_limit_c
        );

        Self {
            core: Mutex::new(ControlCore {
                state: ControlState::new(target),
                pid,
                safety: SafetySupervisor::new(config.hard_limit_c),
                hw,
            }),
            target_min_c: config.target_min_c,
            target_max_c: config.target_max_c,
            active_threshold: config.heating_active_threshold_percent,
        }
    }

    /// Run one control cycle.
    ///
    /// Returns `None` when the state lock is contended; the cycle is
    /// skipped and the next period retries.
    pub fn tick(&self) -> Option<CycleReport> {
        let mut core = match self.core.try_lock() {
            Ok(core) => core,
            Err(TryLockError::WouldBlock) => {
                debug!("Thermal: lock busy, cycle skipped");
                return None;
            }
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
        };
        Some(core.cycle(self.active_threshold))
    }

    // ── Commands ──────────────────────────────────────────────

    /// Request heating on or off. Turning off drives the heater to zero
    /// immediately; turning on takes effect on the next cycle.
    pub fn set_power(&self, on: bool) {
        let mut core = self.lock();
        if on && !core.state.power_on {
            core.pid.reset();
        }
        core.state.power_on = on;
        if !on {
            core.drive_off();
            core.pid.reset();
        }
        drop(core);
        info!("Thermal: power {}", if on { "ON" } else { "OFF" });
    }

    /// Set the target temperature, clamped to the configured range.
    /// Returns the value actually applied.
    pub fn set_target(&self, target_c: i32) -> i32 {
        let clamped = target_c.clamp(self.target_min_c, self.target_max_c);
        self.lock().state.target_c = clamped;
        if clamped == target_c {
            info!("Thermal: target {}°C", clamped);
        } else {
            info!("Thermal: target {}°C clamped to {}°C", target_c, clamped);
        }
        clamped
    }

    // ── Queries ───────────────────────────────────────────────

    /// Consistent copy of the whole state.
    pub fn snapshot(&self) -> ControlState {
        self.lock().state
    }

    pub fn power(&self) -> bool {
        self.lock().state.power_on
    }

    pub fn target(&self) -> i32 {
        self.lock().state.target_c
    }

    pub fn current_temperature(&self) -> f32 {
        self.lock().state.current_temp_c
    }

    pub fn is_heating(&self) -> bool {
        self.lock().state.heating
    }

    pub fn mode(&self) -> HeatMode {
        self.lock().state.mode()
    }

    pub fn is_sensor_ok(&self) -> bool {
        self.lock().state.sensor_ok
    }

    /// Active safety fault bitmask.
    pub fn faults(&self) -> u8 {
        self.lock().safety.faults()
    }

    fn lock(&self) -> MutexGuard<'_, ControlCore<HW>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<HW: SensorPort + HeaterPort + Send> PowerSwitch for ThermalController<HW> {
    fn set_power(&self, on: bool) {
        ThermalController::set_power(self, on);
    }

    fn is_powered(&self) -> bool {
        self.power()
    }
}
