//! System configuration parameters
//!
//! All tunable parameters for the CupWarmer system. Values are loaded once
//! at boot (NVS or defaults) and are immutable for the session.

use serde::{Deserialize, Serialize};

/// Upper bound accepted for `max_timer_minutes` (one day).
pub const TIMER_MINUTES_CEILING: u32 = 24 * 60;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- PID ---
    /// Proportional gain
    pub pid_kp: f32,
    /// Integral gain
    pub pid_ki: f32,
    /// Derivative gain
    pub pid_kd: f32,
    /// Anti-windup bound on the accumulated integral term
    pub pid_integral_limit: f32,

    // --- Temperature ---
    /// Lowest user-settable target (Celsius)
    pub target_min_c: i32,
    /// Highest user-settable target (Celsius)
    pub target_max_c: i32,
    /// Target applied at boot (Celsius)
    pub default_target_c: i32,
    /// Absolute ceiling that forces the heater off (Celsius)
    pub hard_limit_c: f32,
    /// Drive level (%) above which the plate counts as actively heating
    pub heating_active_threshold_percent: f32,

    // --- Scheduling ---
    /// Longest countdown a user may request (minutes)
    pub max_timer_minutes: u32,
    /// Countdown duration used until the user sets one (minutes)
    pub default_timer_minutes: u32,
    /// Minutes before an appointment at which heating starts
    pub preheat_offset_minutes: u32,

    // --- Timing ---
    /// Thermal control loop period (milliseconds)
    pub control_period_ms: u32,
    /// Scheduler tick period (milliseconds)
    pub scheduler_period_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // PID
            pid_kp: 2.0,
            pid_ki: 0.1,
            pid_kd: 0.5,
            pid_integral_limit: 50.0,

            // Temperature
            target_min_c: 30,
            target_max_c: 90,
            default_target_c: 55,
            hard_limit_c: 95.0,
            heating_active_threshold_percent: 5.0,

            // Scheduling
            max_timer_minutes: 240, // 4 h
            default_timer_minutes: 60,
            preheat_offset_minutes: 5,

            // Timing
            control_period_ms: 500,    // 2 Hz
            scheduler_period_ms: 1000, // 1 Hz
        }
    }
}

impl SystemConfig {
    /// Range-check every field. Invalid configurations are rejected, not
    /// clamped, so a bad blob can never disable the thermal cutoff.
    pub fn validate(&self) -> Result<(), &'static str> {
        for gain in [self.pid_kp, self.pid_ki, self.pid_kd] {
            if !gain.is_finite() || gain < 0.0 {
                return Err("PID gains must be finite and non-negative");
            }
        }
        if !self.pid_integral_limit.is_finite() || self.pid_integral_limit <= 0.0 {
            return Err("pid_integral_limit must be positive");
        }
        if self.target_min_c >= self.target_max_c {
            return Err("target_min_c must be < target_max_c");
        }
        if !(self.target_min_c..=self.target_max_c).contains(&self.default_target_c) {
            return Err("default_target_c must lie within the target range");
        }
        if !self.hard_limit_c.is_finite() || self.hard_limit_c <= self.target_max_c as f32 {
            return Err("hard_limit_c must be above target_max_c");
        }
        if !(0.0..100.0).contains(&self.heating_active_threshold_percent) {
            return Err("heating_active_threshold_percent must be 0–100");
        }
        if !(1..=TIMER_MINUTES_CEILING).contains(&self.max_timer_minutes) {
            return Err("max_timer_minutes must be 1–1440");
        }
        if !(1..=self.max_timer_minutes).contains(&self.default_timer_minutes) {
            return Err("default_timer_minutes must be 1–max_timer_minutes");
        }
        if self.preheat_offset_minutes >= 24 * 60 {
            return Err("preheat_offset_minutes must be under a day");
        }
        if self.control_period_ms == 0 || self.scheduler_period_ms == 0 {
            return Err("task periods must be non-zero");
        }
        if self.scheduler_period_ms % 1000 != 0 {
            return Err("scheduler_period_ms must be whole seconds");
        }
        Ok(())
    }

    /// Scheduler tick length in whole seconds.
    pub fn scheduler_tick_secs(&self) -> u32 {
        (self.scheduler_period_ms / 1000).max(1)
    }
}
