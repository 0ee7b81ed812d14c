//! Safety supervisor.
//!
//! Runs **every control cycle before the PID** and maintains a fault
//! bitmask that the thermal controller uses to override user intent.
//!
//! ## Fault priority
//!
//! 1. `OverTemperature`: plate at or above the hard limit. Forces power
//!    off and the heater to zero. Evaluated against the last *valid*
//!    temperature, so it still applies while the sensor is faulted.
//! 2. `SensorFault`: the current sample is invalid. Heater forced to
//!    zero, mode reported as `Error`.
//!
//! Both faults clear automatically once the condition goes away. Clearing
//! never restores power; that requires an explicit power-on request.

use crate::error::SafetyFault;
use log::{error, info};

/// What the controller must do this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hard limit reached: shut everything off, drop power.
    Shutdown,
    /// Sample invalid: heater off, report `Error`.
    SensorFault,
    /// No override; regulate normally.
    Normal,
}

/// Safety supervisor.
#[derive(Debug)]
pub struct SafetySupervisor {
    hard_limit_c: f32,
    /// Latched fault bitmask.
    faults: u8,
}

impl SafetySupervisor {
    pub fn new(hard_limit_c: f32) -> Self {
        Self {
            hard_limit_c,
            faults: 0,
        }
    }

    /// Evaluate both conditions and return the override for this cycle.
    ///
    /// * `last_valid_c`: most recent valid temperature (held over a fault).
    /// * `sample_valid`: whether this cycle's sample was valid.
    pub fn evaluate(&mut self, last_valid_c: f32, sample_valid: bool) -> Verdict {
        let over = last_valid_c >= self.hard_limit_c;
        self.eval_fault(SafetyFault::OverTemperature, over);
        self.eval_fault(SafetyFault::SensorFault, !sample_valid);

        if over {
            Verdict::Shutdown
        } else if !sample_valid {
            Verdict::SensorFault
        } else {
            Verdict::Normal
        }
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    pub fn hard_limit_c(&self) -> f32 {
        self.hard_limit_c
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: SafetyFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("SAFETY FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("SAFETY FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
