//! PID controller for plate temperature
//!
//! Positional proportional-integral-derivative controller. The caller
//! invokes [`PidController::compute`] at a fixed period, so the integral
//! and derivative terms are expressed per-sample rather than per-second.
//!
//! Anti-windup: the accumulated error is clamped to `±integral_limit`
//! before it is scaled by `ki`.

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_error: f32,
    output_min: f32,
    output_max: f32,
    integral_limit: f32,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            output_min: 0.0,
            output_max: 100.0,
            integral_limit: 50.0,
        }
    }

    /// Set output limits
    pub fn set_output_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
    }

    /// Bound on the accumulated error. Takes effect on the next compute.
    pub fn set_integral_limit(&mut self, limit: f32) {
        self.integral_limit = limit.abs();
    }

    /// Re-tune. Accumulated state is kept.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Update setpoint
    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Compute PID output given current measurement
    pub fn compute(&mut self, measurement: f32) -> f32 {
        let error = self.setpoint - measurement;

        // Proportional
        let p = self.kp * error;

        // Integral (clamped accumulator)
        self.integral = (self.integral + error).clamp(-self.integral_limit, self.integral_limit);
        let i = self.ki * self.integral;

        // Derivative
        let d = self.kd * (error - self.prev_error);
        self.prev_error = error;

        (p + i + d).clamp(self.output_min, self.output_max)
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }
}
