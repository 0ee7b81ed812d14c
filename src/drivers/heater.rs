//! Heater MOSFET driver.
//!
//! Converts a 0 – 100 % drive level into a PWM duty on any
//! [`SetDutyCycle`] channel. On the board this is the LEDC channel on
//! [`HEATER_PWM_GPIO`](crate::pins::HEATER_PWM_GPIO) at 1 kHz, 10-bit;
//! host tests pass a recording mock.
//!
//! ## Safety contract
//!
//! This driver is a dumb actuator. Over-temperature and sensor faults are
//! enforced by the thermal controller, which calls [`HeaterDriver::off`].

use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaterState {
    Off,
    Driving { percent: f32, duty: u16 },
}

pub struct HeaterDriver<P> {
    pwm: P,
    state: HeaterState,
}

impl<P: SetDutyCycle> HeaterDriver<P> {
    /// Takes ownership of the channel and forces it to 0 %.
    pub fn new(pwm: P) -> Result<Self, ActuatorError> {
        let mut driver = Self {
            pwm,
            state: HeaterState::Off,
        };
        driver.off()?;
        Ok(driver)
    }

    /// Drive at `percent`, clamped to 0 – 100. NaN counts as 0.
    pub fn set_drive(&mut self, percent: f32) -> Result<(), ActuatorError> {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        if percent == 0.0 {
            return self.off();
        }

        let duty = duty_for(percent, self.pwm.max_duty_cycle());
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.state = HeaterState::Driving { percent, duty };
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        // State goes to Off even if the write fails; callers retry next cycle.
        self.state = HeaterState::Off;
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| ActuatorError::PwmWriteFailed)
    }

    pub fn state(&self) -> HeaterState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        !matches!(self.state, HeaterState::Off)
    }

    pub fn current_percent(&self) -> f32 {
        match self.state {
            HeaterState::Off => 0.0,
            HeaterState::Driving { percent, .. } => percent,
        }
    }
}

fn duty_for(percent: f32, max_duty: u16) -> u16 {
    ((percent / 100.0) * f32::from(max_duty)).round() as u16
}
