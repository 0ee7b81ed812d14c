//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`NtcSensor`] and the [`HeaterDriver`], exposing them through
//! [`SensorPort`] and [`HeaterPort`]. This is the only module in the
//! system that touches actual hardware. On non-espidf targets, the NTC
//! uses its cfg-gated simulation stub and the PWM channel is whatever the
//! caller passes in.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{HeaterPort, SensorPort};
use crate::drivers::heater::HeaterDriver;
use crate::error::SensorError;
use crate::sensors::NtcSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P> {
    ntc: NtcSensor,
    heater: HeaterDriver<P>,
    /// Latched so a dead PWM channel logs once, not every cycle.
    pwm_failed: bool,
}

impl<P: SetDutyCycle> HardwareAdapter<P> {
    pub fn new(ntc: NtcSensor, heater: HeaterDriver<P>) -> Self {
        Self {
            ntc,
            heater,
            pwm_failed: false,
        }
    }

    pub fn heater(&self) -> &HeaterDriver<P> {
        &self.heater
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P: SetDutyCycle> SensorPort for HardwareAdapter<P> {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.ntc.read()
    }
}

// ── HeaterPort implementation ─────────────────────────────────

impl<P: SetDutyCycle> HeaterPort for HardwareAdapter<P> {
    fn set_drive(&mut self, percent: f32) {
        match self.heater.set_drive(percent) {
            Ok(()) => self.pwm_failed = false,
            Err(e) => {
                if !self.pwm_failed {
                    warn!("Heater: {e} (requested {percent:.1}%)");
                }
                self.pwm_failed = true;
            }
        }
    }

    fn heater_off(&mut self) {
        if let Err(e) = self.heater.off() {
            warn!("Heater: {e} while switching off");
        }
    }
}
