//! Integration tests for the raw ADC → NTC → controller path.
//!
//! Uses the real [`HardwareAdapter`] with the host ADC injection point and
//! a PWM channel that records its duty. This is the only test binary
//! module that touches the injected ADC value, so the tests here run as
//! one sequence.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use core::convert::Infallible;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use cupwarmer::adapters::hardware::HardwareAdapter;
use cupwarmer::config::SystemConfig;
use cupwarmer::control::{HeatMode, ThermalController};
use cupwarmer::drivers::heater::HeaterDriver;
use cupwarmer::sensors::temperature::sim_set_temp_adc;
use cupwarmer::sensors::NtcSensor;

/// PWM channel exposing its last duty through a shared counter.
struct SharedPwm(Arc<AtomicU16>);

impl ErrorType for SharedPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SharedPwm {
    fn max_duty_cycle(&self) -> u16 {
        1023
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.0.store(duty, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn raw_adc_faults_and_recovery_reach_the_heater() {
    let duty = Arc::new(AtomicU16::new(0));
    let heater = HeaterDriver::new(SharedPwm(duty.clone())).unwrap();
    let hw = HardwareAdapter::new(NtcSensor::new(), heater);
    let ctl = ThermalController::new(&SystemConfig::default(), hw);
    ctl.set_power(true);

    // Mid-scale: ~1650 mV, about 25 °C, well below the 55 °C target.
    sim_set_temp_adc(2048);
    let r = ctl.tick().unwrap();
    assert_eq!(r.mode, HeatMode::Heating);
    assert!(duty.load(Ordering::SeqCst) > 0);
    assert!((ctl.current_temperature() - 25.0).abs() < 0.5);

    // Shorted (0 mV) and open (3300 mV) probe.
    for raw in [0, 4095] {
        sim_set_temp_adc(raw);
        let r = ctl.tick().unwrap();
        assert_eq!(r.mode, HeatMode::Error, "raw {raw}");
        assert_eq!(r.drive_percent, 0.0);
        assert_eq!(duty.load(Ordering::SeqCst), 0);
        assert!(!ctl.is_sensor_ok());
        assert!(!ctl.is_heating());
        assert!(ctl.power(), "a sensor fault must not drop power");
    }

    sim_set_temp_adc(2048);
    let r = ctl.tick().unwrap();
    assert_eq!(r.mode, HeatMode::Heating);
    assert!(ctl.is_sensor_ok());
    assert!(duty.load(Ordering::SeqCst) > 0);
}
