//! NTC thermistor plate sensor (10 kOhm @ 25 C, B = 3950).
//!
//! Wired in a voltage divider with a fixed 10 kOhm resistor to 3.3 V and
//! read through ADC1. The simplified Beta equation converts resistance to
//! temperature.
//!
//! Readings outside 100 – 3200 mV mean an open or shorted probe; they are
//! rejected with [`SensorError::OutOfRange`] instead of being converted.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the NTC channel via the oneshot API (initialised by
//! hw_init), in calibrated millivolts when available.
//! On host/test: reads from a static AtomicU16 for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;

/// Mid-scale: roughly 25 °C with the reference divider.
#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_ADC: AtomicU16 = AtomicU16::new(2048);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temp_adc(raw: u16) {
    SIM_TEMP_ADC.store(raw, Ordering::Relaxed);
}

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_SERIES: f32 = 10_000.0;
const ADC_MAX: u32 = 4095;
const V_REF_MV: u32 = 3300;

/// Plausible divider voltage window (mV).
pub const VALID_MV_MIN: u32 = 100;
pub const VALID_MV_MAX: u32 = 3200;

/// 12-bit raw count to millivolts at the reference voltage.
pub fn raw_to_millivolts(raw: u16) -> u32 {
    u32::from(raw).min(ADC_MAX) * V_REF_MV / ADC_MAX
}

/// Divider voltage to plate temperature.
pub fn celsius_from_millivolts(mv: u32) -> Result<f32, SensorError> {
    if !(VALID_MV_MIN..=VALID_MV_MAX).contains(&mv) {
        return Err(SensorError::OutOfRange(mv));
    }
    let v = mv as f32;
    let r_ntc = R_SERIES * v / (V_REF_MV as f32 - v);
    let inv_t = (1.0 / T25_K) + (r_ntc / R25).ln() / BETA;
    Ok((1.0 / inv_t) - 273.15)
}

/// Plate thermistor on the ADC1 channel from [`pins`](crate::pins).
#[derive(Debug, Default)]
pub struct NtcSensor;

impl NtcSensor {
    pub fn new() -> Self {
        Self
    }

    /// Sample the divider once and convert.
    pub fn read(&mut self) -> Result<f32, SensorError> {
        let mv = self.read_millivolts().ok_or(SensorError::AdcReadFailed)?;
        celsius_from_millivolts(mv)
    }

    /// Calibrated when the eFuse scheme is available, linear otherwise.
    #[cfg(target_os = "espidf")]
    fn read_millivolts(&self) -> Option<u32> {
        hw_init::adc1_read_mv(crate::pins::NTC_ADC_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_millivolts(&self) -> Option<u32> {
        Some(raw_to_millivolts(SIM_TEMP_ADC.load(Ordering::Relaxed)))
    }
}
