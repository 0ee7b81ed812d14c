//! GPIO / peripheral pin assignments for the CupWarmer board (ESP32-C3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Heater (MOSFET low-side switch, LEDC PWM)
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the heater MOSFET gate.
pub const HEATER_PWM_GPIO: i32 = 4;
/// LEDC frequency for the heater (1 kHz, 10-bit duty).
pub const HEATER_PWM_FREQ_HZ: u32 = 1_000;

// ---------------------------------------------------------------------------
// Sensors: Analog (ADC1)
// ---------------------------------------------------------------------------

/// NTC thermistor, 10 kΩ @ 25 °C, voltage divider to ADC.
/// ADC1 channel 0 (GPIO 0 on ESP32-C3).
pub const NTC_ADC_GPIO: i32 = 0;
/// ADC1 channel number for the NTC.
pub const NTC_ADC_CHANNEL: u32 = 0;
