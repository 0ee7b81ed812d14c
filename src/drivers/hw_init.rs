//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit and its eFuse calibration scheme for
//! the NTC using raw ESP-IDF sys calls. Called once from `main()` before the control task starts. The
//! heater LEDC channel is owned by [`HeaterDriver`](super::heater::HeaterDriver)
//! through `esp-idf-hal`.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;
#[cfg(target_os = "espidf")]
use crate::sensors::temperature::raw_to_millivolts;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task is spawned.
    unsafe { init_adc() }?;
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// Null when no calibration scheme could be created.
#[cfg(target_os = "espidf")]
static mut ADC1_CALI: adc_cali_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only after `init_adc()`. The handle is written
/// once at boot and only read afterwards, from the control task.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 12 dB attenuation: 0 – 3.3 V input range
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), pins::NTC_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 configured (CH{}=NTC)", pins::NTC_ADC_CHANNEL);

    // Calibration is optional; readings fall back to the linear estimate.
    if unsafe { init_adc_cali() } {
        info!("hw_init: ADC1 calibration enabled");
    } else {
        log::warn!("hw_init: ADC1 calibration unavailable, using linear conversion");
    }
    Ok(())
}

#[cfg(all(target_os = "espidf", any(esp32c3, esp32s3, esp32c6, esp32h2)))]
unsafe fn init_adc_cali() -> bool {
    let cfg = adc_cali_curve_fitting_config_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        ..Default::default()
    };
    // SAFETY: ADC1_CALI is only written here, once at boot.
    unsafe { adc_cali_create_scheme_curve_fitting(&cfg, &raw mut ADC1_CALI) == ESP_OK as i32 }
}

#[cfg(all(target_os = "espidf", any(esp32, esp32s2)))]
unsafe fn init_adc_cali() -> bool {
    let cfg = adc_cali_line_fitting_config_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        ..Default::default()
    };
    // SAFETY: ADC1_CALI is only written here, once at boot.
    unsafe { adc_cali_create_scheme_line_fitting(&cfg, &raw mut ADC1_CALI) == ESP_OK as i32 }
}

#[cfg(all(
    target_os = "espidf",
    not(any(esp32, esp32s2, esp32c3, esp32s3, esp32c6, esp32h2))
))]
unsafe fn init_adc_cali() -> bool {
    false
}

/// One 12-bit ADC1 sample, or `None` if the driver reported an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: initialised at boot, read-only after.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

/// One ADC1 sample in millivolts: calibrated if a scheme was created at
/// boot, otherwise the linear 0 – 3300 mV estimate.
#[cfg(target_os = "espidf")]
pub fn adc1_read_mv(channel: u32) -> Option<u32> {
    let raw = adc1_read(channel)?;
    // SAFETY: ADC1_CALI is written once at boot, read-only after.
    let cali = unsafe { ADC1_CALI };
    if cali.is_null() {
        return Some(raw_to_millivolts(raw));
    }
    let mut mv: i32 = 0;
    // SAFETY: non-null handle created by init_adc_cali.
    let ret = unsafe { adc_cali_raw_to_voltage(cali, i32::from(raw), &mut mv) };
    if ret == ESP_OK as i32 {
        Some(mv.max(0) as u32)
    } else {
        Some(raw_to_millivolts(raw))
    }
}
