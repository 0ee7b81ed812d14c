//! CupWarmer Firmware: Main Entry Point
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  HardwareAdapter     LogEventSink   NvsAdapter   SoftRtc      │
//! │  (Sensor+Heater)     (EventSink)    (Config)     (TimePort)   │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ───────────────────     │
//! │                                                               │
//! │  ┌───────────────────────────────────────────────────────┐    │
//! │  │  AppService: ThermalController · HeatingScheduler     │    │
//! │  └───────────────────────────────────────────────────────┘    │
//! │                                                               │
//! │  Runtime: thermal / scheduler / rtc periodic tasks            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use log::{error, info, warn};

use cupwarmer::adapters::hardware::HardwareAdapter;
use cupwarmer::adapters::log_sink::LogEventSink;
use cupwarmer::adapters::nvs::NvsAdapter;
use cupwarmer::app::ports::ConfigPort;
use cupwarmer::app::service::AppService;
use cupwarmer::config::SystemConfig;
use cupwarmer::drivers::heater::HeaterDriver;
use cupwarmer::drivers::hw_init;
use cupwarmer::error::Error;
use cupwarmer::pins;
use cupwarmer::runtime::Runtime;
use cupwarmer::sensors::NtcSensor;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CupWarmer v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. ADC for the NTC ────────────────────────────────────
    hw_init::init_peripherals().map_err(|e| {
        error!("HAL init failed: {}", e);
        Error::Init("ADC1 oneshot")
    })?;
    info!(
        "NTC on GPIO{} (ADC1 CH{})",
        pins::NTC_ADC_GPIO,
        pins::NTC_ADC_CHANNEL
    );

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config unavailable ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 4. Heater PWM (LEDC timer0 / channel0) ────────────────
    let peripherals = Peripherals::take()?;
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(pins::HEATER_PWM_FREQ_HZ.Hz())
            .resolution(Resolution::Bits10),
    )?;
    let pwm = LedcDriver::new(peripherals.ledc.channel0, timer, peripherals.pins.gpio4)?;
    let heater = HeaterDriver::new(pwm).map_err(Error::from)?;
    info!(
        "Heater PWM on GPIO{} at {} Hz",
        pins::HEATER_PWM_GPIO,
        pins::HEATER_PWM_FREQ_HZ
    );

    // ── 5. Construct adapters + app service ───────────────────
    let hw = HardwareAdapter::new(NtcSensor::new(), heater);
    let app = Arc::new(AppService::new(&config, hw));
    app.scheduler()
        .set_timeout_callback(|| info!("Countdown finished, heater released"));

    let mut log_sink = LogEventSink::new();
    app.start(&mut log_sink);

    // ── 6. Periodic tasks ─────────────────────────────────────
    let runtime = Runtime::spawn(app, &config, log_sink)?;
    info!("System ready.");
    runtime.join();
    Ok(())
}
