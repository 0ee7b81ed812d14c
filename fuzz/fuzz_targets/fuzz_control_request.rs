//! Fuzz target: `/control` and `/sync_time` bodies
//!
//! Feeds arbitrary bytes through the JSON request decoders and applies
//! whatever decodes to a live service with a fixed-temperature plate.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Target and timer duration stay inside their configured ranges
//! - Remaining time never exceeds the configured duration
//!
//! cargo fuzz run fuzz_control_request

#![no_main]

use cupwarmer::app::ports::{HeaterPort, SensorPort};
use cupwarmer::app::service::AppService;
use cupwarmer::config::SystemConfig;
use cupwarmer::error::SensorError;
use libfuzzer_sys::fuzz_target;

struct Plate;

impl SensorPort for Plate {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        Ok(40.0)
    }
}

impl HeaterPort for Plate {
    fn set_drive(&mut self, _percent: f32) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };

    let config = SystemConfig::default();
    let app = AppService::new(&config, Plate);
    let _ = app.handle_control_json(body);
    let _ = app.handle_sync_time_json(body);

    let status = app.status();
    assert!((config.target_min_c..=config.target_max_c).contains(&status.target_temp));
    let duration = app.scheduler().timer_duration();
    assert!((1..=config.max_timer_minutes).contains(&duration));
    assert!(app.scheduler().timer_remaining_secs() <= duration * 60);
    assert!(app.clock().calendar().is_valid());
});
