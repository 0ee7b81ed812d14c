//! Outbound application events.
//!
//! The runtime emits these through the [`EventSink`](super::ports::EventSink)
//! port. Adapters on the other side decide what to do with them: log to
//! serial, refresh the display, feed a status endpoint, etc.

use serde::{Serialize, Serializer};

use crate::control::HeatMode;
use crate::scheduler::{SchedulerMode, TimeOfDay};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial status).
    Started(StatusReport),

    /// The controller's derived mode changed between cycles.
    ModeChanged { from: HeatMode, to: HeatMode },

    /// The hard limit forced power off.
    SafetyShutdown { temp_c: f32 },

    /// The countdown ran out and power was dropped.
    TimerExpired,

    /// The daily appointment raised power for preheating.
    ScheduleFired(TimeOfDay),

    /// Periodic status snapshot.
    Status(StatusReport),
}

/// Point-in-time device status, in the shape served by `/status`.
///
/// ```json
/// { "current_temp": 45.5, "target_temp": 55, "is_heating": 1,
///   "esp_time": "08:00", "weekday": 5, "timer_remaining": 59,
///   "schedule_time": "08:30", "mode": "heating", "sensor_ok": true,
///   "power": true, "scheduler_mode": "timer_running" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub current_temp: f32,
    pub target_temp: i32,
    #[serde(serialize_with = "as_int")]
    pub is_heating: bool,
    /// Wall clock as `"HH:MM"`.
    pub esp_time: heapless::String<5>,
    pub weekday: u8,
    /// Minutes, rounded up.
    pub timer_remaining: u32,
    /// `"HH:MM"`, empty when no appointment is set.
    pub schedule_time: heapless::String<5>,
    pub mode: HeatMode,
    pub sensor_ok: bool,
    pub power: bool,
    pub scheduler_mode: SchedulerMode,
}

impl StatusReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `is_heating` is a 0/1 number on the wire.
fn as_int<S: Serializer>(v: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u8(u8::from(*v))
}
