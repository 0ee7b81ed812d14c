//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A display or HTTP status adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Status(s) | AppEvent::Started(s) => {
                let tag = if matches!(event, AppEvent::Started(_)) { "START" } else { "STATUS" };
                info!(
                    "{} | {:?} | T={:.1}\u{00b0}C -> {}\u{00b0}C | power={} heating={} sensor={} | \
                     {} wd={} | timer={}min {:?} | appt={}",
                    tag,
                    s.mode,
                    s.current_temp,
                    s.target_temp,
                    if s.power { "ON" } else { "OFF" },
                    s.is_heating,
                    if s.sensor_ok { "OK" } else { "FAULT" },
                    s.esp_time,
                    s.weekday,
                    s.timer_remaining,
                    s.scheduler_mode,
                    if s.schedule_time.is_empty() { "--:--" } else { s.schedule_time.as_str() },
                );
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::SafetyShutdown { temp_c } => {
                warn!("SAFETY | hard limit shutoff at {:.1}\u{00b0}C", temp_c);
            }
            AppEvent::TimerExpired => {
                info!("TIMER | expired, heater off");
            }
            AppEvent::ScheduleFired(at) => {
                info!("SCHED | appointment {} fired, preheating", at);
            }
        }
    }
}
