//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (status/command
//! endpoint, display buttons, serial console) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//!
//! The JSON request bodies are decoded here so transports only move bytes.

use core::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::adapters::time::CalendarTime;
use crate::error::ScheduleError;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// User power switch. Power-on from off also arms the countdown.
    SetPower(bool),

    /// Target plate temperature (°C), clamped by the controller.
    SetTargetTemp(i32),

    /// Countdown length (minutes), clamped by the scheduler.
    SetTimerDuration(i32),

    /// Daily appointment as `"HH:MM"`.
    SetScheduleTime(String),

    CancelSchedule,

    StartTimer,

    StopTimer,

    /// Replace the wall-clock time.
    SyncTime(CalendarTime),
}

/// Body of the `/control` request. Every field is optional; present
/// fields are applied in declaration order.
///
/// ```json
/// { "power": 1, "set_temp": 60, "timer_duration": 60, "schedule_time": "08:30" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ControlRequest {
    #[serde(default, deserialize_with = "flag")]
    pub power: Option<bool>,
    #[serde(default)]
    pub set_temp: Option<i32>,
    #[serde(default)]
    pub timer_duration: Option<i32>,
    #[serde(default)]
    pub schedule_time: Option<String>,
}

impl ControlRequest {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    pub fn into_commands(self) -> Vec<AppCommand> {
        let mut cmds = Vec::with_capacity(4);
        if let Some(on) = self.power {
            cmds.push(AppCommand::SetPower(on));
        }
        if let Some(t) = self.set_temp {
            cmds.push(AppCommand::SetTargetTemp(t));
        }
        if let Some(m) = self.timer_duration {
            cmds.push(AppCommand::SetTimerDuration(m));
        }
        if let Some(s) = self.schedule_time {
            cmds.push(AppCommand::SetScheduleTime(s));
        }
        cmds
    }
}

/// Body of the `/sync_time` request.
///
/// ```json
/// { "time": "2025-12-26 08:00:00", "weekday": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncTimeRequest {
    pub time: String,
    /// 1 = Monday … 7 = Sunday; missing or out of range means Monday.
    #[serde(default)]
    pub weekday: Option<i64>,
}

impl SyncTimeRequest {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    pub fn into_command(self) -> Result<AppCommand, ScheduleError> {
        let mut time = CalendarTime::parse(&self.time)?;
        time.weekday = match self.weekday {
            Some(w @ 1..=7) => w as u8,
            _ => 1,
        };
        Ok(AppCommand::SyncTime(time))
    }
}

/// Accepts `true`/`false` or a number (non-zero is on).
fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = Option<bool>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or a number")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v != 0))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v != 0))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v != 0.0))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    d.deserialize_any(FlagVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_control_body() {
        let req = ControlRequest::from_json(
            r#"{"power":1,"set_temp":60,"timer_duration":45,"schedule_time":"08:30"}"#,
        )
        .unwrap();
        assert_eq!(
            req.into_commands(),
            vec![
                AppCommand::SetPower(true),
                AppCommand::SetTargetTemp(60),
                AppCommand::SetTimerDuration(45),
                AppCommand::SetScheduleTime("08:30".into()),
            ]
        );
    }

    #[test]
    fn power_accepts_bool_or_number() {
        assert_eq!(ControlRequest::from_json(r#"{"power":0}"#).unwrap().power, Some(false));
        assert_eq!(ControlRequest::from_json(r#"{"power":true}"#).unwrap().power, Some(true));
        assert_eq!(ControlRequest::from_json(r#"{"power":null}"#).unwrap().power, None);
    }

    #[test]
    fn empty_body_is_no_op() {
        assert!(ControlRequest::from_json("{}").unwrap().into_commands().is_empty());
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(ControlRequest::from_json("{power:1").is_err());
        assert!(ControlRequest::from_json(r#"{"set_temp":"hot"}"#).is_err());
    }

    #[test]
    fn sync_time_defaults_weekday() {
        let cmd = SyncTimeRequest::from_json(r#"{"time":"2025-12-26 08:00:00","weekday":9}"#)
            .unwrap()
            .into_command()
            .unwrap();
        let AppCommand::SyncTime(t) = cmd else { panic!("expected SyncTime") };
        assert_eq!(t.weekday, 1);
        assert_eq!((t.hour, t.minute), (8, 0));
    }

    #[test]
    fn sync_time_bad_string() {
        let req = SyncTimeRequest::from_json(r#"{"time":"yesterday"}"#).unwrap();
        assert_eq!(req.into_command(), Err(ScheduleError::InvalidCalendarTime));
    }
}
