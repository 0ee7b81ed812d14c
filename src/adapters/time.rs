//! Software calendar clock.
//!
//! [`SoftRtc`] keeps wall-clock time in RAM and is advanced once per
//! second by the runtime's clock task. It implements [`TimePort`] for the
//! scheduler. The clock is set over the command interface
//! ([`AppCommand::SyncTime`](crate::app::commands::AppCommand::SyncTime));
//! until then it counts up from 2025-01-01 00:00:00 (a Wednesday).
//!
//! Weekday is carried alongside the date rather than derived from it,
//! because the sync request supplies it separately.

use core::fmt;
use std::sync::{Mutex, PoisonError};

use log::info;

use crate::app::ports::{TimePort, WallTime};
use crate::error::ScheduleError;

const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Full calendar reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 1 = Monday … 7 = Sunday.
    pub weekday: u8,
}

impl Default for CalendarTime {
    fn default() -> Self {
        Self {
            year: 2025,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            weekday: 3,
        }
    }
}

impl CalendarTime {
    /// Parse `"YYYY-MM-DD HH:MM:SS"`. The weekday is set to Monday; callers
    /// that know it overwrite the field.
    pub fn parse(text: &str) -> Result<Self, ScheduleError> {
        let (date, time) = text
            .trim()
            .split_once(' ')
            .ok_or(ScheduleError::InvalidCalendarTime)?;

        let mut d = date.splitn(3, '-');
        let mut t = time.trim().splitn(3, ':');
        let year: u16 = field(d.next())?;
        let month: u8 = field(d.next())?;
        let day: u8 = field(d.next())?;
        let hour: u8 = field(t.next())?;
        let minute: u8 = field(t.next())?;
        let second: u8 = field(t.next())?;

        let parsed = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday: 1,
        };
        if parsed.is_valid() {
            Ok(parsed)
        } else {
            Err(ScheduleError::InvalidCalendarTime)
        }
    }

    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && (1..=days_in_month(self.year, self.month)).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    pub fn wall_time(&self) -> WallTime {
        WallTime {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
            weekday: self.weekday,
        }
    }

    /// `"HH:MM"`, as shown on the status endpoint and display.
    pub fn hh_mm(&self) -> heapless::String<5> {
        let mut s = heapless::String::new();
        // Two two-digit fields always fit in five bytes.
        let _ = fmt::write(&mut s, format_args!("{:02}:{:02}", self.hour, self.minute));
        s
    }

    pub fn weekday_name(&self) -> &'static str {
        WEEKDAY_NAMES
            .get(usize::from(self.weekday.wrapping_sub(1)))
            .copied()
            .unwrap_or("???")
    }

    /// One-second step with full calendar carry.
    fn advance_second(&mut self) {
        self.second += 1;
        if self.second < 60 {
            return;
        }
        self.second = 0;
        self.minute += 1;
        if self.minute < 60 {
            return;
        }
        self.minute = 0;
        self.hour += 1;
        if self.hour < 24 {
            return;
        }
        self.hour = 0;
        self.weekday = if self.weekday >= 7 { 1 } else { self.weekday + 1 };
        self.day += 1;
        if self.day <= days_in_month(self.year, self.month) {
            return;
        }
        self.day = 1;
        self.month += 1;
        if self.month > 12 {
            self.month = 1;
            self.year = self.year.saturating_add(1);
        }
    }
}

impl fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn field<T: core::str::FromStr>(part: Option<&str>) -> Result<T, ScheduleError> {
    part.and_then(|p| p.trim().parse().ok())
        .ok_or(ScheduleError::InvalidCalendarTime)
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// RAM-backed wall clock.
pub struct SoftRtc {
    now: Mutex<CalendarTime>,
}

impl Default for SoftRtc {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftRtc {
    pub fn new() -> Self {
        Self::starting_at(CalendarTime::default())
    }

    pub fn starting_at(time: CalendarTime) -> Self {
        Self {
            now: Mutex::new(time),
        }
    }

    /// Called once per second by the clock task.
    pub fn advance_second(&self) {
        self.now
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .advance_second();
    }

    /// Replace the current time. An out-of-range weekday becomes Monday.
    pub fn set_time(&self, mut time: CalendarTime) {
        if !(1..=7).contains(&time.weekday) {
            time.weekday = 1;
        }
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = time;
        info!("RTC: time set to {} (weekday={})", time, time.weekday);
    }

    pub fn calendar(&self) -> CalendarTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimePort for SoftRtc {
    fn now(&self) -> WallTime {
        self.calendar().wall_time()
    }
}
