//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ThermalController / HeatingScheduler
//! ```
//!
//! Driven adapters (NTC sensor, heater PWM, clock, event sinks, storage)
//! implement these traits. The domain core consumes them via generics or
//! trait objects and never touches hardware directly.

use crate::config::SystemConfig;
use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the control loop calls this once per cycle.
pub trait SensorPort {
    /// Acquire one plate temperature sample in °C.
    ///
    /// An `Err` marks the sample invalid; the controller enters its
    /// sensor-fault state for that cycle.
    fn read_temperature(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Heater port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the control loop commands the heater through this.
///
/// Implementations must be bounded and non-blocking; they are called
/// while the controller holds its state lock.
pub trait HeaterPort {
    /// Drive the heater at `percent` (clamped to 0–100).
    fn set_drive(&mut self, percent: f32);

    /// Force the heater off.
    fn heater_off(&mut self) {
        self.set_drive(0.0);
    }
}

// ───────────────────────────────────────────────────────────────
// Power switch (controller contract consumed by the scheduler)
// ───────────────────────────────────────────────────────────────

/// The narrow slice of the thermal controller that the scheduler may use.
///
/// The scheduler calls these while holding its own lock, so
/// implementations must never call back into the scheduler.
pub trait PowerSwitch: Send + Sync {
    fn set_power(&self, on: bool);
    fn is_powered(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: wall clock → scheduler)
// ───────────────────────────────────────────────────────────────

/// Wall-clock reading consumed by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WallTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 1 = Monday … 7 = Sunday.
    pub weekday: u8,
}

impl WallTime {
    /// Minutes since midnight (0–1439).
    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

/// Source of the current time of day.
///
/// A single call returns one consistent reading; the scheduler calls it
/// at most once per tick.
pub trait TimePort: Send + Sync {
    fn now(&self) -> WallTime;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The runtime emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, display
/// refresh, status endpoint, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("config storage I/O error"),
        }
    }
}
