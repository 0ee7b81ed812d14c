//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to                    |
//! |------------|-------------|--------------------------------|
//! | `hardware` | SensorPort  | ESP32 ADC (NTC divider)        |
//! |            | HeaterPort  | ESP32 LEDC PWM (heater MOSFET) |
//! | `log_sink` | EventSink   | Serial log output              |
//! | `nvs`      | ConfigPort  | NVS / in-memory store          |
//! | `time`     | TimePort    | Software calendar clock        |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
