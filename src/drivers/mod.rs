//! Actuator drivers, hardware initialisation, and thread helpers.

pub mod heater;
pub mod hw_init;
pub mod task_pin;
