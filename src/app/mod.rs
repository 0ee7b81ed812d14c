//! Application core: domain wiring with zero direct I/O.
//!
//! Commands come in, events go out, and all interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
