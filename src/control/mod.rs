//! Closed-loop temperature control: the PID engine and the periodic
//! thermal loop that wraps it with safety overrides.

pub mod pid;
pub mod thermal;

pub use thermal::{ControlState, CycleReport, HeatMode, ThermalController};
