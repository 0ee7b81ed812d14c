//! Mock hardware adapter for integration tests.
//!
//! The service takes ownership of its hardware, so the mock keeps its
//! state behind a shared handle: tests hold a clone to script the NTC and
//! to inspect every heater command.

use std::sync::{Arc, Mutex};

use cupwarmer::app::events::AppEvent;
use cupwarmer::app::ports::{EventSink, HeaterPort, SensorPort};
use cupwarmer::error::SensorError;

// ── Probe state ───────────────────────────────────────────────

#[derive(Debug)]
struct Probe {
    reading: Result<f32, SensorError>,
    drives: Vec<f32>,
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Clone)]
pub struct MockHardware {
    probe: Arc<Mutex<Probe>>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn at(temp_c: f32) -> Self {
        Self {
            probe: Arc::new(Mutex::new(Probe {
                reading: Ok(temp_c),
                drives: Vec::new(),
            })),
        }
    }

    pub fn set_temperature(&self, temp_c: f32) {
        self.probe.lock().unwrap().reading = Ok(temp_c);
    }

    pub fn fail_sensor(&self, e: SensorError) {
        self.probe.lock().unwrap().reading = Err(e);
    }

    /// Last commanded drive (%), 0 if never driven.
    pub fn last_drive(&self) -> f32 {
        self.probe.lock().unwrap().drives.last().copied().unwrap_or(0.0)
    }

    pub fn drive_history(&self) -> Vec<f32> {
        self.probe.lock().unwrap().drives.clone()
    }

    /// Crude plate model: drive heats, ambient cools.
    pub fn step_plant(&self) {
        let mut p = self.probe.lock().unwrap();
        let drive = p.drives.last().copied().unwrap_or(0.0);
        if let Ok(t) = p.reading {
            p.reading = Ok(t + drive * 0.02 - (t - 25.0) * 0.01);
        }
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.probe.lock().unwrap().reading
    }
}

impl HeaterPort for MockHardware {
    fn set_drive(&mut self, percent: f32) {
        self.probe.lock().unwrap().drives.push(percent.clamp(0.0, 100.0));
    }
}

// ── Event recorder ────────────────────────────────────────────

/// Event sink that records every emitted event; clones share the log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
