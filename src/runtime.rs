//! Periodic task runner.
//!
//! Three fixed-period threads drive the [`AppService`]:
//!
//! | Task        | Period               | Body                               |
//! |-------------|----------------------|------------------------------------|
//! | `thermal`   | `control_period_ms`  | [`AppService::control_tick`]       |
//! | `scheduler` | `scheduler_period_ms`| [`AppService::scheduler_tick`] + periodic status |
//! | `rtc`       | 1 s                  | [`AppService::clock_tick`]         |
//!
//! Periods are deadline-based: the next wake-up is computed from the
//! previous deadline, not from when the body finished, so slow bodies do
//! not accumulate drift. If a body overruns a whole period the deadline
//! resynchronises to now instead of bursting.
//!
//! All threads watch one shared stop flag.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, HeaterPort, SensorPort};
use crate::app::service::AppService;
use crate::config::SystemConfig;
use crate::drivers::task_pin::{spawn_on_core, Core};

/// Scheduler ticks between periodic status events.
const STATUS_EVERY_TICKS: u32 = 30;

const RTC_PERIOD: Duration = Duration::from_secs(1);

/// Handles to the running periodic tasks.
pub struct Runtime {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Spawn the control, scheduler and clock tasks. Each task gets its
    /// own clone of `sink`.
    pub fn spawn<HW, S>(app: Arc<AppService<HW>>, config: &SystemConfig, sink: S) -> io::Result<Self>
    where
        HW: SensorPort + HeaterPort + Send + 'static,
        S: EventSink + Clone + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let mut rt = Self {
            stop: stop.clone(),
            handles: Vec::with_capacity(3),
        };

        let control_period = Duration::from_millis(u64::from(config.control_period_ms));
        let scheduler_period = Duration::from_millis(u64::from(config.scheduler_period_ms));

        // Highest priority: the thermal loop owns the safety cutoff.
        {
            let app = app.clone();
            let stop = stop.clone();
            let mut sink = sink.clone();
            rt.push(spawn_on_core(Core::Pro, 10, 6, "thermal\0", move || {
                run_periodic(&stop, control_period, || {
                    app.control_tick(&mut sink);
                });
            }))?;
        }

        {
            let app = app.clone();
            let stop = stop.clone();
            let mut sink = sink;
            rt.push(spawn_on_core(Core::Pro, 8, 6, "scheduler\0", move || {
                let mut ticks = 0u32;
                run_periodic(&stop, scheduler_period, || {
                    if app.scheduler_tick(&mut sink).is_some() {
                        ticks = ticks.wrapping_add(1);
                        if ticks % STATUS_EVERY_TICKS == 0 {
                            sink.emit(&AppEvent::Status(app.status()));
                        }
                    }
                });
            }))?;
        }

        {
            let stop = stop.clone();
            rt.push(spawn_on_core(Core::Pro, 9, 3, "rtc\0", move || {
                run_periodic(&stop, RTC_PERIOD, || app.clock_tick());
            }))?;
        }

        info!(
            "Runtime: thermal every {} ms, scheduler every {} ms",
            config.control_period_ms, config.scheduler_period_ms
        );
        Ok(rt)
    }

    /// Signal all tasks and wait for them to exit.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Release);
        for h in self.handles {
            // A panicked task has already stopped; nothing left to join.
            let _ = h.join();
        }
        info!("Runtime: stopped");
    }

    /// Block the caller until every task exits.
    pub fn join(self) {
        for h in self.handles {
            let _ = h.join();
        }
    }

    fn push(&mut self, spawned: io::Result<JoinHandle<()>>) -> io::Result<()> {
        match spawned {
            Ok(h) => {
                self.handles.push(h);
                Ok(())
            }
            Err(e) => {
                // Tear down whatever already started.
                self.stop.store(true, Ordering::Release);
                for h in self.handles.drain(..) {
                    let _ = h.join();
                }
                Err(e)
            }
        }
    }
}

/// Run `body` every `period` until `stop` is set.
pub fn run_periodic(stop: &AtomicBool, period: Duration, mut body: impl FnMut()) {
    let mut deadline = Instant::now();
    while !stop.load(Ordering::Acquire) {
        body();
        deadline += period;
        let now = Instant::now();
        match deadline.checked_duration_since(now) {
            Some(wait) => std::thread::sleep(wait),
            None => deadline = now,
        }
    }
}
