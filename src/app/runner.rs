//! Worker loops and their threads.
//!
//! Two long-lived workers:
//!
//! | Worker      | Core | Prio | Period / wait            |
//! |-------------|------|------|--------------------------|
//! | serial-pack | Pro  | 6    | blocking read, 20 ms max |
//! | efuse       | App  | 10   | 50 ms deadline schedule  |
//!
//! Both stop cooperatively through a [`StopToken`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use log::{info, warn};

use crate::adapters::time::MonotonicClock;
use crate::config::{SharedConfig, TICK_PERIOD_MS};
use crate::drivers::task_pin::{Core, TaskSpec, spawn_on_core};
use crate::error::Result;
use crate::pack::receiver::PackReceiver;
use crate::pack::transport::ByteSource;
use crate::supervisor::FaultMonitor;

use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, MeasurementPort, OutputSwitch};
use super::service::PowerService;

pub const RECEIVER_TASK: TaskSpec = TaskSpec {
    core: Core::Pro,
    priority: 6,
    stack_kb: 8,
    name: "serial-pack\0",
};

pub const SUPERVISOR_TASK: TaskSpec = TaskSpec {
    core: Core::App,
    priority: 10,
    stack_kb: 6,
    name: "efuse\0",
};

// ───────────────────────────────────────────────────────────────
// Stop token
// ───────────────────────────────────────────────────────────────

/// Shared cancellation flag.  Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor loop
// ───────────────────────────────────────────────────────────────

/// Tick `service` every `TICK_PERIOD_MS` until `stop` is raised.
///
/// Deadline scheduled: a slow tick shortens the following sleep.  After
/// an overrun of a whole period the schedule restarts from now instead of
/// bursting to catch up.
pub fn run_supervisor(
    service: &mut PowerService<'_>,
    hw: &mut (impl MeasurementPort + OutputSwitch),
    clock: &impl ClockPort,
    stop: &StopToken,
    sink: &mut impl EventSink,
) {
    sink.emit(&AppEvent::Started("efuse"));
    let mut deadline = clock.now_ms();

    while !stop.is_stopped() {
        let now = clock.now_ms();
        service.tick(hw, now, sink);

        deadline += TICK_PERIOD_MS;
        let after = clock.now_ms();
        if after < deadline {
            clock.sleep_ms(deadline - after);
        } else {
            if after - deadline >= TICK_PERIOD_MS {
                warn!("efuse tick overran by {} ms", after - deadline);
            }
            deadline = after;
        }
    }

    info!("efuse supervisor stopped after {} ticks", service.tick_count());
}

// ───────────────────────────────────────────────────────────────
// Thread spawning
// ───────────────────────────────────────────────────────────────

/// Run `receiver` on its own core-pinned thread.
pub fn spawn_receiver<S, E, const N: usize, const CHUNK: usize>(
    mut receiver: PackReceiver<N, CHUNK>,
    mut source: S,
    mut sink: E,
    stop: StopToken,
) -> Result<JoinHandle<()>>
where
    S: ByteSource + Send + 'static,
    E: EventSink + Send + 'static,
{
    spawn_on_core(RECEIVER_TASK, move || {
        let clock = MonotonicClock::new();
        sink.emit(&AppEvent::Started("serial-pack"));
        receiver.run(&mut source, &clock, &stop, &mut sink);
    })
}

/// Run the supervisor for `hw` on its own core-pinned thread.
pub fn spawn_supervisor<H, E>(
    mut hw: H,
    config: &'static SharedConfig,
    monitor: &'static FaultMonitor,
    mut sink: E,
    stop: StopToken,
) -> Result<JoinHandle<()>>
where
    H: MeasurementPort + OutputSwitch + Send + 'static,
    E: EventSink + Send + 'static,
{
    spawn_on_core(SUPERVISOR_TASK, move || {
        let clock = MonotonicClock::new();
        let mut service = PowerService::new(config, monitor);
        run_supervisor(&mut service, &mut hw, &clock, &stop, &mut sink);
    })
}
