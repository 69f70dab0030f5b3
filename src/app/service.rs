//! Power service: the supervisor's hexagonal core.
//!
//! [`PowerService`] owns the fault supervisor and the last commanded output
//! level.  Each tick it snapshots the shared configuration, samples the
//! power monitor, evaluates, and drives the output switch on edges only.
//!
//! ```text
//!  MeasurementPort ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                      │     PowerService      │
//!     OutputSwitch ◀── │  FaultSupervisor      │ ──▶ FaultMonitor
//!                      └──────────────────────┘
//!                                 ▲
//!                            SharedConfig
//! ```

use log::{info, warn};

use crate::config::SharedConfig;
use crate::supervisor::{
    Decision, FaultMonitor, FaultSupervisor, Measurement, Transition,
};

use super::events::AppEvent;
use super::ports::{EventSink, MeasurementPort, OutputSwitch};

/// The supervisor service orchestrates one e-fuse channel.
pub struct PowerService<'a> {
    supervisor: FaultSupervisor,
    config: &'a SharedConfig,
    monitor: &'a FaultMonitor,
    /// Level last written successfully to the switch.
    output_on: bool,
    overridden: bool,
    sensor_ok: bool,
    tick_count: u64,
}

impl<'a> PowerService<'a> {
    /// The output is assumed off until the first tick drives it.
    pub fn new(config: &'a SharedConfig, monitor: &'a FaultMonitor) -> Self {
        Self {
            supervisor: FaultSupervisor::new(),
            config,
            monitor,
            output_on: false,
            overridden: false,
            sensor_ok: true,
            tick_count: 0,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one supervisor cycle: snapshot → measure → evaluate → actuate.
    ///
    /// The `hw` parameter satisfies **both** [`MeasurementPort`] and
    /// [`OutputSwitch`].
    pub fn tick(
        &mut self,
        hw: &mut (impl MeasurementPort + OutputSwitch),
        now_ms: u64,
        sink: &mut impl EventSink,
    ) -> Decision {
        self.tick_count += 1;

        // 1. Consistent configuration for the whole tick
        let cfg = self.config.snapshot();

        // 2. Measurement (not needed while the override holds the output)
        let measurement = if cfg.force_output_off {
            Measurement::default()
        } else {
            self.measure(hw, sink)
        };

        // 3. Evaluate
        let decision = self.supervisor.evaluate(&cfg, &measurement, now_ms);

        if decision.overridden != self.overridden {
            self.overridden = decision.overridden;
            sink.emit(if decision.overridden {
                &AppEvent::OverrideEngaged
            } else {
                &AppEvent::OverrideReleased
            });
        }
        match decision.transition {
            Some(Transition::Latched) => sink.emit(&AppEvent::FaultLatched {
                overcurrent: decision.status.overcurrent,
                overvoltage: decision.status.overvoltage,
            }),
            Some(Transition::Recovered) => sink.emit(&AppEvent::FaultRecovered),
            None => {}
        }

        // 4. Drive the switch on edges only
        if decision.output_on != self.output_on {
            match hw.set_output(decision.output_on) {
                Ok(()) => {
                    self.output_on = decision.output_on;
                    sink.emit(&AppEvent::OutputChanged {
                        on: decision.output_on,
                    });
                }
                Err(e) => warn!(
                    "Output write failed ({}), retrying next tick: {}",
                    if decision.output_on { "on" } else { "off" },
                    e
                ),
            }
        }

        // 5. Publish flags for other tasks
        self.monitor.publish(decision.status);

        decision
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn output_on(&self) -> bool {
        self.output_on
    }

    pub fn is_latched(&self) -> bool {
        self.supervisor.is_latched()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    /// Sample the monitor.  A failed read evaluates as zero and is
    /// reported once per failure streak.
    fn measure(&mut self, hw: &mut impl MeasurementPort, sink: &mut impl EventSink) -> Measurement {
        match hw.read() {
            Ok(m) => {
                if !self.sensor_ok {
                    self.sensor_ok = true;
                    info!("Power monitor restored");
                    sink.emit(&AppEvent::MeasurementRestored);
                }
                m
            }
            Err(e) => {
                if self.sensor_ok {
                    self.sensor_ok = false;
                    warn!("Power monitor read failed, evaluating zero: {}", e);
                    sink.emit(&AppEvent::MeasurementFailed(e));
                }
                Measurement::default()
            }
        }
    }
}
