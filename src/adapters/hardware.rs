//! Hardware adapter: bridges the power monitor and the load switch to
//! the domain port traits.
//!
//! The supervisor service takes a single `hw` value implementing both
//! [`MeasurementPort`] and [`OutputSwitch`]; this adapter pairs any two
//! concrete drivers into that shape.

use crate::app::ports::{MeasurementPort, OutputSwitch};
use crate::error::{ActuatorError, SensorError};
use crate::supervisor::Measurement;

/// Concrete adapter that combines a monitor and a switch behind port traits.
pub struct PowerHardware<M, S> {
    monitor: M,
    switch: S,
}

impl<M, S> PowerHardware<M, S>
where
    M: MeasurementPort,
    S: OutputSwitch,
{
    pub fn new(monitor: M, switch: S) -> Self {
        Self { monitor, switch }
    }
}

// ── MeasurementPort implementation ────────────────────────────

impl<M: MeasurementPort, S> MeasurementPort for PowerHardware<M, S> {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        self.monitor.read()
    }
}

// ── OutputSwitch implementation ───────────────────────────────

impl<M, S: OutputSwitch> OutputSwitch for PowerHardware<M, S> {
    fn set_output(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.switch.set_output(on)
    }
}
