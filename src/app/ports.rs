//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PowerService / PackReceiver (domain)
//! ```
//!
//! Driven adapters (power monitor, output switch, clock, event sinks)
//! implement these traits.  The domain consumes them via generics, so the
//! supervisor and the receiver never touch hardware directly.

use crate::error::{ActuatorError, SensorError};
use crate::supervisor::Measurement;

// ───────────────────────────────────────────────────────────────
// Measurement port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one current/voltage sample per supervisor tick.
pub trait MeasurementPort {
    fn read(&mut self) -> Result<Measurement, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Output switch port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the protected output's on/off control line.
pub trait OutputSwitch {
    fn set_output(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source for timeouts and tick scheduling.
pub trait ClockPort {
    /// Milliseconds since an arbitrary fixed origin.  Never decreases.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
