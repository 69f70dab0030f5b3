//! Outbound application events.
//!
//! The supervisor service and the pack receiver emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::SensorError;
use crate::pack::codec::{PackPath, PathError};
use crate::pack::registry::HexPreview;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A worker has started.
    Started(&'static str),

    // ── Command transport ─────────────────────────────────────

    /// A path was malformed; input is skipped through the next LF.
    PackRejected(PathError),

    /// A pack stalled mid-payload and was abandoned.
    PackTimedOut { path: PackPath, remaining: u32 },

    /// Payload chunk for a path with no handler.
    ///
    /// `truncated` is set while more payload of the same pack follows.
    UnhandledData {
        path: PackPath,
        len: usize,
        preview: HexPreview,
        truncated: bool,
    },

    /// End of a pack for a path with no handler.
    UnhandledEnd { path: PackPath },

    // ── Fault supervisor ──────────────────────────────────────

    /// A fault turned the output off.
    FaultLatched { overcurrent: bool, overvoltage: bool },

    /// The output came back after a latched fault.
    FaultRecovered,

    /// The manual override took effect.
    OverrideEngaged,

    /// The manual override was released.
    OverrideReleased,

    /// The output line was driven to a new level.
    OutputChanged { on: bool },

    /// The power monitor could not be read.
    MeasurementFailed(SensorError),

    /// The power monitor answered again after a failure.
    MeasurementRestored,
}
