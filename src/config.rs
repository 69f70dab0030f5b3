//! System configuration parameters
//!
//! The [`PowerConfig`] record is the only coupling point between the command
//! transport (whose handlers write it) and the fault supervisor (which reads
//! it once per tick).  It lives in a [`SharedConfig`] cell so a reader always
//! observes a record that some writer published as a whole.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Protocol limits
// ---------------------------------------------------------------------------

/// Path buffer size.  A path holds at most `MAX_PATH_LEN - 1` bytes.
pub const MAX_PATH_LEN: usize = 16;

/// Payload chunk capacity used when no other capacity is requested.
pub const DEFAULT_CHUNK_LEN: usize = 2048;

/// Handler table capacity.
pub const MAX_HANDLERS: usize = 4;

/// Bytes of an unhandled chunk rendered in the hex preview.
pub const HEX_PREVIEW_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Bounded wait for a single byte-source read.  Also the worst-case latency
/// for a receiver stop request.
pub const READ_TIMEOUT_MS: u32 = 20;

/// A frame stalled mid-payload for longer than this is abandoned.
pub const IDLE_TIMEOUT_MS: u64 = 3_000;

/// Supervisor period (20 Hz).
pub const TICK_PERIOD_MS: u64 = 50;

/// Delay after fault onset before auto-recovery may restore the output.
pub const RECOVERY_DELAY_MS: u64 = 3_000;

// ---------------------------------------------------------------------------
// Configuration record
// ---------------------------------------------------------------------------

/// Thresholds and overrides consumed by the fault supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Output current above this trips over-current protection (mA).
    pub overcurrent_threshold_ma: i16,
    /// Bus voltage above this trips over-voltage protection (mV).
    pub overvoltage_threshold_mv: i16,
    /// Restore the output automatically once the fault clears.
    pub auto_recovery_enabled: bool,
    /// Manual override: keep the output off regardless of measurements.
    pub force_output_off: bool,
    /// Evaluate over-voltage protection.
    pub overvoltage_alert_enabled: bool,
    /// Evaluate over-current protection.
    pub overcurrent_alert_enabled: bool,
}

impl PowerConfig {
    /// Boot-time values, usable in `static` initialisers.
    pub const DEFAULT: Self = Self {
        overcurrent_threshold_ma: 1_500,
        overvoltage_threshold_mv: 5_500,
        auto_recovery_enabled: true,
        force_output_off: false,
        overvoltage_alert_enabled: true,
        overcurrent_alert_enabled: true,
    };

    /// Range-check a record before it is published.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.overcurrent_threshold_ma <= 0 {
            return Err(ConfigError::ValidationFailed(
                "overcurrent_threshold_ma must be positive",
            ));
        }
        if self.overvoltage_threshold_mv <= 0 {
            return Err(ConfigError::ValidationFailed(
                "overvoltage_threshold_mv must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Shared cell
// ---------------------------------------------------------------------------

/// Whole-record publication cell.
///
/// Writers replace the record (or run a read-modify-write closure) inside a
/// single critical section; readers copy it out the same way.  No reader can
/// observe a half-written record.
pub struct SharedConfig {
    inner: Mutex<CriticalSectionRawMutex, Cell<PowerConfig>>,
}

impl SharedConfig {
    pub const fn new(initial: PowerConfig) -> Self {
        Self {
            inner: Mutex::new(Cell::new(initial)),
        }
    }

    /// Copy of the currently published record.
    pub fn snapshot(&self) -> PowerConfig {
        self.inner.lock(Cell::get)
    }

    /// Replace the whole record.
    pub fn publish(&self, config: PowerConfig) {
        self.inner.lock(|cell| cell.set(config));
    }

    /// Atomically modify the record and return the published result.
    pub fn update(&self, f: impl FnOnce(&mut PowerConfig)) -> PowerConfig {
        self.inner.lock(|cell| {
            let mut next = cell.get();
            f(&mut next);
            cell.set(next);
            next
        })
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(PowerConfig::DEFAULT)
    }
}

/// The device-wide configuration record.
pub static LUMEN_CONFIG: SharedConfig = SharedConfig::new(PowerConfig::DEFAULT);
