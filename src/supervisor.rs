//! Electronic-fuse supervisor.
//!
//! Evaluated once per tick with the latest configuration snapshot and
//! power measurement, it decides whether the protected output may be on.
//!
//! ## Fault lifecycle
//!
//! 1. Over-current or over-voltage is detected (per enabled alert).
//! 2. The supervisor latches: the output goes off and the onset time is
//!    recorded.
//! 3. While latched, the output stays off.  A fault that clears and
//!    reappears does not move the onset.
//! 4. With auto-recovery enabled, the latch is released once no fault is
//!    present and `RECOVERY_DELAY_MS` has elapsed since onset.  Without
//!    it, the latch holds until reboot.
//!
//! The manual override (`force_output_off`) takes priority over all of
//! the above.  It turns the output off and clears the published flags,
//! but leaves the latch as it was.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{error, info};

use crate::config::{PowerConfig, RECOVERY_DELAY_MS};

/// One sample from the power monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurement {
    pub current_ma: f32,
    pub voltage_mv: f32,
}

/// Fault flags published after every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultStatus {
    pub overcurrent: bool,
    pub overvoltage: bool,
    /// Output held off by fault handling, not by the override.
    pub off_due_to_fault: bool,
}

/// Latch edge produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Latched,
    Recovered,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Desired output level.
    pub output_on: bool,
    pub status: FaultStatus,
    /// The manual override decided this tick.
    pub overridden: bool,
    pub transition: Option<Transition>,
}

/// Latching fault supervisor.
pub struct FaultSupervisor {
    latched: bool,
    fault_onset_ms: u64,
    recovery_delay_ms: u64,
}

impl FaultSupervisor {
    pub fn new() -> Self {
        Self::with_recovery_delay(RECOVERY_DELAY_MS)
    }

    pub fn with_recovery_delay(recovery_delay_ms: u64) -> Self {
        Self {
            latched: false,
            fault_onset_ms: 0,
            recovery_delay_ms,
        }
    }

    /// Evaluate one tick.
    pub fn evaluate(&mut self, cfg: &PowerConfig, m: &Measurement, now_ms: u64) -> Decision {
        if cfg.force_output_off {
            return Decision {
                output_on: false,
                status: FaultStatus::default(),
                overridden: true,
                transition: None,
            };
        }

        // ── Threshold checks ──────────────────────────────────────
        let overvoltage =
            cfg.overvoltage_alert_enabled && m.voltage_mv > f32::from(cfg.overvoltage_threshold_mv);
        let overcurrent =
            cfg.overcurrent_alert_enabled && m.current_ma > f32::from(cfg.overcurrent_threshold_ma);
        let fault = overvoltage || overcurrent;

        // ── Latch ─────────────────────────────────────────────────
        let mut transition = None;
        if fault && !self.latched {
            self.latched = true;
            self.fault_onset_ms = now_ms;
            transition = Some(Transition::Latched);
            error!(
                "EFUSE FAULT LATCHED: overcurrent={} ({:.0} mA) overvoltage={} ({:.0} mV)",
                overcurrent, m.current_ma, overvoltage, m.voltage_mv
            );
        } else if self.latched
            && !fault
            && cfg.auto_recovery_enabled
            && now_ms.saturating_sub(self.fault_onset_ms) >= self.recovery_delay_ms
        {
            self.latched = false;
            transition = Some(Transition::Recovered);
            info!(
                "EFUSE FAULT CLEARED: recovered {} ms after onset",
                now_ms.saturating_sub(self.fault_onset_ms)
            );
        }

        let output_on = !self.latched;
        Decision {
            output_on,
            status: FaultStatus {
                overcurrent,
                overvoltage,
                off_due_to_fault: !output_on,
            },
            overridden: false,
            transition,
        }
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Time of the fault that set the current latch.
    pub fn fault_onset_ms(&self) -> Option<u64> {
        self.latched.then_some(self.fault_onset_ms)
    }
}

impl Default for FaultSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Published fault flags
// ---------------------------------------------------------------------------

/// Lock-free fault flags for other tasks.
///
/// Each flag is an independent atomic; readers may see flags from two
/// adjacent ticks, never a torn value.
pub struct FaultMonitor {
    overcurrent: AtomicBool,
    overvoltage: AtomicBool,
    off_due_to_fault: AtomicBool,
}

impl FaultMonitor {
    pub const fn new() -> Self {
        Self {
            overcurrent: AtomicBool::new(false),
            overvoltage: AtomicBool::new(false),
            off_due_to_fault: AtomicBool::new(false),
        }
    }

    pub fn publish(&self, status: FaultStatus) {
        self.overcurrent
            .store(status.overcurrent, Ordering::Relaxed);
        self.overvoltage
            .store(status.overvoltage, Ordering::Relaxed);
        self.off_due_to_fault
            .store(status.off_due_to_fault, Ordering::Relaxed);
    }

    pub fn has_overcurrent(&self) -> bool {
        self.overcurrent.load(Ordering::Relaxed)
    }

    pub fn has_overvoltage(&self) -> bool {
        self.overvoltage.load(Ordering::Relaxed)
    }

    /// Output is currently held off by fault handling.
    pub fn has_fault(&self) -> bool {
        self.off_due_to_fault.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> FaultStatus {
        FaultStatus {
            overcurrent: self.has_overcurrent(),
            overvoltage: self.has_overvoltage(),
            off_due_to_fault: self.has_fault(),
        }
    }
}

impl Default for FaultMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// The device-wide fault flags.
pub static FAULT_MONITOR: FaultMonitor = FaultMonitor::new();
