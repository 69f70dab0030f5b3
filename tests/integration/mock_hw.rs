//! Mock adapters for integration tests.
//!
//! Records every switch write and every emitted event so tests can assert
//! on the full history without touching real GPIO or I2C.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use lumen::app::events::AppEvent;
use lumen::app::ports::{ClockPort, EventSink, MeasurementPort, OutputSwitch};
use lumen::app::runner::StopToken;
use lumen::error::{ActuatorError, SensorError};
use lumen::pack::ByteSource;
use lumen::supervisor::Measurement;

pub const NOMINAL: Measurement = Measurement {
    current_ma: 250.0,
    voltage_mv: 5_050.0,
};

pub const OVERCURRENT: Measurement = Measurement {
    current_ma: 2_400.0,
    voltage_mv: 5_000.0,
};

pub const OVERVOLTAGE: Measurement = Measurement {
    current_ma: 100.0,
    voltage_mv: 6_200.0,
};

// ── MockPower ─────────────────────────────────────────────────

/// Power monitor + load switch with scripted readings.
pub struct MockPower {
    /// Returned when `script` is empty.
    pub measurement: Measurement,
    /// Consumed one per read, front first.
    pub script: VecDeque<Measurement>,
    pub fail_reads: bool,
    /// Number of upcoming writes that fail.
    pub failing_writes: u32,
    /// Successful writes, in order.
    pub writes: Vec<bool>,
    pub reads: usize,
    /// Raise the token once this many reads have happened.
    pub stop_after: Option<(usize, StopToken)>,
}

#[allow(dead_code)]
impl MockPower {
    pub fn new() -> Self {
        Self {
            measurement: NOMINAL,
            script: VecDeque::new(),
            fail_reads: false,
            failing_writes: 0,
            writes: Vec::new(),
            reads: 0,
            stop_after: None,
        }
    }

    pub fn output_on(&self) -> bool {
        self.writes.last().copied().unwrap_or(false)
    }
}

impl Default for MockPower {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementPort for MockPower {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        self.reads += 1;
        if let Some((limit, stop)) = &self.stop_after {
            if self.reads >= *limit {
                stop.stop();
            }
        }
        if self.fail_reads {
            return Err(SensorError::BusError);
        }
        Ok(self.script.pop_front().unwrap_or(self.measurement))
    }
}

impl OutputSwitch for MockPower {
    fn set_output(&mut self, on: bool) -> Result<(), ActuatorError> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.writes.push(on);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Clock that only moves when told to; clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

// ── ScriptedSource ────────────────────────────────────────────

#[allow(dead_code)]
pub enum Step {
    /// Deliver these bytes in one read.
    Data(Vec<u8>),
    /// Let time pass with nothing received.
    Silence(u64),
    /// Fail the read.
    Fail,
}

/// Byte source replaying a script, then raising `stop`.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    clock: ManualClock,
    stop: StopToken,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(steps: Vec<Step>, clock: ManualClock, stop: StopToken) -> Self {
        Self {
            steps: steps.into(),
            clock,
            stop,
        }
    }
}

impl ByteSource for ScriptedSource {
    type Error = &'static str;

    fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, &'static str> {
        match self.steps.pop_front() {
            Some(Step::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.push_front(Step::Data(bytes.split_off(n)));
                }
                Ok(n)
            }
            Some(Step::Silence(ms)) => {
                self.clock.advance(ms);
                Ok(0)
            }
            Some(Step::Fail) => Err("scripted failure"),
            None => {
                self.stop.stop();
                Ok(0)
            }
        }
    }
}

/// Encode one pack into a fresh buffer.
#[allow(dead_code)]
pub fn pack(path: &str, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; path.len() + 5 + payload.len()];
    let n = lumen::pack::encode_pack(path, payload, &mut buf).expect("valid pack");
    buf.truncate(n);
    buf
}
