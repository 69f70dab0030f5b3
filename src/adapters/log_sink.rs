//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to the USB console in production).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::config::HEX_PREVIEW_LEN;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(worker) => {
                info!("START | {}", worker);
            }
            AppEvent::PackRejected(reason) => {
                warn!("PACK | discarding input: {}", reason);
            }
            AppEvent::PackTimedOut { path, remaining } => {
                warn!(
                    "PACK | '{}' timed out with {} bytes outstanding",
                    path, remaining
                );
            }
            AppEvent::UnhandledData {
                path,
                len,
                preview,
                truncated,
            } => {
                warn!(
                    "PACK | unhandled path '{}', size={}, data={}{}{}",
                    path,
                    len,
                    preview,
                    if *len > HEX_PREVIEW_LEN { " ..." } else { "" },
                    if *truncated { " (more follows)" } else { "" },
                );
            }
            AppEvent::UnhandledEnd { path } => {
                warn!("PACK | unhandled path '{}', end of pack", path);
            }
            AppEvent::FaultLatched {
                overcurrent,
                overvoltage,
            } => {
                error!(
                    "FAULT | latched, overcurrent={} overvoltage={}",
                    overcurrent, overvoltage
                );
            }
            AppEvent::FaultRecovered => {
                info!("FAULT | recovered");
            }
            AppEvent::OverrideEngaged => {
                info!("OUT | override engaged, output forced off");
            }
            AppEvent::OverrideReleased => {
                info!("OUT | override released");
            }
            AppEvent::OutputChanged { on } => {
                info!("OUT | output {}", if *on { "ON" } else { "OFF" });
            }
            AppEvent::MeasurementFailed(e) => {
                warn!("SENSE | read failed: {}", e);
            }
            AppEvent::MeasurementRestored => {
                info!("SENSE | restored");
            }
        }
    }
}
