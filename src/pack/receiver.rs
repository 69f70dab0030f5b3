//! Pack receiver: decoder + registry + idle timeout.
//!
//! Owns the read loop of the command transport.  Every decoded chunk is
//! routed to the handler registered for its path; anything that has no
//! handler, or never forms a valid pack, is reported through the
//! [`EventSink`] instead.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ClockPort, EventSink};
use crate::app::runner::StopToken;
use crate::config::{DEFAULT_CHUNK_LEN, IDLE_TIMEOUT_MS, MAX_HANDLERS, READ_TIMEOUT_MS};

use super::codec::{Decoded, PackDecoder};
use super::registry::{HandlerRegistry, PackData, hex_preview};
use super::transport::ByteSource;

/// Bytes requested from the source per read.
const RX_BUF_LEN: usize = 128;

/// Streaming receiver for `N` handlers and `CHUNK`-byte payload chunks.
pub struct PackReceiver<const N: usize = MAX_HANDLERS, const CHUNK: usize = DEFAULT_CHUNK_LEN> {
    decoder: PackDecoder<CHUNK>,
    registry: HandlerRegistry<N>,
    /// Time of the last read that returned data.
    last_rx_ms: u64,
}

impl<const N: usize, const CHUNK: usize> PackReceiver<N, CHUNK> {
    pub fn new() -> Self {
        Self {
            decoder: PackDecoder::new(),
            registry: HandlerRegistry::new(),
            last_rx_ms: 0,
        }
    }

    /// Handler table, for attaching handlers before the loop starts.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry<N> {
        &mut self.registry
    }

    pub fn decoder(&self) -> &PackDecoder<CHUNK> {
        &self.decoder
    }

    /// Decode `data` received at `now_ms` and dispatch the result.
    pub fn feed(&mut self, data: &[u8], now_ms: u64, sink: &mut impl EventSink) {
        if data.is_empty() {
            return;
        }
        self.last_rx_ms = now_ms;

        let registry = &mut self.registry;
        self.decoder
            .feed(data, |decoded| dispatch(&mut *registry, decoded, &mut *sink));
    }

    /// Abandon a pack whose payload has stalled for longer than
    /// `IDLE_TIMEOUT_MS`.  Returns true if a pack was dropped.
    ///
    /// Only a pack in its payload phase can time out; a partial path or
    /// length field waits indefinitely.
    pub fn poll_idle(&mut self, now_ms: u64, sink: &mut impl EventSink) -> bool {
        let Some((path, remaining)) = self.decoder.pending_payload() else {
            return false;
        };
        if now_ms.saturating_sub(self.last_rx_ms) <= IDLE_TIMEOUT_MS {
            return false;
        }

        let path = path.clone();
        if let Some(handler) = self.registry.lookup(&path) {
            handler.abort();
        }
        sink.emit(&AppEvent::PackTimedOut { path, remaining });
        self.decoder.reset();
        self.last_rx_ms = now_ms;
        true
    }

    /// Read from `source` until `stop` is raised.
    ///
    /// Each read waits at most `READ_TIMEOUT_MS`, which bounds how long a
    /// stop request can go unnoticed.  Read errors are logged and treated
    /// like an empty read.
    pub fn run<S: ByteSource>(
        &mut self,
        source: &mut S,
        clock: &impl ClockPort,
        stop: &StopToken,
        sink: &mut impl EventSink,
    ) {
        let mut rx = [0u8; RX_BUF_LEN];
        self.last_rx_ms = clock.now_ms();
        info!(
            "PACK | receiver running ({} handlers, {} B chunks)",
            self.registry.len(),
            CHUNK
        );

        while !stop.is_stopped() {
            match source.read(&mut rx, READ_TIMEOUT_MS) {
                Ok(0) => {
                    self.poll_idle(clock.now_ms(), sink);
                }
                Ok(n) => {
                    let n = n.min(rx.len());
                    self.feed(&rx[..n], clock.now_ms(), sink);
                }
                Err(e) => {
                    warn!("PACK | read failed: {:?}", e);
                    self.poll_idle(clock.now_ms(), sink);
                }
            }
        }

        info!("PACK | receiver stopped");
    }
}

impl<const N: usize, const CHUNK: usize> Default for PackReceiver<N, CHUNK> {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch<const N: usize>(
    registry: &mut HandlerRegistry<N>,
    decoded: Decoded<'_>,
    sink: &mut impl EventSink,
) {
    let (path, data, last) = match decoded {
        Decoded::Rejected(reason) => {
            sink.emit(&AppEvent::PackRejected(reason));
            return;
        }
        Decoded::Chunk { path, data, last } => (path, data, last),
    };

    if let Some(handler) = registry.lookup(path) {
        if !data.is_empty() {
            handler.handle(PackData::Chunk(data));
        }
        if last {
            handler.handle(PackData::End);
        }
        return;
    }

    if !data.is_empty() {
        sink.emit(&AppEvent::UnhandledData {
            path: path.clone(),
            len: data.len(),
            preview: hex_preview(data),
            truncated: !last,
        });
    }
    if last {
        sink.emit(&AppEvent::UnhandledEnd { path: path.clone() });
    }
}
