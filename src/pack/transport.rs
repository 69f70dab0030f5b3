//! Byte source abstraction for the pack receiver.
//!
//! Concrete implementations:
//! - USB serial/JTAG console on ESP32-S3 (`adapters::usb_serial`)
//! - scripted in-memory sources in the test suite
//!
//! The receiver loop is generic over `ByteSource`, so a UART or socket
//! can be swapped in without touching the framing logic.

/// Byte-oriented, boundary-free input channel.
///
/// Read-only: the protocol has no reply path.
pub trait ByteSource {
    /// Error type for this source.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms`.
    /// Returns `Ok(0)` when the wait expired with nothing received.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

}
