//! USB-Serial-JTAG console as a [`ByteSource`] (ESP32-S3 only).
//!
//! Installs the ESP-IDF `usb_serial_jtag` driver with a 16 KiB receive
//! ring so the host can stream a whole pack while the receiver task is
//! busy dispatching.

use core::ffi::c_void;

use esp_idf_hal::delay::TickType;
use esp_idf_sys::{
    ESP_OK, usb_serial_jtag_driver_config_t, usb_serial_jtag_driver_install,
    usb_serial_jtag_read_bytes,
};
use log::info;

use crate::error::{Error, Result};
use crate::pack::transport::ByteSource;

const TX_BUFFER_LEN: u32 = 1024;
const RX_BUFFER_LEN: u32 = 16 * 1024;

/// Installed USB-Serial-JTAG driver.
pub struct UsbSerialJtag {
    _installed: (),
}

/// Negative return from the driver.
#[derive(Debug, Clone, Copy)]
pub struct UsbSerialError(pub i32);

impl UsbSerialJtag {
    pub fn install() -> Result<Self> {
        let mut cfg = usb_serial_jtag_driver_config_t {
            tx_buffer_size: TX_BUFFER_LEN,
            rx_buffer_size: RX_BUFFER_LEN,
        };
        // SAFETY: `cfg` is valid for the duration of the call; the driver
        // copies it.
        let ret = unsafe { usb_serial_jtag_driver_install(&mut cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Init("usb_serial_jtag_driver_install failed"));
        }
        info!(
            "USB-Serial-JTAG installed (rx={} B, tx={} B)",
            RX_BUFFER_LEN, TX_BUFFER_LEN
        );
        Ok(Self { _installed: () })
    }
}

impl ByteSource for UsbSerialJtag {
    type Error = UsbSerialError;

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> core::result::Result<usize, UsbSerialError> {
        let ticks = TickType::new_millis(u64::from(timeout_ms)).ticks();
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let n = unsafe {
            usb_serial_jtag_read_bytes(buf.as_mut_ptr().cast::<c_void>(), buf.len() as u32, ticks)
        };
        usize::try_from(n).map_err(|_| UsbSerialError(n))
    }
}
