//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements        | Connects to                  |
//! |--------------|-------------------|------------------------------|
//! | `hardware`   | MeasurementPort   | any monitor driver           |
//! |              | OutputSwitch      | any switch driver            |
//! | `log_sink`   | EventSink         | Serial log output            |
//! | `switch`     | OutputSwitch      | embedded-hal output pin      |
//! | `time`       | ClockPort         | ESP32 system timer / Instant |
//! | `usb_serial` | ByteSource        | ESP32-S3 USB-Serial-JTAG     |

pub mod hardware;
pub mod log_sink;
pub mod switch;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod usb_serial;
