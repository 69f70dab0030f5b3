//! Output switch adapter over an `embedded-hal` output pin.
//!
//! Drives the load switch enable line: HIGH = output on.  On the device
//! the pin is an `esp_idf_hal::gpio::PinDriver`; tests use a mock pin.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::app::ports::OutputSwitch;
use crate::error::ActuatorError;

/// Load switch enable line.
pub struct GpioSwitch<P: OutputPin> {
    pin: P,
}

impl<P: OutputPin> GpioSwitch<P> {
    /// Take ownership of `pin` and drive it low (output off).
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
        Ok(Self { pin })
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> OutputSwitch for GpioSwitch<P> {
    fn set_output(&mut self, on: bool) -> Result<(), ActuatorError> {
        debug!("switch -> {}", if on { "HIGH" } else { "LOW" });
        if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
        .map_err(|_| ActuatorError::GpioWriteFailed)
    }
}
