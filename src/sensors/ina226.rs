//! INA226 current / bus-voltage monitor on I2C.
//!
//! The shunt sits in the protected output path.  The chip is configured
//! for continuous shunt + bus conversion (8.244 ms each, no averaging) and
//! calibrated so the current register reads in units of
//! `max_current / 32768`.
//!
//! Registers are 16-bit big-endian.  The driver is generic over the
//! `embedded-hal` 1.0 I2C trait: `esp_idf_hal::i2c::I2cDriver` on the
//! device, a register-file mock in tests.

use embedded_hal::i2c::I2c;
use log::info;

use crate::app::ports::MeasurementPort;
use crate::error::SensorError;
use crate::supervisor::Measurement;

// ── Register map ──────────────────────────────────────────────

const REG_CONFIG: u8 = 0x00;
const REG_BUS_VOLTAGE: u8 = 0x02;
const REG_CURRENT: u8 = 0x04;
const REG_CALIBRATION: u8 = 0x05;
const REG_MANUFACTURER_ID: u8 = 0xFE;

/// "TI" in ASCII.
const MANUFACTURER_TI: u16 = 0x5449;

/// Reset bit of the configuration register.
const CONFIG_RESET: u16 = 0x8000;
/// 1 sample, 8.244 ms bus + shunt conversion, shunt and bus continuous.
const CONFIG_CONTINUOUS: u16 = 0x41FF;

/// Bus voltage LSB (mV).
const BUS_LSB_MV: f32 = 1.25;
/// Calibration scaling constant from the datasheet.
const CAL_SCALE: f32 = 0.005_12;

/// Current and voltage monitor.
pub struct Ina226<I2C> {
    i2c: I2C,
    address: u8,
    current_lsb_ma: f32,
}

impl<I2C: I2c> Ina226<I2C> {
    /// Reset, identify, configure and calibrate the chip.
    ///
    /// `shunt_mohm` is the shunt resistance and `max_current_ma` the
    /// largest current to resolve.
    pub fn new(
        i2c: I2C,
        address: u8,
        shunt_mohm: f32,
        max_current_ma: f32,
    ) -> Result<Self, SensorError> {
        if shunt_mohm <= 0.0 || max_current_ma <= 0.0 {
            return Err(SensorError::BadCalibration);
        }

        // current_lsb [A] = I_max / 2^15; cal = 0.00512 / (current_lsb * R_shunt)
        let current_lsb_a = max_current_ma / 1_000.0 / 32_768.0;
        let cal = CAL_SCALE / (current_lsb_a * shunt_mohm / 1_000.0);
        if !(1.0..=f32::from(u16::MAX >> 1)).contains(&cal) {
            return Err(SensorError::BadCalibration);
        }

        let mut dev = Self {
            i2c,
            address,
            current_lsb_ma: current_lsb_a * 1_000.0,
        };

        let id = dev.read_register(REG_MANUFACTURER_ID)?;
        if id != MANUFACTURER_TI {
            return Err(SensorError::UnexpectedDevice(id));
        }

        dev.write_register(REG_CONFIG, CONFIG_RESET)?;
        dev.write_register(REG_CONFIG, CONFIG_CONTINUOUS)?;
        dev.write_register(REG_CALIBRATION, cal as u16)?;

        info!(
            "INA226 @0x{:02X}: shunt={} mOhm, I_max={} mA, cal={}",
            address, shunt_mohm, max_current_ma, cal as u16
        );
        Ok(dev)
    }

    /// Bus voltage in millivolts.
    pub fn bus_voltage_mv(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_BUS_VOLTAGE)?;
        Ok(f32::from(raw) * BUS_LSB_MV)
    }

    /// Signed load current in milliamps.
    pub fn current_ma(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_CURRENT)? as i16;
        Ok(f32::from(raw) * self.current_lsb_ma)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|_| SensorError::BusError)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, reg: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.address, &[reg, hi, lo])
            .map_err(|_| SensorError::BusError)
    }
}

impl<I2C: I2c> MeasurementPort for Ina226<I2C> {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        Ok(Measurement {
            current_ma: self.current_ma()?,
            voltage_mv: self.bus_voltage_mv()?,
        })
    }
}
