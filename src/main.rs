//! Lumen Firmware: Main Entry Point
//!
//! USB power-output controller: a host-driven command channel plus an
//! electronic fuse guarding the output.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UsbSerialJtag   Ina226 + GpioSwitch   LogEventSink  Monotonic │
//! │  (ByteSource)    (PowerHardware)       (EventSink)   (Clock)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌──────────────────────────┐    ┌─────────────────────────┐   │
//! │  │ PackReceiver (core 0)    │    │ PowerService (core 1)   │   │
//! │  │ decoder · registry       │    │ FaultSupervisor, 50 ms  │   │
//! │  └────────────┬─────────────┘    └────────────▲────────────┘   │
//! │               │   config / output handlers    │                │
//! │               └──────────▶ LUMEN_CONFIG ──────┘                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info};

use lumen::adapters::hardware::PowerHardware;
use lumen::adapters::log_sink::LogEventSink;
use lumen::adapters::switch::GpioSwitch;
use lumen::adapters::usb_serial::UsbSerialJtag;
use lumen::app::commands::install_default_handlers;
use lumen::app::runner::{StopToken, spawn_receiver, spawn_supervisor};
use lumen::config::LUMEN_CONFIG;
use lumen::error::Error;
use lumen::pack::PackReceiver;
use lumen::pins;
use lumen::sensors::Ina226;
use lumen::supervisor::FAULT_MONITOR;

/// Period of the heartbeat log line.
const HEARTBEAT_MS: u32 = 10_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Lumen v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;

    // ── 2. Load switch (held off until the first tick) ────────
    // SAFETY: the pin number comes from the board map and is not claimed
    // by any other driver.
    let out_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::OUT_CONTROL_GPIO) })?;
    let switch = GpioSwitch::new(out_pin).map_err(Error::from)?;

    // ── 3. Power monitor ──────────────────────────────────────
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    // SAFETY: as above, SDA/SCL are dedicated to this bus.
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
        )
    };
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_cfg)?;
    let monitor = Ina226::new(
        i2c,
        pins::INA226_ADDRESS,
        pins::INA226_SHUNT_MOHM,
        pins::INA226_MAX_CURRENT_MA,
    )
    .map_err(Error::from)?;
    let hw = PowerHardware::new(monitor, switch);

    // ── 4. Command transport ──────────────────────────────────
    let mut receiver: PackReceiver = PackReceiver::new();
    install_default_handlers(receiver.registry_mut(), &LUMEN_CONFIG).map_err(Error::from)?;
    let usb = UsbSerialJtag::install()?;

    // ── 5. Workers ────────────────────────────────────────────
    let stop = StopToken::new();
    let rx_task = spawn_receiver(receiver, usb, LogEventSink::new(), stop.clone())?;
    let efuse_task = spawn_supervisor(
        hw,
        &LUMEN_CONFIG,
        &FAULT_MONITOR,
        LogEventSink::new(),
        stop,
    )?;

    info!("System ready.");

    // ── 6. Heartbeat ──────────────────────────────────────────
    loop {
        FreeRtos::delay_ms(HEARTBEAT_MS);

        let cfg = LUMEN_CONFIG.snapshot();
        let status = FAULT_MONITOR.status();
        info!(
            "HEART | oc={} ov={} fault_off={} override={}",
            status.overcurrent, status.overvoltage, status.off_due_to_fault, cfg.force_output_off
        );

        if rx_task.is_finished() || efuse_task.is_finished() {
            error!("A worker exited unexpectedly, restarting");
            esp_idf_hal::reset::restart();
        }
    }
}
