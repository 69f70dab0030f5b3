//! GPIO / peripheral pin assignments for the Lumen power board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Load switch
// ---------------------------------------------------------------------------

/// Digital output: enables the USB output load switch (active HIGH).
pub const OUT_CONTROL_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Power monitor (INA226 on I2C0)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 7;
pub const I2C_FREQ_HZ: u32 = 400_000;

/// A1 = VS, A0 = GND.
pub const INA226_ADDRESS: u8 = 0x44;
pub const INA226_SHUNT_MOHM: f32 = 100.0;
pub const INA226_MAX_CURRENT_MA: f32 = 1_600.0;
