//! Built-in pack handlers.
//!
//! These are the inbound commands the transport can deliver to the
//! supervisor.  Both act on the shared configuration record only; the
//! supervisor picks the change up on its next tick.
//!
//! | Path     | Payload                                   |
//! |----------|-------------------------------------------|
//! | `config` | postcard-encoded [`PowerConfig`]          |
//! | `output` | 1 byte: `0` = force off, other = release  |

use heapless::Vec;
use log::{info, warn};

use crate::config::{PowerConfig, SharedConfig};
use crate::error::{ConfigError, RegistryError};
use crate::pack::registry::{HandlerRegistry, PackData, PackHandler};

pub const CONFIG_PATH: &str = "config";
pub const OUTPUT_PATH: &str = "output";

/// Largest accepted encoded `PowerConfig`.
pub const CONFIG_BUF_LEN: usize = 64;

// ───────────────────────────────────────────────────────────────
// config
// ───────────────────────────────────────────────────────────────

/// Replaces the whole configuration record.
pub struct ConfigCommand {
    config: &'static SharedConfig,
    buf: Vec<u8, CONFIG_BUF_LEN>,
    overflowed: bool,
}

impl ConfigCommand {
    pub fn new(config: &'static SharedConfig) -> Self {
        Self {
            config,
            buf: Vec::new(),
            overflowed: false,
        }
    }

    fn apply(&self) -> Result<PowerConfig, ConfigError> {
        if self.overflowed {
            return Err(ConfigError::TooLarge);
        }
        let (next, rest) = postcard::take_from_bytes::<PowerConfig>(&self.buf)
            .map_err(|_| ConfigError::Corrupted)?;
        if !rest.is_empty() {
            return Err(ConfigError::Corrupted);
        }
        next.validate()?;
        self.config.publish(next);
        Ok(next)
    }
}

impl PackHandler for ConfigCommand {
    fn handle(&mut self, data: PackData<'_>) {
        match data {
            PackData::Chunk(bytes) => {
                if self.buf.extend_from_slice(bytes).is_err() {
                    self.overflowed = true;
                }
            }
            PackData::End => {
                match self.apply() {
                    Ok(cfg) => info!("CMD | config updated: {:?}", cfg),
                    Err(e) => warn!("CMD | config rejected: {}", e),
                }
                self.abort();
            }
        }
    }

    fn abort(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}

// ───────────────────────────────────────────────────────────────
// output
// ───────────────────────────────────────────────────────────────

/// Engages or releases the manual override.
pub struct OutputCommand {
    config: &'static SharedConfig,
    value: Option<u8>,
    len: usize,
}

impl OutputCommand {
    pub fn new(config: &'static SharedConfig) -> Self {
        Self {
            config,
            value: None,
            len: 0,
        }
    }
}

impl PackHandler for OutputCommand {
    fn handle(&mut self, data: PackData<'_>) {
        match data {
            PackData::Chunk(bytes) => {
                if self.value.is_none() {
                    self.value = bytes.first().copied();
                }
                self.len += bytes.len();
            }
            PackData::End => {
                match (self.value, self.len) {
                    (Some(byte), 1) => {
                        let force_off = byte == 0;
                        self.config.update(|c| c.force_output_off = force_off);
                        info!(
                            "CMD | output override {}",
                            if force_off { "engaged" } else { "released" }
                        );
                    }
                    (_, len) => warn!("CMD | output expects 1 byte, got {}", len),
                }
                self.abort();
            }
        }
    }

    fn abort(&mut self) {
        self.value = None;
        self.len = 0;
    }
}

/// Attach the `config` and `output` handlers.
pub fn install_default_handlers<const N: usize>(
    registry: &mut HandlerRegistry<N>,
    config: &'static SharedConfig,
) -> Result<(), RegistryError> {
    registry.attach(CONFIG_PATH, ConfigCommand::new(config))?;
    registry.attach(OUTPUT_PATH, OutputCommand::new(config))?;
    Ok(())
}
