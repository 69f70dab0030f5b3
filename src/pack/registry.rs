//! Path → handler table.
//!
//! Handlers are trait objects so any closure or stateful struct can be
//! attached without the registry knowing its concrete type.  Capacity is a
//! const generic; attaching past it fails instead of growing.

use core::fmt::Write as _;

use heapless::Vec;
use log::{error, info};

use crate::config::{HEX_PREVIEW_LEN, MAX_HANDLERS};
use crate::error::RegistryError;

use super::codec::{PackPath, is_valid_path};

/// What a handler receives for its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackData<'a> {
    /// Payload bytes, never empty, in stream order.
    Chunk(&'a [u8]),
    /// The pack is complete.
    End,
}

/// Receiver of decoded pack data for one path.
///
/// Runs on the receiver task, so it must be `Send` and should return
/// quickly.
pub trait PackHandler: Send {
    fn handle(&mut self, data: PackData<'_>);

    /// The pack in progress was dropped before its `End`; discard any
    /// partial state.
    fn abort(&mut self) {}
}

impl<F> PackHandler for F
where
    F: FnMut(PackData<'_>) + Send,
{
    fn handle(&mut self, data: PackData<'_>) {
        self(data)
    }
}

struct HandlerEntry {
    path: PackPath,
    handler: Box<dyn PackHandler>,
}

/// Bounded table of at most `N` handlers, one per path.
pub struct HandlerRegistry<const N: usize = MAX_HANDLERS> {
    entries: Vec<HandlerEntry, N>,
}

impl<const N: usize> HandlerRegistry<N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `handler` for `path`.
    ///
    /// An existing registration for the same path is replaced in place.
    /// Fails when `path` can never appear on the wire or when every slot
    /// is already taken by a different path.
    pub fn attach(
        &mut self,
        path: &str,
        handler: impl PackHandler + 'static,
    ) -> Result<(), RegistryError> {
        if !is_valid_path(path) {
            error!("PACK | cannot attach handler: invalid path '{}'", path);
            return Err(RegistryError::InvalidPath);
        }

        if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
            entry.handler = Box::new(handler);
            info!("PACK | handler replaced for '{}'", path);
            return Ok(());
        }

        let mut key = PackPath::new();
        key.push_str(path).map_err(|()| RegistryError::InvalidPath)?;

        let entry = HandlerEntry {
            path: key,
            handler: Box::new(handler),
        };
        if self.entries.push(entry).is_err() {
            error!("PACK | handler table full ({}), '{}' not attached", N, path);
            return Err(RegistryError::Full);
        }

        info!("PACK | handler attached for '{}'", path);
        Ok(())
    }

    /// Handler registered for `path`, if any.
    pub fn lookup(&mut self, path: &str) -> Option<&mut (dyn PackHandler + 'static)> {
        self.entries
            .iter_mut()
            .find(|e| e.path == path)
            .map(|e| e.handler.as_mut())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<const N: usize> Default for HandlerRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Hex preview ──────────────────────────────────────────────

/// Rendered preview: `HEX_PREVIEW_LEN` bytes as "XX " minus the last space.
pub type HexPreview = heapless::String<{ HEX_PREVIEW_LEN * 3 }>;

/// Uppercase, space-separated hex of the first `HEX_PREVIEW_LEN` bytes.
pub fn hex_preview(data: &[u8]) -> HexPreview {
    let mut out = HexPreview::new();
    for (i, byte) in data.iter().take(HEX_PREVIEW_LEN).enumerate() {
        // Capacity fits HEX_PREVIEW_LEN bytes exactly.
        if i > 0 {
            out.push(' ').ok();
        }
        write!(out, "{byte:02X}").ok();
    }
    out
}
