//! Streaming pack decoder and encoder.
//!
//! The decoder consumes bytes one at a time and never allocates: the path
//! lives in a `heapless::String` of `MAX_PATH_LEN - 1` bytes and the payload
//! is cut into chunks of at most `CHUNK` bytes.  A single `feed` call may
//! carry part of a pack, exactly one pack, or several packs back to back.
//!
//! Malformed input never stops the decoder.  A bad path switches it to a
//! discard mode that swallows everything through the next LF.

use core::fmt;

use heapless::Vec;
use log::debug;

use crate::config::{DEFAULT_CHUNK_LEN, MAX_PATH_LEN};

/// Longest accepted path.
pub const PATH_CAPACITY: usize = MAX_PATH_LEN - 1;

/// Size of the little-endian length field.
const LENGTH_SIZE: usize = 4;

/// Path text of a pack.
pub type PackPath = heapless::String<PATH_CAPACITY>;

/// Why a path was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    ContainsSpace,
    TooLong,
    NonAscii,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainsSpace => write!(f, "path contains space"),
            Self::TooLong => write!(f, "path too long"),
            Self::NonAscii => write!(f, "path contains non-ASCII byte"),
        }
    }
}

/// Output of the decoder, borrowed from its internal buffers.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// Payload bytes for `path`.
    ///
    /// `data` is empty only for a zero-length pack.  `last` is set on the
    /// chunk that completes the pack; the end-of-pack signal follows it.
    Chunk {
        path: &'a PackPath,
        data: &'a [u8],
        last: bool,
    },
    /// The path was malformed; input is discarded through the next LF.
    Rejected(PathError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    AwaitingPath,
    ReadingLength { collected: usize },
    ReadingPayload { remaining: u32 },
    Discarding,
}

/// Streaming pack decoder with a `CHUNK`-byte payload buffer.
pub struct PackDecoder<const CHUNK: usize = DEFAULT_CHUNK_LEN> {
    state: DecoderState,
    path: PackPath,
    length_buf: [u8; LENGTH_SIZE],
    chunk: Vec<u8, CHUNK>,
}

impl<const CHUNK: usize> PackDecoder<CHUNK> {
    const CHUNK_NOT_EMPTY: () = assert!(CHUNK > 0, "chunk capacity must be non-zero");

    pub fn new() -> Self {
        let () = Self::CHUNK_NOT_EMPTY;
        Self {
            state: DecoderState::AwaitingPath,
            path: PackPath::new(),
            length_buf: [0; LENGTH_SIZE],
            chunk: Vec::new(),
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// `on` is called for every completed chunk and every rejected path, in
    /// stream order.  Borrowed data is only valid for the duration of the call.
    pub fn feed(&mut self, data: &[u8], mut on: impl FnMut(Decoded<'_>)) {
        for &byte in data {
            self.push(byte, &mut on);
        }
    }

    /// Drop any partially decoded pack and wait for a new path.
    pub fn reset(&mut self) {
        self.state = DecoderState::AwaitingPath;
        self.path.clear();
        self.chunk.clear();
    }

    /// Path and outstanding byte count of a pack whose payload is in flight.
    pub fn pending_payload(&self) -> Option<(&PackPath, u32)> {
        match self.state {
            DecoderState::ReadingPayload { remaining } => Some((&self.path, remaining)),
            _ => None,
        }
    }

    /// True while malformed input is being skipped.
    pub fn is_discarding(&self) -> bool {
        self.state == DecoderState::Discarding
    }

    /// True between packs, with no path bytes accumulated.
    pub fn is_idle(&self) -> bool {
        self.state == DecoderState::AwaitingPath && self.path.is_empty()
    }

    // ── Internal ──────────────────────────────────────────────────

    fn push(&mut self, byte: u8, on: &mut impl FnMut(Decoded<'_>)) {
        match self.state {
            DecoderState::Discarding => {
                if byte == b'\n' {
                    self.reset();
                }
            }
            DecoderState::AwaitingPath => self.push_path_byte(byte, on),
            DecoderState::ReadingLength { collected } => {
                self.length_buf[collected] = byte;
                let collected = collected + 1;
                if collected < LENGTH_SIZE {
                    self.state = DecoderState::ReadingLength { collected };
                    return;
                }

                let length = u32::from_le_bytes(self.length_buf);
                debug!("pack '{}' length {}", self.path, length);
                if length == 0 {
                    on(Decoded::Chunk {
                        path: &self.path,
                        data: &[],
                        last: true,
                    });
                    self.reset();
                } else {
                    self.chunk.clear();
                    self.state = DecoderState::ReadingPayload { remaining: length };
                }
            }
            DecoderState::ReadingPayload { remaining } => {
                // The chunk is flushed the moment it fills, so there is
                // always room for one more byte here.
                let pushed = self.chunk.push(byte);
                debug_assert!(pushed.is_ok());

                let remaining = remaining - 1;
                if self.chunk.is_full() || remaining == 0 {
                    on(Decoded::Chunk {
                        path: &self.path,
                        data: &self.chunk,
                        last: remaining == 0,
                    });
                    self.chunk.clear();
                }

                if remaining == 0 {
                    self.reset();
                } else {
                    self.state = DecoderState::ReadingPayload { remaining };
                }
            }
        }
    }

    fn push_path_byte(&mut self, byte: u8, on: &mut impl FnMut(Decoded<'_>)) {
        match byte {
            b'\r' => {}
            b'\n' => {
                // A bare line terminator does not start a pack.
                if !self.path.is_empty() {
                    self.state = DecoderState::ReadingLength { collected: 0 };
                }
            }
            b' ' => self.reject(PathError::ContainsSpace, on),
            b if !b.is_ascii() => self.reject(PathError::NonAscii, on),
            b => {
                if self.path.push(char::from(b)).is_err() {
                    self.reject(PathError::TooLong, on);
                }
            }
        }
    }

    fn reject(&mut self, reason: PathError, on: &mut impl FnMut(Decoded<'_>)) {
        self.state = DecoderState::Discarding;
        self.path.clear();
        on(Decoded::Rejected(reason));
    }
}

impl<const CHUNK: usize> Default for PackDecoder<CHUNK> {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `path` can be carried on the wire and matched by the decoder.
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.len() <= PATH_CAPACITY
        && path
            .bytes()
            .all(|b| b.is_ascii() && !matches!(b, b' ' | b'\r' | b'\n'))
}

/// Encode one pack into `out_buf`.
///
/// Writes `[path][LF][LE-u32 length][payload]`.
/// Returns the total number of bytes written, or `None` if the path is not
/// valid, the payload does not fit a `u32`, or `out_buf` is too small.
pub fn encode_pack(path: &str, payload: &[u8], out_buf: &mut [u8]) -> Option<usize> {
    if !is_valid_path(path) {
        return None;
    }
    let length = u32::try_from(payload.len()).ok()?;

    let header = path.len() + 1 + LENGTH_SIZE;
    let total = header + payload.len();
    if total > out_buf.len() {
        return None;
    }

    out_buf[..path.len()].copy_from_slice(path.as_bytes());
    out_buf[path.len()] = b'\n';
    out_buf[path.len() + 1..header].copy_from_slice(&length.to_le_bytes());
    out_buf[header..total].copy_from_slice(payload);

    Some(total)
}

// ── Tests ────────────────────────────────────────────────────
