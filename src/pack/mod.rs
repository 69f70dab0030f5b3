//! Pack command transport.
//!
//! Resource-bounded decoder for the "pack" framing protocol riding on a
//! byte stream with no message boundaries, plus the handler registry that
//! decoded packs are dispatched to.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Pack Stack                             │
//! │                                                            │
//! │  ┌────────────┐   ┌─────────────┐   ┌──────────────────┐   │
//! │  │ ByteSource │──▶│ PackDecoder │──▶│ HandlerRegistry  │   │
//! │  │ (trait)    │   │ (framing)   │   │ → PackHandler    │   │
//! │  └────────────┘   └─────────────┘   └──────────────────┘   │
//! │        ▲                 │                                 │
//! │        │                 ▼                                 │
//! │  ┌──────────────┐   ┌──────────┐                           │
//! │  │ PackReceiver │   │ EventSink│  (rejections, timeouts,   │
//! │  │ (read loop)  │   │          │   unhandled paths)        │
//! │  └──────────────┘   └──────────┘                           │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire layout of one pack:
//!
//! ```text
//! ┌──────────────────┬──────┬─────────────┬───────────────────┐
//! │ path (1..15 B)   │ 0x0A │ length (4B) │ payload (length B)│
//! │ ASCII, no SP/CR  │  LF  │ LE u32      │                   │
//! └──────────────────┴──────┴─────────────┴───────────────────┘
//! ```

pub mod codec;
pub mod receiver;
pub mod registry;
pub mod transport;

pub use codec::{Decoded, PackDecoder, PackPath, PathError, encode_pack};
pub use receiver::PackReceiver;
pub use registry::{HandlerRegistry, PackData, PackHandler};
pub use transport::ByteSource;
