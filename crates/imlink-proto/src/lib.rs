//! Wire format for the imlink chat protocol.
//!
//! Every message on the socket is a frame: a fixed 10-byte header (magic,
//! message type, payload length, all Big Endian) followed by a JSON payload.
//! The header is parsed zero-copy; payloads are only deserialized by the
//! layer that needs them.
//!
//! The stream carries no other delimiter, so [`FrameDecoder`] accumulates raw
//! socket reads and slices complete frames out of them. A header whose magic
//! does not match is skipped one byte at a time until the stream lines up
//! again.
//!
//! # Security
//!
//! All header parsing uses compile-time verified layouts via `zerocopy`. We
//! enforce a 16 MB payload limit so a corrupted length field cannot make the
//! decoder buffer unbounded amounts of data.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod decoder;
pub mod errors;
pub mod frame;
pub mod header;
pub mod opcodes;
pub mod payloads;

pub use decoder::FrameDecoder;
pub use errors::{ProtocolError, Result};
pub use frame::{Frame, encode};
pub use header::FrameHeader;
pub use opcodes::MessageType;
pub use payloads::Payload;
