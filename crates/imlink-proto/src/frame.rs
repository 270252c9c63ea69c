//! Frame type combining header and payload.
//!
//! A `Frame` is the transport-layer packet consisting of:
//! - 10-byte raw binary header (Big Endian)
//! - Variable-length payload bytes (JSON for every registered type)
//!
//! This is a pure data holder. For typed access see `Payload::from_frame()`
//! and `Payload::into_frame()`.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    FrameHeader, MessageType,
    errors::{ProtocolError, Result},
};

/// Complete protocol frame (transport layer)
///
/// Layout on the wire: `[FrameHeader: 10 bytes] + [payload: variable bytes]`
///
/// # Invariants
///
/// - Size Consistency: `payload.len()` MUST match `header.payload_size()`.
///   Enforced by [`Frame::new`] and verified by [`Frame::decode`].
///
/// - Size Limit: `payload.len()` MUST NOT exceed
///   [`FrameHeader::MAX_PAYLOAD_SIZE`]. Violations are rejected during
///   encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header (10 bytes)
    pub header: FrameHeader,

    /// Raw payload bytes
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame with automatic `payload_size` calculation.
    ///
    /// Oversized payloads are accepted here and rejected by
    /// [`Frame::encode`], so tests can construct them.
    #[must_use]
    pub fn new(mut header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        // Saturating: anything that does not fit in u32 is far above the limit
        // and fails in encode.
        let payload_len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        header.set_payload_size(payload_len);
        Self { header, payload }
    }

    /// Create a frame for a registered message type.
    #[must_use]
    pub fn with_type(msg_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self::new(FrameHeader::new(msg_type), payload)
    }

    /// Message type as enum. `None` if unregistered.
    #[must_use]
    pub fn message_type(&self) -> Option<MessageType> {
        self.header.message_type()
    }

    /// Payload interpreted as UTF-8 text.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidUtf8` if the payload is not valid UTF-8
    pub fn payload_text(&self) -> Result<&str> {
        std::str::from_utf8(&self.payload).map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Total encoded size (header + payload).
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        FrameHeader::SIZE + self.payload.len()
    }

    /// Encode frame into buffer.
    ///
    /// Writes: `[header (10 bytes)] + [payload (variable)]`
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if payload exceeds `MAX_PAYLOAD_SIZE`
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        debug_assert_eq!(self.payload.len(), self.header.payload_size() as usize);

        if self.payload.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Encode frame into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if payload exceeds `MAX_PAYLOAD_SIZE`
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode one complete frame from the start of `bytes`.
    ///
    /// Trailing bytes after the frame are ignored. For a byte stream use
    /// [`crate::FrameDecoder`], which also resynchronizes on bad magic.
    ///
    /// # Errors
    ///
    /// - `ProtocolError` if header parsing fails (short, bad magic, oversized)
    /// - `ProtocolError::FrameTruncated` if fewer payload bytes are present
    ///   than the header claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;

        let payload_size = header.payload_size() as usize;
        let total_size = FrameHeader::SIZE + payload_size;

        let Some(payload) = bytes.get(FrameHeader::SIZE..total_size) else {
            return Err(ProtocolError::FrameTruncated {
                expected: payload_size,
                actual: bytes.len().saturating_sub(FrameHeader::SIZE),
            });
        };

        Ok(Self { header: *header, payload: Bytes::copy_from_slice(payload) })
    }
}

/// Encode a message into wire bytes in one step.
///
/// # Errors
///
/// - `ProtocolError::PayloadTooLarge` if payload exceeds `MAX_PAYLOAD_SIZE`
pub fn encode(msg_type: MessageType, payload: &[u8]) -> Result<Bytes> {
    Frame::with_type(msg_type, Bytes::copy_from_slice(payload)).to_bytes()
}
