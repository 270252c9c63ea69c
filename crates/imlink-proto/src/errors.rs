//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while framing or parsing protocol messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than a frame header.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Header does not start with the protocol magic.
    #[error("invalid magic: {found:#010x}")]
    InvalidMagic {
        /// Magic value that was read
        found: u32,
    },

    /// Header claims more payload bytes than the buffer holds.
    #[error("frame truncated: expected {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload length claimed by the header
        expected: usize,
        /// Payload bytes actually available
        actual: usize,
    },

    /// Payload exceeds [`crate::FrameHeader::MAX_PAYLOAD_SIZE`].
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload size
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Message type code is not in the registry.
    #[error("unknown message type: {0:#06x}")]
    UnknownMessageType(u16),

    /// Payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// Payload JSON could not be encoded or decoded.
    #[error("invalid payload for {message_type}: {reason}")]
    InvalidPayload {
        /// Name of the message type being processed
        message_type: &'static str,
        /// Serializer error message
        reason: String,
    },
}

impl ProtocolError {
    /// Returns true if more bytes could turn this error into a valid frame.
    ///
    /// Streaming decoders wait on these instead of discarding data.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::FrameTooShort { .. } | Self::FrameTruncated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_classification() {
        assert!(ProtocolError::FrameTooShort { expected: 10, actual: 3 }.is_incomplete());
        assert!(ProtocolError::FrameTruncated { expected: 8, actual: 2 }.is_incomplete());
        assert!(!ProtocolError::InvalidMagic { found: 0 }.is_incomplete());
        assert!(!ProtocolError::UnknownMessageType(0xFFFF).is_incomplete());
    }

    #[test]
    fn display_includes_hex_codes() {
        let err = ProtocolError::UnknownMessageType(0x0300);
        assert_eq!(err.to_string(), "unknown message type: 0x0300");

        let err = ProtocolError::InvalidMagic { found: 0xDEAD_BEEF };
        assert_eq!(err.to_string(), "invalid magic: 0xdeadbeef");
    }
}
