//! Frame header implementation with zero-copy parsing.
//!
//! The `FrameHeader` is a fixed 10-byte structure serialized as raw binary
//! (Big Endian): magic, message type, payload length. No padding, no version
//! byte, no checksum.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    MessageType,
    errors::{ProtocolError, Result},
    opcodes::MAGIC,
};

/// Fixed 10-byte frame header (Big Endian network byte order)
///
/// Fields are stored as raw byte arrays so the struct has alignment 1 and can
/// be cast directly from any offset in a receive buffer.
///
/// # Security
///
/// The `#[repr(C)]` layout with zerocopy traits ensures this struct can be
/// safely cast from untrusted network bytes: every 10-byte pattern is a valid
/// value. Semantic validation (magic, length limit) happens in
/// [`FrameHeader::from_bytes`].
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    magic: [u8; 4],                   // 0x494D494D ("IMIM")
    pub(crate) msg_type: [u8; 2],     // u16 message type
    pub(crate) payload_size: [u8; 4], // u32 payload length
}

impl FrameHeader {
    /// Size of the serialized header (10 bytes)
    pub const SIZE: usize = 10;

    /// Magic number: "IMIM" in ASCII (0x494D494D)
    pub const MAGIC: u32 = MAGIC;

    /// Maximum payload size (16 MB)
    pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

    /// Create a header for a registered message type with an empty payload.
    #[must_use]
    pub fn new(msg_type: MessageType) -> Self {
        Self::with_raw_type(msg_type.to_u16())
    }

    /// Create a header for an arbitrary type code.
    ///
    /// Used by tests and tooling that need to produce frames the registry does
    /// not know about.
    #[must_use]
    pub fn with_raw_type(code: u16) -> Self {
        Self { magic: MAGIC.to_be_bytes(), msg_type: code.to_be_bytes(), payload_size: [0; 4] }
    }

    /// Parse header from network bytes (zero-copy, safe)
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if buffer is shorter than 10 bytes
    /// - `ProtocolError::InvalidMagic` if magic number does not match
    /// - `ProtocolError::PayloadTooLarge` if payload size exceeds maximum
    ///
    /// # Security
    ///
    /// Validation order is cheapest-first (size, magic, length) so garbage is
    /// rejected before any arithmetic on attacker-controlled values.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() })?
            .0;

        let magic = header.magic();
        if magic != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic { found: magic });
        }

        let payload_size = header.payload_size();
        if payload_size > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_size as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// Serialize header to bytes (zero-copy)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Protocol magic number.
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_be_bytes(self.magic)
    }

    /// Message type as raw u16.
    #[must_use]
    pub fn msg_type(&self) -> u16 {
        u16::from_be_bytes(self.msg_type)
    }

    /// Message type as enum. `None` if unregistered.
    #[must_use]
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_u16(self.msg_type())
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }

    /// Set payload size.
    pub fn set_payload_size(&mut self, size: u32) {
        self.payload_size = size.to_be_bytes();
    }
}

impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("FrameHeader");
        s.field("magic", &format!("{:#010x}", self.magic()));
        match self.message_type() {
            Some(ty) => s.field("msg_type", &ty.name()),
            None => s.field("msg_type", &format!("{:#06x}", self.msg_type())),
        };
        s.field("payload_size", &self.payload_size()).finish()
    }
}

impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn header_size_is_ten() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
    }

    #[test]
    fn wire_layout() {
        let mut header = FrameHeader::new(MessageType::LoginRequest);
        header.set_payload_size(2);
        assert_eq!(header.to_bytes(), [0x49, 0x4D, 0x49, 0x4D, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]);
    }

    #[test]
    fn rejects_short_buffer() {
        let result = FrameHeader::from_bytes(&[0x49, 0x4D, 0x49]);
        assert!(matches!(result, Err(ProtocolError::FrameTooShort { expected: 10, actual: 3 })));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = FrameHeader::new(MessageType::Heartbeat).to_bytes();
        bytes[0] = 0x00;
        assert!(matches!(
            FrameHeader::from_bytes(&bytes),
            Err(ProtocolError::InvalidMagic { found: 0x004D_494D })
        ));
    }

    #[test]
    fn rejects_oversized_length() {
        let mut header = FrameHeader::new(MessageType::ReceiveMessage);
        header.set_payload_size(FrameHeader::MAX_PAYLOAD_SIZE + 1);
        let bytes = header.to_bytes();
        assert!(matches!(
            FrameHeader::from_bytes(&bytes),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn unknown_type_still_parses() {
        let bytes = FrameHeader::with_raw_type(0x0999).to_bytes();
        let header = FrameHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.msg_type(), 0x0999);
        assert_eq!(header.message_type(), None);
    }

    proptest! {
        #[test]
        fn header_fields_roundtrip(code in any::<u16>(), size in 0..=FrameHeader::MAX_PAYLOAD_SIZE) {
            let mut header = FrameHeader::with_raw_type(code);
            header.set_payload_size(size);
            let bytes = header.to_bytes();
            let parsed = FrameHeader::from_bytes(&bytes).unwrap();
            prop_assert_eq!(parsed.msg_type(), code);
            prop_assert_eq!(parsed.payload_size(), size);
            prop_assert_eq!(parsed.magic(), FrameHeader::MAGIC);
        }
    }
}
