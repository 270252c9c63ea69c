//! Fuzz target for frame header boundary conditions
//!
//! # Strategy
//!
//! - Magic bytes: Valid, off-by-one, all-zeros, all-ones, random
//! - Payload size: Zero, small, at-max, just-over-max, u32::MAX, random
//! - Message type: any u16, registered or not
//! - Body: complete, short by some bytes, or followed by trailing garbage
//!
//! # Invariants
//!
//! - `payload_size > MAX_PAYLOAD_SIZE` MUST return `PayloadTooLarge`
//! - Invalid magic bytes MUST return `InvalidMagic`
//! - Unregistered message types decode; they are rejected later, per frame
//! - A body shorter than the header claims MUST return `FrameTruncated`
//! - Encoded size MUST equal 10 + payload_size

#![no_main]

use arbitrary::Arbitrary;
use imlink_proto::{Frame, FrameHeader, MessageType, ProtocolError};
use libfuzzer_sys::fuzz_target;

const MAGIC: [u8; 4] = FrameHeader::MAGIC.to_be_bytes();
const MAX_PAYLOAD_SIZE: u32 = FrameHeader::MAX_PAYLOAD_SIZE;

#[derive(Debug, Clone, Arbitrary)]
struct BoundaryFrame {
    magic: MagicBytes,
    msg_type: u16,
    payload_size: PayloadSize,
    body: BodyShape,
}

#[derive(Debug, Clone, Arbitrary)]
enum MagicBytes {
    Valid,
    OffByOne(u8),
    AllZeros,
    AllOnes,
    Random([u8; 4]),
}

#[derive(Debug, Clone, Arbitrary)]
enum PayloadSize {
    Zero,
    Small(u8),
    AtMaxBoundary,
    JustOverMax,
    MaxU32,
    Random(u32),
}

#[derive(Debug, Clone, Arbitrary)]
enum BodyShape {
    Complete,
    Short(u8),
    Trailing(Vec<u8>),
}

fuzz_target!(|boundary: BoundaryFrame| {
    let payload_size = match boundary.payload_size {
        PayloadSize::Zero => 0,
        PayloadSize::Small(s) => u32::from(s),
        PayloadSize::AtMaxBoundary => MAX_PAYLOAD_SIZE,
        PayloadSize::JustOverMax => MAX_PAYLOAD_SIZE + 1,
        PayloadSize::MaxU32 => u32::MAX,
        PayloadSize::Random(r) => r,
    };

    // Never allocate the full claimed length; truncation is what we probe.
    let body_len = payload_size.min(4096) as usize;
    let mut buffer = vec![0u8; FrameHeader::SIZE + body_len];

    let magic_valid = match boundary.magic {
        MagicBytes::Valid => {
            buffer[0..4].copy_from_slice(&MAGIC);
            true
        },
        MagicBytes::OffByOne(offset) => {
            buffer[0..4].copy_from_slice(&MAGIC);
            let idx = (offset % 4) as usize;
            buffer[idx] = buffer[idx].wrapping_add(1);
            false
        },
        MagicBytes::AllZeros => false,
        MagicBytes::AllOnes => {
            buffer[0..4].fill(0xFF);
            false
        },
        MagicBytes::Random(bytes) => {
            buffer[0..4].copy_from_slice(&bytes);
            bytes == MAGIC
        },
    };
    buffer[4..6].copy_from_slice(&boundary.msg_type.to_be_bytes());
    buffer[6..10].copy_from_slice(&payload_size.to_be_bytes());

    let complete = body_len == payload_size as usize;
    let complete = match &boundary.body {
        BodyShape::Complete => complete,
        BodyShape::Short(cut) => {
            let cut = (*cut as usize).min(body_len);
            buffer.truncate(buffer.len() - cut);
            complete && cut == 0
        },
        BodyShape::Trailing(extra) => {
            buffer.extend_from_slice(extra);
            complete || buffer.len() >= FrameHeader::SIZE + payload_size as usize
        },
    };

    match Frame::decode(&buffer) {
        Ok(frame) => {
            assert!(magic_valid);
            assert!(payload_size <= MAX_PAYLOAD_SIZE);
            assert!(complete);
            assert_eq!(frame.header.msg_type(), boundary.msg_type);
            assert_eq!(frame.message_type(), MessageType::from_u16(boundary.msg_type));
        },
        Err(ProtocolError::InvalidMagic { .. }) => assert!(!magic_valid),
        Err(ProtocolError::PayloadTooLarge { .. }) => {
            assert!(magic_valid);
            assert!(payload_size > MAX_PAYLOAD_SIZE);
        },
        Err(ProtocolError::FrameTruncated { .. }) => {
            assert!(magic_valid);
            assert!(!complete);
        },
        Err(other) => unreachable!("unexpected header error: {other}"),
    }

    if let Some(msg_type) = MessageType::from_u16(boundary.msg_type) {
        let payload = vec![0xAA; body_len.min(1000)];
        let frame = Frame::with_type(msg_type, payload);
        let encoded = frame.to_bytes().expect("small payload encodes");
        assert_eq!(encoded.len(), FrameHeader::SIZE + frame.payload.len());

        let decoded = Frame::decode(&encoded).expect("encoded frame decodes");
        assert_eq!(decoded.message_type(), Some(msg_type));
        assert_eq!(decoded.payload, frame.payload);
    }
});
