//! Fuzz target for Frame::decode
//!
//! Arbitrary bytes fed to the one-shot decoder must never panic. Anything
//! that decodes must carry the IMIM magic, a length within the limit, and
//! re-encode to exactly the bytes it was read from.

#![no_main]

use imlink_proto::{Frame, FrameHeader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = Frame::decode(data) else {
        return;
    };

    assert_eq!(frame.header.magic(), FrameHeader::MAGIC);
    assert!(frame.header.payload_size() <= FrameHeader::MAX_PAYLOAD_SIZE);
    assert_eq!(frame.payload.len(), frame.header.payload_size() as usize);

    let encoded = frame.to_bytes().expect("decoded frame re-encodes");
    assert_eq!(encoded.as_ref(), &data[..encoded.len()]);
});
