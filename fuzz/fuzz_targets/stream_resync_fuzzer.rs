//! Fuzz target for the streaming decoder
//!
//! Valid frames are interleaved with garbage and the resulting stream is
//! delivered in arbitrary chunk sizes.
//!
//! # Invariants
//!
//! - Chunking never changes the output: feeding the stream in pieces yields
//!   the same frames as feeding it whole
//! - Garbage without an embedded magic never hides a following valid frame
//! - Buffered bytes never exceed what was fed minus what was consumed

#![no_main]

use arbitrary::Arbitrary;
use imlink_proto::{FrameDecoder, FrameHeader, MessageType, encode};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Segment {
    Frame { code_index: u8, payload: Vec<u8> },
    Garbage(Vec<u8>),
}

#[derive(Debug, Clone, Arbitrary)]
struct Stream {
    segments: Vec<Segment>,
    chunks: Vec<u8>,
}

fuzz_target!(|input: Stream| {
    let mut bytes = Vec::new();
    let mut sent = Vec::new();

    for segment in &input.segments {
        match segment {
            Segment::Frame { code_index, payload } => {
                let msg_type = MessageType::ALL[*code_index as usize % MessageType::ALL.len()];
                let encoded = encode(msg_type, payload).expect("small payload encodes");
                bytes.extend_from_slice(&encoded);
                sent.push((msg_type, payload.clone()));
            },
            Segment::Garbage(garbage) => {
                // Garbage is dropped only if it holds no byte of the magic,
                // so it can never start a bogus frame.
                let magic = FrameHeader::MAGIC.to_be_bytes();
                bytes.extend(garbage.iter().copied().filter(|b| !magic.contains(b)));
            },
        }
    }

    let mut whole = FrameDecoder::new();
    let expected = whole.add_data(&bytes);

    let mut chunked = FrameDecoder::new();
    let mut actual = Vec::new();
    let mut rest = bytes.as_slice();
    for size in input.chunks.iter().map(|c| *c as usize + 1) {
        let (chunk, tail) = rest.split_at(size.min(rest.len()));
        actual.extend(chunked.add_data(chunk));
        rest = tail;
        assert!(chunked.buffered_len() <= bytes.len());
    }
    actual.extend(chunked.add_data(rest));

    assert_eq!(actual, expected);
    assert_eq!(chunked.buffered_len(), whole.buffered_len());

    let received: Vec<_> = actual
        .iter()
        .map(|frame| (frame.message_type().expect("registered type"), frame.payload.to_vec()))
        .collect();
    assert_eq!(received, sent);
});
