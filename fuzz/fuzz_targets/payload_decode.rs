//! Fuzz target for Payload::decode
//!
//! Arbitrary bodies under every registered message type. Decoding must
//! return a structured error or a payload of the requested type, and any
//! payload that decodes must serialize again.

#![no_main]

use imlink_proto::{MessageType, Payload};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((selector, body)) = data.split_first() else {
        return;
    };
    let msg_type = MessageType::ALL[*selector as usize % MessageType::ALL.len()];

    if let Ok(payload) = Payload::decode(msg_type, body) {
        assert_eq!(payload.message_type(), msg_type);
        let json = payload.to_json().expect("decoded payload serializes");
        let again = Payload::decode(msg_type, &json).expect("serialized payload decodes");
        assert_eq!(again, payload);
    }
});
