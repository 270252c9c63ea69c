//! Fuzz target for inbound frame dispatch
//!
//! Sequences of arbitrary frames, valid JSON or not, are applied to one
//! store with a moving clock.
//!
//! # Invariants
//!
//! - Dispatch never panics, whatever the body or message type
//! - Unread counts stay empty until some user has logged in
//! - The unread total equals the sum of per-user counts

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use imlink_app::{Engine, EngineConfig, Store};
use imlink_proto::{Frame, FrameHeader, MessageType};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Inbound {
    code: Code,
    body: Vec<u8>,
    advance_ms: u16,
}

#[derive(Debug, Clone, Arbitrary)]
enum Code {
    Registered(u8),
    Raw(u16),
}

fuzz_target!(|frames: Vec<Inbound>| {
    let store = Store::new();
    let mut engine = Engine::new(EngineConfig::default());
    let mut now = Instant::now();
    let mut ever_logged_in = false;

    for inbound in frames {
        now += Duration::from_millis(u64::from(inbound.advance_ms));
        let frame = match inbound.code {
            Code::Registered(i) => {
                Frame::with_type(MessageType::ALL[i as usize % MessageType::ALL.len()], inbound.body)
            },
            Code::Raw(code) => Frame::new(FrameHeader::with_raw_type(code), inbound.body),
        };

        let _ = engine.handle(&store, &frame, now);

        ever_logged_in |= store.is_logged_in();

        let unread = store.unread_counts.get();
        if !ever_logged_in {
            assert!(unread.is_empty());
        }
        assert_eq!(store.total_unread(), unread.values().sum::<u32>());
    }
});
