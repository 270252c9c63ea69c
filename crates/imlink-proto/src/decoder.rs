//! Streaming frame decoder.
//!
//! TCP delivers an undelimited byte stream. [`FrameDecoder`] accumulates reads
//! in a [`BytesMut`] and slices out every complete frame as it becomes
//! available. Payloads are split off the buffer without copying.

use bytes::{Buf, BytesMut};

use crate::{Frame, FrameHeader};

/// Incremental decoder for one connection's byte stream.
///
/// # Invariants
///
/// - Frames are emitted in exactly the order their bytes arrived.
/// - An incomplete frame is never consumed: the buffer keeps its bytes until
///   the rest arrives.
/// - A position whose header is not a valid frame start (wrong magic, or a
///   length above [`FrameHeader::MAX_PAYLOAD_SIZE`]) is discarded one byte at
///   a time. The buffer therefore never waits on a length it would refuse.
///
/// One decoder belongs to one connection. Call [`FrameDecoder::clear`] when
/// the connection goes away so stale bytes never prefix the next session.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
    skipped: u64,
}

impl FrameDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes and return every frame now complete.
    pub fn add_data(&mut self, data: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame() {
            frames.push(frame);
        }
        frames
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes waiting for the rest of a frame.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes discarded while resynchronizing, for diagnostics.
    #[must_use]
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    fn next_frame(&mut self) -> Option<Frame> {
        loop {
            if self.buffer.len() < FrameHeader::SIZE {
                return None;
            }

            let header = match FrameHeader::from_bytes(&self.buffer) {
                Ok(header) => *header,
                Err(_) => {
                    // Bad magic or impossible length: not a frame start.
                    self.buffer.advance(1);
                    self.skipped += 1;
                    continue;
                },
            };

            let total = FrameHeader::SIZE + header.payload_size() as usize;
            if self.buffer.len() < total {
                return None;
            }

            let mut raw = self.buffer.split_to(total);
            let payload = raw.split_off(FrameHeader::SIZE).freeze();
            return Some(Frame { header, payload });
        }
    }
}
