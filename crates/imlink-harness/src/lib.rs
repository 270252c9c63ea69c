//! Test support for imlink.
//!
//! - [`MockServer`]: a real TCP listener on loopback that speaks the imlink
//!   framing, records what clients send and replies on cue.
//! - [`RecordingTransport`]: in-memory [`imlink_app::Transport`] that keeps
//!   every outbound frame.
//! - [`RecordingNotifier`]: [`imlink_app::Notifier`] that keeps every
//!   notification.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod mock_server;
pub mod recording;

pub use mock_server::MockServer;
pub use recording::{Notification, RecordingNotifier, RecordingTransport};
