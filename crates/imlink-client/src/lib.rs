//! Connection management for imlink.
//!
//! [`ConnectionManager`] owns the single TCP session to the chat server: it
//! connects, keeps the link alive with heartbeats, decodes inbound bytes into
//! frames, and tears everything down when either side goes away. Decoded
//! frames are delivered in arrival order on an unbounded channel; connection
//! up/down transitions are published on a [`tokio::sync::watch`] channel.
//!
//! The manager knows nothing about what the frames mean. Interpreting them is
//! the job of the application layer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod connection;
mod error;
mod socket;

pub use config::{ClientConfig, DEFAULT_PORT};
pub use connection::{ConnectionManager, ConnectionState, InboundFrames};
pub use error::ClientError;
