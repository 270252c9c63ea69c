//! Application layer for imlink
//!
//! Turns inbound frames into client-visible state and user intent into
//! outbound frames. The reconciliation logic is a pure state machine so the
//! same code runs against a real socket and against in-memory test doubles.
//!
//! # Components
//!
//! - [`Store`]: observable state slots (`tokio::sync::watch` per slot)
//! - [`Engine`]: per-message-type reconciliation, returns [`EngineAction`]s
//! - [`ChatClient`]: async operations (login, send, friends, groups)
//! - [`Runtime`]: dispatch loop feeding inbound frames through the engine
//! - [`Transport`] / [`Notifier`]: seams to the connection and to the user

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod client;
mod config;
mod engine;
mod error;
mod notifier;
mod runtime;
mod store;
mod transport;

pub use action::{EngineAction, IncomingNotice};
pub use client::ChatClient;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::AppError;
pub use notifier::{LogNotifier, Notifier};
pub use runtime::Runtime;
pub use store::{CurrentUser, Slot, Store};
pub use transport::Transport;
