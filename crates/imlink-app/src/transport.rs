//! Transport trait for abstracting the server connection.
//!
//! The [`Transport`] trait decouples [`crate::ChatClient`] and
//! [`crate::Runtime`] from the socket. Production uses
//! [`imlink_client::ConnectionManager`]; tests use an in-memory recorder.

use std::future::Future;

use imlink_client::ConnectionManager;
use imlink_proto::MessageType;
use tokio::sync::watch;

/// A framed, connection-oriented link to the chat server.
///
/// Methods take `&self`: one transport is shared by the client facade and
/// the dispatch loop.
pub trait Transport: Send + Sync + 'static {
    /// Establish the connection if needed.
    ///
    /// Returns `true` when connected afterwards.
    fn connect(&self) -> impl Future<Output = bool> + Send;

    /// Close the connection. No-op when already closed.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;

    /// Write one frame. Returns `true` if the write was accepted.
    fn send(&self, msg_type: MessageType, payload: &[u8]) -> impl Future<Output = bool> + Send;

    /// Follow connected/disconnected transitions.
    fn connection_state(&self) -> watch::Receiver<bool>;
}

impl Transport for ConnectionManager {
    fn connect(&self) -> impl Future<Output = bool> + Send {
        ConnectionManager::connect(self)
    }

    fn disconnect(&self) -> impl Future<Output = ()> + Send {
        ConnectionManager::disconnect(self)
    }

    fn send(&self, msg_type: MessageType, payload: &[u8]) -> impl Future<Output = bool> + Send {
        self.send_message(msg_type, payload)
    }

    fn connection_state(&self) -> watch::Receiver<bool> {
        ConnectionManager::connection_state(self)
    }
}
