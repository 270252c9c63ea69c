//! Side effects requested by the reconciliation engine.

use imlink_proto::Payload;

/// Something the [`crate::Engine`] wants done after handling a frame.
///
/// The engine only mutates the [`crate::Store`]; anything that touches the
/// network or the user goes through an action executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    /// Send a follow-up request (list refreshes).
    Send(Payload),

    /// Drop the connection (session rejected by the server).
    Disconnect,

    /// Tell the user about an incoming message.
    Notify(IncomingNotice),
}

/// An incoming single-chat message worth surfacing to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingNotice {
    /// Author's user id
    pub from_user_id: String,
    /// Author's display name
    pub from_username: String,
    /// Message text
    pub content: String,
}
