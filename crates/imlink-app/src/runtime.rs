//! Dispatch loop for inbound frames.
//!
//! The Runtime is the single consumer of the connection's frame channel:
//! - [`Engine`]: reconciles each frame into the [`crate::Store`]
//! - [`ChatClient`]: executes follow-up sends
//! - [`Transport`]: executes disconnects, mirrors the connection signal
//! - [`Notifier`]: surfaces incoming messages

use std::sync::Arc;

use imlink_proto::Frame;
use tokio::{
    sync::{mpsc, watch},
    time::Instant,
};

use crate::{ChatClient, Engine, EngineAction, EngineConfig, Notifier, Store, Transport};

/// Drives the [`Engine`] from a stream of frames.
///
/// # Type Parameters
///
/// - `T`: transport to the server
/// - `N`: notification sink
pub struct Runtime<T, N> {
    client: ChatClient<T, N>,
    engine: Engine<Instant>,
}

impl<T: Transport, N: Notifier> Runtime<T, N> {
    /// Create a runtime dispatching into `client`'s store.
    pub fn new(client: ChatClient<T, N>, config: EngineConfig) -> Self {
        Self { client, engine: Engine::new(config) }
    }

    /// Run until the frame channel closes.
    ///
    /// Frames are handled strictly in channel order, one at a time. A frame
    /// that fails to decode or apply is logged and skipped.
    pub async fn run(mut self, mut inbound: mpsc::UnboundedReceiver<Frame>) {
        let mirror = tokio::spawn(mirror_connection(
            self.client.transport().connection_state(),
            Arc::clone(self.client.store()),
        ));

        while let Some(frame) = inbound.recv().await {
            self.dispatch(&frame).await;
        }

        mirror.abort();
        tracing::info!("Inbound channel closed, dispatch loop exiting");
    }

    /// Handle one frame and execute the resulting actions.
    pub async fn dispatch(&mut self, frame: &Frame) {
        let actions = self.engine.handle(self.client.store(), frame, Instant::now());
        self.execute(actions).await;
    }

    async fn execute(&self, actions: Vec<EngineAction>) {
        for action in actions {
            match action {
                EngineAction::Send(payload) => {
                    if !self.client.send_payload(&payload).await {
                        tracing::warn!(msg_type = %payload.message_type(), "Follow-up request not sent");
                    }
                },
                EngineAction::Disconnect => self.client.disconnect().await,
                EngineAction::Notify(notice) => self.client.notifier().notify_message(
                    &notice.from_user_id,
                    &notice.from_username,
                    &notice.content,
                ),
            }
        }
    }

    /// The client this runtime feeds.
    pub fn client(&self) -> &ChatClient<T, N> {
        &self.client
    }
}

/// Copy transport connectivity into the store until the transport goes
/// away.
async fn mirror_connection(mut signal: watch::Receiver<bool>, store: Arc<Store>) {
    loop {
        let connected = *signal.borrow_and_update();
        store.connected.set(connected);
        if signal.changed().await.is_err() {
            break;
        }
    }
}
