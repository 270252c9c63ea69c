//! In-memory test doubles for the application seams.

use std::{
    future::{Future, ready},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use imlink_app::{Notifier, Transport};
use imlink_proto::{Frame, MessageType, Payload};
use tokio::sync::watch;

struct TransportState {
    sent: Mutex<Vec<Frame>>,
    failing: AtomicBool,
    refuse_connect: AtomicBool,
    connected: watch::Sender<bool>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

/// [`Transport`] that records outbound frames instead of writing them.
///
/// Clones share state, so a test can keep one clone for inspection after
/// handing another to a `ChatClient`.
#[derive(Clone)]
pub struct RecordingTransport {
    state: Arc<TransportState>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    /// Disconnected transport that accepts every send.
    pub fn new() -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            state: Arc::new(TransportState {
                sent: Mutex::new(Vec::new()),
                failing: AtomicBool::new(false),
                refuse_connect: AtomicBool::new(false),
                connected,
                connects: AtomicUsize::new(0),
                disconnects: AtomicUsize::new(0),
            }),
        }
    }

    /// Make every subsequent send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::Release);
    }

    /// Make every subsequent connect fail (or succeed again).
    pub fn set_refuse_connect(&self, refuse: bool) {
        self.state.refuse_connect.store(refuse, Ordering::Release);
    }

    /// Force the connection signal, as if the link came up or dropped.
    pub fn set_connected(&self, connected: bool) {
        self.state.connected.send_if_modified(|current| {
            let changed = *current != connected;
            *current = connected;
            changed
        });
    }

    /// Every accepted send, in order.
    pub fn sent(&self) -> Vec<Frame> {
        lock(&self.state.sent).clone()
    }

    /// Message types of every accepted send, in order.
    pub fn sent_types(&self) -> Vec<MessageType> {
        lock(&self.state.sent).iter().filter_map(Frame::message_type).collect()
    }

    /// Decoded payloads of every accepted send, in order.
    pub fn sent_payloads(&self) -> Vec<Payload> {
        lock(&self.state.sent).iter().filter_map(|f| Payload::from_frame(f).ok()).collect()
    }

    /// Forget recorded sends.
    pub fn clear(&self) {
        lock(&self.state.sent).clear();
    }

    /// Number of `connect` calls.
    pub fn connect_calls(&self) -> usize {
        self.state.connects.load(Ordering::Acquire)
    }

    /// Number of `disconnect` calls.
    pub fn disconnect_calls(&self) -> usize {
        self.state.disconnects.load(Ordering::Acquire)
    }
}

impl Transport for RecordingTransport {
    fn connect(&self) -> impl Future<Output = bool> + Send {
        self.state.connects.fetch_add(1, Ordering::AcqRel);
        let ok = !self.state.refuse_connect.load(Ordering::Acquire);
        if ok {
            self.set_connected(true);
        }
        ready(ok)
    }

    fn disconnect(&self) -> impl Future<Output = ()> + Send {
        self.state.disconnects.fetch_add(1, Ordering::AcqRel);
        self.set_connected(false);
        ready(())
    }

    fn send(&self, msg_type: MessageType, payload: &[u8]) -> impl Future<Output = bool> + Send {
        let ok = !self.state.failing.load(Ordering::Acquire);
        if ok {
            lock(&self.state.sent).push(Frame::with_type(msg_type, payload.to_vec()));
        }
        ready(ok)
    }

    fn connection_state(&self) -> watch::Receiver<bool> {
        self.state.connected.subscribe()
    }
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Author's user id
    pub from_user_id: String,
    /// Author's display name
    pub from_username: String,
    /// Message text
    pub content: String,
}

/// [`Notifier`] that keeps every notification.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications so far, in order.
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.seen).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_message(&self, from_user_id: &str, from_username: &str, content: &str) {
        lock(&self.seen).push(Notification {
            from_user_id: from_user_id.to_owned(),
            from_username: from_username.to_owned(),
            content: content.to_owned(),
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
