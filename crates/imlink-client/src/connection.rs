//! Connection lifecycle: connect, receive, heartbeat, disconnect.
//!
//! A connection is one TCP socket plus exactly two background tasks: a
//! receive loop that turns bytes into frames, and a heartbeat loop. Both
//! watch a per-connection shutdown signal. Every connection gets a
//! generation number so a receive loop that outlives its socket can never
//! tear down a newer one.
//!
//! # State machine
//!
//! ```text
//! Idle ──connect()──► Connecting ──ok──► Connected ──disconnect()/EOF──► Disconnecting ──► Idle
//!                          │
//!                          └──error──► Idle
//! ```

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use imlink_proto::{Frame, FrameDecoder, MessageType, Payload, payloads::session::Heartbeat};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, mpsc, watch},
    task::JoinHandle,
    time::timeout,
};

use crate::{ClientConfig, ClientError, error::is_disconnect_kind, socket};

/// Receiving end of the decoded-frame channel.
pub type InboundFrames = mpsc::UnboundedReceiver<Frame>;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket.
    Idle,
    /// TCP handshake in progress.
    Connecting,
    /// Socket established, tasks running.
    Connected,
    /// Tearing down socket and tasks.
    Disconnecting,
}

type SharedWriter = Arc<Mutex<Option<OwnedWriteHalf>>>;

/// Everything owned by one established connection.
struct LiveConnection {
    generation: u64,
    writer: SharedWriter,
    shutdown_tx: watch::Sender<bool>,
    receive: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

struct Inner {
    config: ClientConfig,
    live: Mutex<Option<LiveConnection>>,
    connecting: AtomicBool,
    generation: AtomicU64,
    tasks: AtomicUsize,
    state_tx: watch::Sender<ConnectionState>,
    connected_tx: watch::Sender<bool>,
    inbound_tx: mpsc::UnboundedSender<Frame>,
}

/// Handle to the single server connection.
///
/// Cheap to clone; all clones share one socket.
///
/// # Invariants
///
/// - At most one socket, one receive task and one heartbeat task exist at any
///   time, regardless of how many `connect()` calls race.
/// - Frames are delivered on the inbound channel in byte-stream order.
/// - The connected signal only fires on an actual transition, so observers
///   see one "down" per lost connection.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("addr", &self.inner.config.addr())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create an idle manager and the channel its frames arrive on.
    pub fn new(config: ClientConfig) -> (Self, InboundFrames) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        let (connected_tx, _) = watch::channel(false);

        let inner = Inner {
            config,
            live: Mutex::new(None),
            connecting: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            tasks: AtomicUsize::new(0),
            state_tx,
            connected_tx,
            inbound_tx,
        };

        (Self { inner: Arc::new(inner) }, inbound_rx)
    }

    /// Connect if not already connected.
    ///
    /// Returns `true` when a connection is (or already was) established and
    /// `false` when the attempt failed or another attempt is in flight.
    pub async fn connect(&self) -> bool {
        match self.try_connect().await {
            Ok(()) => true,
            Err(ClientError::ConnectInProgress) => {
                tracing::warn!("connect() already in progress, skipping");
                false
            },
            Err(e) => {
                tracing::warn!(addr = %self.inner.config.addr(), error = %e, "connect failed");
                false
            },
        }
    }

    /// Connect, reporting why an attempt did not succeed.
    ///
    /// # Errors
    ///
    /// - `ClientError::ConnectInProgress` if another attempt is running
    /// - `ClientError::ConnectTimeout` if the handshake exceeded the bound
    /// - `ClientError::Io` if the socket could not be opened or configured
    pub async fn try_connect(&self) -> Result<(), ClientError> {
        let inner = &self.inner;

        let stale = {
            let mut live = inner.live.lock().await;
            if let Some(conn) = live.as_ref()
                && !conn.receive.is_finished()
            {
                tracing::debug!(generation = conn.generation, "already connected");
                return Ok(());
            }
            if inner.connecting.swap(true, Ordering::AcqRel) {
                return Err(ClientError::ConnectInProgress);
            }
            live.take()
        };
        let _connecting = ConnectingGuard(&inner.connecting);

        if let Some(conn) = stale {
            tracing::debug!(generation = conn.generation, "cleaning up stale connection");
            inner.close(conn, false).await;
        }

        inner.state_tx.send_replace(ConnectionState::Connecting);
        let addr = inner.config.addr();
        tracing::info!(%addr, "connecting");

        let connect = TcpStream::connect((inner.config.host.as_str(), inner.config.port));
        let stream = match timeout(inner.config.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(inner.connect_failed(e.into())),
            Err(_) => {
                let err = ClientError::ConnectTimeout { addr, elapsed: inner.config.connect_timeout };
                return Err(inner.connect_failed(err));
            },
        };

        if let Err(e) = socket::configure_stream(&stream, &inner.config) {
            return Err(inner.connect_failed(e.into()));
        }

        let (reader, writer) = stream.into_split();
        let generation = inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Spawn under the lock so an immediately exiting receive loop waits
        // until this connection is installed before tearing it down.
        let mut live = inner.live.lock().await;
        let receive =
            tokio::spawn(receive_loop(Arc::clone(inner), generation, reader, shutdown_rx.clone()));
        let heartbeat = tokio::spawn(heartbeat_loop(self.clone(), shutdown_rx));
        *live = Some(LiveConnection {
            generation,
            writer: Arc::new(Mutex::new(Some(writer))),
            shutdown_tx,
            receive,
            heartbeat,
        });
        inner.state_tx.send_replace(ConnectionState::Connected);
        inner.set_connected(true);
        drop(live);

        tracing::info!(%addr, generation, "connected");
        Ok(())
    }

    /// Close the connection and stop its tasks.
    ///
    /// Does nothing when there is no connection. Emits one connection-down
    /// notification otherwise.
    pub async fn disconnect(&self) {
        let conn = self.inner.live.lock().await.take();
        match conn {
            Some(conn) => {
                tracing::info!(generation = conn.generation, "disconnecting");
                self.inner.close(conn, true).await;
            },
            None => tracing::trace!("disconnect: no connection"),
        }
    }

    /// Encode and write one frame.
    ///
    /// # Errors
    ///
    /// - `ClientError::NotConnected` if there is no live socket
    /// - `ClientError::Protocol` if the payload exceeds the frame limit
    /// - `ClientError::Io` if the write fails
    pub async fn send(&self, msg_type: MessageType, payload: &[u8]) -> Result<(), ClientError> {
        let writer = {
            let live = self.inner.live.lock().await;
            live.as_ref().map(|conn| Arc::clone(&conn.writer))
        }
        .ok_or(ClientError::NotConnected)?;

        let bytes = imlink_proto::encode(msg_type, payload)?;

        let mut guard = writer.lock().await;
        let stream = guard.as_mut().ok_or(ClientError::NotConnected)?;
        stream.write_all(&bytes).await?;
        stream.flush().await?;

        tracing::debug!(%msg_type, len = bytes.len(), "frame sent");
        Ok(())
    }

    /// Like [`ConnectionManager::send`], logging the failure instead of
    /// returning it.
    ///
    /// Closed-connection failures are logged at warn level, anything else at
    /// error level.
    pub async fn send_message(&self, msg_type: MessageType, payload: &[u8]) -> bool {
        match self.send(msg_type, payload).await {
            Ok(()) => true,
            Err(e) if e.is_transient() => {
                tracing::warn!(%msg_type, error = %e, "send failed: connection closed");
                false
            },
            Err(e) => {
                tracing::error!(%msg_type, error = %e, "send failed");
                false
            },
        }
    }

    /// Whether a connection is currently established.
    pub fn is_connected(&self) -> bool {
        *self.inner.connected_tx.borrow()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to connected/disconnected transitions.
    pub fn connection_state(&self) -> watch::Receiver<bool> {
        self.inner.connected_tx.subscribe()
    }

    /// Subscribe to every lifecycle state change.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Number of background tasks currently running (receive + heartbeat).
    pub fn task_count(&self) -> usize {
        self.inner.tasks.load(Ordering::Acquire)
    }

    /// Configuration this manager was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

impl Inner {
    /// Stop tasks and close the socket of a connection already removed from
    /// `live`.
    async fn close(&self, conn: LiveConnection, notify: bool) {
        self.state_tx.send_replace(ConnectionState::Disconnecting);

        // Advisory: tasks exit at their next select point.
        let _ = conn.shutdown_tx.send(true);
        conn.heartbeat.abort();

        if let Some(mut writer) = conn.writer.lock().await.take()
            && let Err(e) = writer.shutdown().await
        {
            tracing::debug!(error = %e, "socket shutdown failed");
        }

        self.state_tx.send_replace(ConnectionState::Idle);
        if notify {
            self.set_connected(false);
        }
        tracing::debug!(generation = conn.generation, "connection closed");
    }

    /// Close the connection only if it is still the given generation.
    async fn close_generation(&self, generation: u64) {
        let conn = {
            let mut live = self.live.lock().await;
            match live.as_ref() {
                Some(conn) if conn.generation == generation => live.take(),
                _ => None,
            }
        };

        if let Some(conn) = conn {
            self.close(conn, true).await;
        }
    }

    fn connect_failed(&self, err: ClientError) -> ClientError {
        self.state_tx.send_replace(ConnectionState::Idle);
        self.set_connected(false);
        err
    }

    /// Publish a connected flag, notifying only on change.
    fn set_connected(&self, connected: bool) {
        self.connected_tx.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
    }
}

/// Read, decode and forward frames until the socket closes or shutdown is
/// signalled. Always tears down its own connection on exit.
async fn receive_loop(
    inner: Arc<Inner>,
    generation: u64,
    mut reader: OwnedReadHalf,
    mut shutdown: watch::Receiver<bool>,
) {
    let _task = TaskGuard::enter(&inner.tasks);
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; inner.config.read_buffer_size.max(1)];

    tracing::debug!(generation, "receive loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let read = tokio::select! {
            _ = shutdown.changed() => break,
            read = timeout(inner.config.read_timeout, reader.read(&mut buf)) => read,
        };

        match read {
            Err(_) => {
                tracing::trace!(generation, "read timed out, connection idle");
            },
            Ok(Ok(0)) => {
                tracing::info!(generation, "server closed the connection");
                break;
            },
            Ok(Ok(n)) => {
                for frame in decoder.add_data(&buf[..n]) {
                    tracing::debug!(
                        msg_type = frame.header.msg_type(),
                        len = frame.payload.len(),
                        "frame received"
                    );
                    if inner.inbound_tx.send(frame).is_err() {
                        tracing::trace!("inbound receiver dropped, discarding frame");
                    }
                }
            },
            Ok(Err(e)) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {},
            Ok(Err(e)) if is_disconnect_kind(e.kind()) => {
                tracing::debug!(generation, error = %e, "connection closed");
                break;
            },
            Ok(Err(e)) => {
                tracing::error!(generation, error = %e, "read failed");
                break;
            },
        }
    }

    if decoder.buffered_len() > 0 {
        tracing::debug!(bytes = decoder.buffered_len(), "discarding partial frame");
    }

    inner.close_generation(generation).await;
    tracing::debug!(generation, "receive loop exited");
}

/// Send a heartbeat after the initial delay, then once per interval.
async fn heartbeat_loop(manager: ConnectionManager, mut shutdown: watch::Receiver<bool>) {
    let _task = TaskGuard::enter(&manager.inner.tasks);
    let mut wait = manager.inner.config.heartbeat_initial_delay;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(wait) => {},
        }

        let heartbeat = Payload::Heartbeat(Heartbeat { timestamp: unix_time_secs() });
        match heartbeat.to_json() {
            Ok(body) => {
                if manager.send_message(MessageType::Heartbeat, &body).await {
                    tracing::trace!("heartbeat sent");
                }
            },
            Err(e) => tracing::error!(error = %e, "heartbeat encode failed"),
        }

        wait = manager.inner.config.heartbeat_interval;
    }
}

fn unix_time_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs() as i64)
}

/// Clears the in-flight flag on every exit path of `try_connect`.
struct ConnectingGuard<'a>(&'a AtomicBool);

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Counts a running background task; decrements when the task ends or is
/// aborted.
struct TaskGuard<'a>(&'a AtomicUsize);

impl<'a> TaskGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_idle() {
        let (manager, _rx) = ConnectionManager::new(ClientConfig::default());
        assert_eq!(manager.state(), ConnectionState::Idle);
        assert!(!manager.is_connected());
        assert_eq!(manager.task_count(), 0);
    }

    #[tokio::test]
    async fn send_without_connection() {
        let (manager, _rx) = ConnectionManager::new(ClientConfig::default());
        assert_eq!(
            manager.send(MessageType::LoginRequest, b"{}").await,
            Err(ClientError::NotConnected)
        );
        assert!(!manager.send_message(MessageType::LoginRequest, b"{}").await);
    }

    #[tokio::test]
    async fn disconnect_when_idle_is_silent() {
        let (manager, _rx) = ConnectionManager::new(ClientConfig::default());
        let signal = manager.connection_state();
        manager.disconnect().await;
        assert!(!signal.has_changed().unwrap());
    }

    #[tokio::test]
    async fn connect_refused_reports_false() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let (manager, _rx) = ConnectionManager::new(ClientConfig::new("127.0.0.1", port));
        assert!(!manager.connect().await);
        assert_eq!(manager.state(), ConnectionState::Idle);
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn in_flight_connect_rejects_without_dialing() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (manager, _rx) = ConnectionManager::new(ClientConfig::new("127.0.0.1", port));

        manager.inner.connecting.store(true, Ordering::Release);
        assert_eq!(manager.try_connect().await, Err(ClientError::ConnectInProgress));
        assert!(!manager.connect().await);

        // Flag untouched: the rejected call does not own it
        assert!(manager.inner.connecting.load(Ordering::Acquire));
        let accepted = timeout(std::time::Duration::from_millis(50), listener.accept()).await;
        assert!(accepted.is_err());
        assert_eq!(manager.state(), ConnectionState::Idle);
    }

    #[test]
    fn connecting_guard_clears_flag() {
        let flag = AtomicBool::new(true);
        {
            let _guard = ConnectingGuard(&flag);
        }
        assert!(!flag.load(Ordering::Acquire));
    }
}
