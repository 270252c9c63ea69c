//! Scripted chat server on loopback TCP.
//!
//! `MockServer` accepts any number of client connections, decodes what they
//! send with the production [`FrameDecoder`], and records every frame. Tests
//! push frames to connected clients, register auto-responders keyed by
//! message type, or close the server side of every connection.
//!
//! This server is designed for test-driven usage: it has no protocol logic of
//! its own beyond what responders script.

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use imlink_client::ClientConfig;
use imlink_proto::{Frame, FrameDecoder, MessageType, Payload};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::{Notify, mpsc},
    task::JoinHandle,
    time::timeout,
};

type Responder = Arc<dyn Fn(&Frame) -> Vec<Payload> + Send + Sync>;

/// Instruction for a connection's writer task.
enum Outbound {
    Bytes(Bytes),
    Close,
}

struct Shared {
    accepted: AtomicUsize,
    received: Mutex<Vec<Frame>>,
    peers: Mutex<Vec<mpsc::UnboundedSender<Outbound>>>,
    responders: Mutex<Vec<(MessageType, Responder)>>,
    /// Signalled on every accept and every recorded frame
    changed: Notify,
}

/// Loopback TCP server speaking imlink framing.
pub struct MockServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
    accept_task: JoinHandle<()>,
}

impl MockServer {
    /// Bind `127.0.0.1:0` and start accepting.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let shared = Arc::new(Shared {
            accepted: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            peers: Mutex::new(Vec::new()),
            responders: Mutex::new(Vec::new()),
            changed: Notify::new(),
        });

        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&shared)));
        tracing::debug!(%addr, "mock server listening");

        Ok(Self { addr, shared, accept_task })
    }

    /// Bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Client settings pointing at this server.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.addr.ip().to_string(), self.addr.port())
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.shared.accepted.load(Ordering::Acquire)
    }

    /// Connections whose writer is still running.
    pub fn open_connections(&self) -> usize {
        let mut peers = lock(&self.shared.peers);
        peers.retain(|peer| !peer.is_closed());
        peers.len()
    }

    /// Every frame received from any client, in arrival order.
    pub fn received(&self) -> Vec<Frame> {
        lock(&self.shared.received).clone()
    }

    /// Received frames of one type, decoded. Frames that fail to decode are
    /// skipped.
    pub fn received_payloads(&self, msg_type: MessageType) -> Vec<Payload> {
        lock(&self.shared.received)
            .iter()
            .filter(|frame| frame.message_type() == Some(msg_type))
            .filter_map(|frame| Payload::from_frame(frame).ok())
            .collect()
    }

    /// Wait for the first frame of the given type.
    pub async fn wait_for(&self, msg_type: MessageType, within: Duration) -> Option<Frame> {
        self.wait_until(within, |shared| {
            lock(&shared.received).iter().find(|f| f.message_type() == Some(msg_type)).cloned()
        })
        .await
    }

    /// Wait until at least `count` frames of the given type have arrived.
    pub async fn wait_for_count(
        &self,
        msg_type: MessageType,
        count: usize,
        within: Duration,
    ) -> Option<Vec<Frame>> {
        self.wait_until(within, |shared| {
            let matching: Vec<Frame> = lock(&shared.received)
                .iter()
                .filter(|f| f.message_type() == Some(msg_type))
                .cloned()
                .collect();
            (matching.len() >= count).then_some(matching)
        })
        .await
    }

    /// Wait until at least `count` connections have been accepted.
    pub async fn wait_for_accepts(&self, count: usize, within: Duration) -> bool {
        self.wait_until(within, |shared| {
            (shared.accepted.load(Ordering::Acquire) >= count).then_some(())
        })
        .await
        .is_some()
    }

    /// Reply to every received frame of `msg_type` with the payloads `reply`
    /// returns, on the same connection.
    pub fn respond_with<F>(&self, msg_type: MessageType, reply: F)
    where
        F: Fn(&Frame) -> Vec<Payload> + Send + Sync + 'static,
    {
        lock(&self.shared.responders).push((msg_type, Arc::new(reply)));
    }

    /// Send a payload to every connected client. Returns how many were
    /// reached.
    pub fn push(&self, payload: Payload) -> imlink_proto::Result<usize> {
        let bytes = payload.into_frame()?.to_bytes()?;
        Ok(self.push_bytes(bytes))
    }

    /// Send raw bytes to every connected client, framed or not.
    pub fn push_bytes(&self, bytes: impl Into<Bytes>) -> usize {
        let bytes = bytes.into();
        let mut peers = lock(&self.shared.peers);
        peers.retain(|peer| peer.send(Outbound::Bytes(bytes.clone())).is_ok());
        peers.len()
    }

    /// Close the server side of every connection.
    pub fn close_clients(&self) {
        for peer in lock(&self.shared.peers).drain(..) {
            let _ = peer.send(Outbound::Close);
        }
    }

    async fn wait_until<R>(
        &self,
        within: Duration,
        mut check: impl FnMut(&Shared) -> Option<R>,
    ) -> Option<R> {
        timeout(within, async {
            loop {
                let notified = self.shared.changed.notified();
                if let Some(found) = check(self.shared.as_ref()) {
                    return found;
                }
                notified.await;
            }
        })
        .await
        .ok()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        self.close_clients();
    }
}

impl Shared {
    /// Record a frame, then run matching responders.
    fn record(&self, frame: Frame, reply: &mpsc::UnboundedSender<Outbound>) {
        let msg_type = frame.message_type();
        let responders: Vec<Responder> = lock(&self.responders)
            .iter()
            .filter(|(ty, _)| Some(*ty) == msg_type)
            .map(|(_, responder)| Arc::clone(responder))
            .collect();

        lock(&self.received).push(frame.clone());
        self.changed.notify_waiters();

        for responder in responders {
            for payload in responder(&frame) {
                match payload.into_frame().and_then(|f| f.to_bytes()) {
                    Ok(bytes) => {
                        let _ = reply.send(Outbound::Bytes(bytes));
                    },
                    Err(e) => tracing::warn!(error = %e, "mock responder produced bad payload"),
                }
            }
        }
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::debug!(%peer, "mock server accepted connection");
                let (tx, rx) = mpsc::unbounded_channel();
                lock(&shared.peers).push(tx.clone());
                shared.accepted.fetch_add(1, Ordering::AcqRel);
                shared.changed.notify_waiters();
                tokio::spawn(serve_connection(Arc::clone(&shared), stream, tx, rx));
            },
            Err(e) => {
                tracing::warn!(error = %e, "mock server accept failed");
                break;
            },
        }
    }
}

async fn serve_connection(
    shared: Arc<Shared>,
    stream: TcpStream,
    tx: mpsc::UnboundedSender<Outbound>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
) {
    let (mut reader, mut writer) = stream.into_split();

    let write_task = tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            match out {
                Outbound::Bytes(bytes) => {
                    if writer.write_all(&bytes).await.is_err() {
                        break;
                    }
                },
                Outbound::Close => break,
            }
        }
        let _ = writer.shutdown().await;
    });

    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                for frame in decoder.add_data(&buf[..n]) {
                    shared.record(frame, &tx);
                }
            },
        }
    }

    let _ = tx.send(Outbound::Close);
    let _ = write_task.await;
    tracing::debug!("mock server connection closed");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
