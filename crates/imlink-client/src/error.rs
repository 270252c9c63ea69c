//! Error types for the connection manager.
//!
//! I/O failures are flattened into [`ClientError::Io`] with their
//! [`io::ErrorKind`] kept, so callers can tell an ordinary disconnect (peer
//! reset, broken pipe) from something that deserves attention.

use std::{io, time::Duration};

use thiserror::Error;

/// Errors from connecting to or talking with the server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No live socket.
    #[error("not connected")]
    NotConnected,

    /// Another `connect()` is already running.
    #[error("connect already in progress")]
    ConnectInProgress,

    /// TCP handshake did not finish in time.
    #[error("connect to {addr} timed out after {elapsed:?}")]
    ConnectTimeout {
        /// Target address
        addr: String,
        /// Configured bound
        elapsed: Duration,
    },

    /// Socket I/O failed.
    #[error("i/o error ({kind:?}): {message}")]
    Io {
        /// Kind of the underlying error
        kind: io::ErrorKind,
        /// Description of the underlying error
        message: String,
    },

    /// Frame could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] imlink_proto::ProtocolError),
}

impl ClientError {
    /// Returns true if this error just means the connection is gone.
    ///
    /// These are expected whenever the peer closes or the network drops and
    /// are logged below error level. Everything else is unexpected.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NotConnected | Self::ConnectTimeout { .. } => true,
            Self::Io { kind, .. } => is_disconnect_kind(*kind),
            Self::ConnectInProgress | Self::Protocol(_) => false,
        }
    }
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        Self::Io { kind: err.kind(), message: err.to_string() }
    }
}

/// I/O error kinds that mean "the connection is closed".
pub(crate) fn is_disconnect_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}
