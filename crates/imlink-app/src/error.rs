//! Application layer errors.

use imlink_proto::{MessageType, ProtocolError};
use thiserror::Error;

/// Errors raised while interpreting or producing payloads.
///
/// None of these stop the dispatch loop; they are logged and the offending
/// frame or operation is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Frame carried a type code outside the registry.
    #[error("unknown message type 0x{0:04X}")]
    UnknownMessageType(u16),

    /// Frame body did not match its type's schema.
    #[error("malformed {message_type} payload: {reason}")]
    Malformed {
        /// Registry name of the frame's type
        message_type: &'static str,
        /// Decoder diagnostic
        reason: String,
    },

    /// Outbound payload could not be serialized.
    #[error("failed to encode {0}: {1}")]
    Encode(MessageType, String),

    /// Transport refused or failed the write.
    #[error("failed to send {0}")]
    SendFailed(MessageType),
}

impl AppError {
    /// Returns true if retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SendFailed(_))
    }
}

impl From<ProtocolError> for AppError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownMessageType(code) => Self::UnknownMessageType(code),
            ProtocolError::InvalidPayload { message_type, reason } => {
                Self::Malformed { message_type, reason }
            },
            other => Self::Malformed { message_type: "frame", reason: other.to_string() },
        }
    }
}
