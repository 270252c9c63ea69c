//! Chat message payloads.
//!
//! Single and group messages share `SEND_MESSAGE` and `RECEIVE_MESSAGE`; the
//! `conversation_type` field tells them apart.

use serde::{Deserialize, Serialize};

/// Which kind of conversation a message belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationType {
    /// One-to-one chat
    #[default]
    Single,
    /// Group chat
    Group,
}

/// A message as delivered by the server and as stored in history.
///
/// # Invariants
///
/// Two messages with the same `(from_user_id, content)` whose timestamps are
/// less than five seconds apart are treated as the same message. This is how
/// the server echo of a locally appended message is recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author's user id
    pub from_user_id: String,
    /// Author's username
    pub from_username: String,
    /// Message text
    pub content: String,
    /// Content kind, `"text"` for everything this client sends
    #[serde(default = "default_message_type")]
    pub message_type: String,
    /// Unix time in seconds
    pub timestamp: i64,
    /// Single or group; absent or null means single
    #[serde(default, deserialize_with = "null_as_single")]
    pub conversation_type: ConversationType,
    /// Target group for group messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Recipient for single-chat messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<String>,
}

impl ChatMessage {
    /// Whether this message belongs to a group conversation.
    pub fn is_group(&self) -> bool {
        self.conversation_type == ConversationType::Group
    }
}

/// Body of `SEND_MESSAGE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Present only for group messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_type: Option<ConversationType>,
    /// Target group for group messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Recipient for single-chat messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<String>,
    /// Message text
    pub content: String,
    /// Content kind
    pub message_type: String,
}

impl SendMessageRequest {
    /// Text message to one user.
    pub fn single(to_user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_type: None,
            group_id: None,
            to_user_id: Some(to_user_id.into()),
            content: content.into(),
            message_type: default_message_type(),
        }
    }

    /// Text message to a group.
    pub fn group(group_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_type: Some(ConversationType::Group),
            group_id: Some(group_id.into()),
            to_user_id: None,
            content: content.into(),
            message_type: default_message_type(),
        }
    }
}

fn default_message_type() -> String {
    "text".to_owned()
}

fn null_as_single<'de, D>(deserializer: D) -> Result<ConversationType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<ConversationType>::deserialize(deserializer)?.unwrap_or_default())
}
