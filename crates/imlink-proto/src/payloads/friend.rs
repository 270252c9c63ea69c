//! Friend relationship payloads.

use serde::{Deserialize, Serialize};

/// Ask another user, by username, to become a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendApplyRequest {
    /// Username of the user to befriend; the server resolves the id
    pub target_username: String,
    /// Optional greeting shown to the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    /// Optional remark for the new friend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// Result of a friend application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendApplyResponse {
    /// Whether the application was recorded
    pub success: bool,
    /// Server-assigned application id
    #[serde(default)]
    pub apply_id: Option<String>,
    /// Human-readable result
    #[serde(default)]
    pub message: Option<String>,
}

/// Short user description embedded in notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendUserBrief {
    /// User id
    pub user_id: String,
    /// Account name
    pub username: String,
    /// Display name
    #[serde(default)]
    pub nickname: Option<String>,
    /// Avatar location
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Incoming friend application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendApplyNotify {
    /// Application id used when accepting or rejecting
    pub apply_id: String,
    /// Who applied
    pub from_user: FriendUserBrief,
    /// Applicant's greeting
    #[serde(default)]
    pub greeting: Option<String>,
    /// Unix time in seconds
    #[serde(default)]
    pub created_at: i64,
}

/// Decision on a pending friend application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendHandleAction {
    /// Become friends
    Accept,
    /// Decline
    Reject,
}

impl FriendHandleAction {
    /// Wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

/// Accept or reject an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendHandleRequest {
    /// Application being handled
    pub apply_id: String,
    /// Decision
    pub action: FriendHandleAction,
    /// Optional remark for the new friend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// Result of handling an application; also the body of `FRIEND_HANDLE_NOTIFY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendHandleResponse {
    /// Whether the decision was applied
    pub success: bool,
    /// Echo of the decision
    #[serde(default)]
    pub action: Option<String>,
    /// The new friend, when accepted
    #[serde(default)]
    pub friend: Option<FriendInfo>,
}

/// A friend as shown in the friend list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendInfo {
    /// User id
    pub user_id: String,
    /// Account name
    pub username: String,
    /// Display name
    #[serde(default)]
    pub nickname: Option<String>,
    /// Avatar location
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Our remark for this friend
    #[serde(default)]
    pub remark: Option<String>,
    /// Friend grouping label
    #[serde(default)]
    pub group_name: Option<String>,
    /// Whether we blocked this friend
    #[serde(default)]
    pub is_blocked: bool,
    /// Presence flag
    #[serde(default)]
    pub online: bool,
}

/// Full friend list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendListResponse {
    /// Whether the list could be produced
    pub success: bool,
    /// Every friend of the current user
    #[serde(default)]
    pub friends: Vec<FriendInfo>,
}

/// Remove a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendDeleteRequest {
    /// Friend to remove
    pub friend_user_id: String,
}

/// Result of removing a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendDeleteResponse {
    /// Whether the friend was removed
    pub success: bool,
    /// Human-readable result
    #[serde(default)]
    pub message: Option<String>,
}

/// Block or unblock a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendBlockRequest {
    /// User to (un)block
    pub target_user_id: String,
    /// `true` to block, `false` to unblock
    pub block: bool,
}

/// Result of a block request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendBlockResponse {
    /// Whether the change was applied
    pub success: bool,
    /// Resulting block state
    #[serde(default)]
    pub block: bool,
}
