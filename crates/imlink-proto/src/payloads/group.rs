//! Group chat management payloads.

use serde::{Deserialize, Serialize};

/// Create a group with an initial member set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreateRequest {
    /// Display name
    pub group_name: String,
    /// Avatar location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Initial members besides the creator
    pub member_user_ids: Vec<String>,
}

/// Full group description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Group id
    pub group_id: String,
    /// Display name
    pub group_name: String,
    /// Owner's user id
    pub owner_id: String,
    /// Avatar location
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Pinned announcement
    #[serde(default)]
    pub announcement: Option<String>,
    /// Unix time in seconds
    #[serde(default)]
    pub created_at: i64,
}

/// Result of creating a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreateResponse {
    /// Whether the group was created
    pub success: bool,
    /// The new group
    #[serde(default)]
    pub group: Option<GroupInfo>,
    /// Failure code
    #[serde(default)]
    pub error_code: Option<i32>,
    /// Failure description
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One joined group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupListItem {
    /// Group id
    pub group_id: String,
    /// Display name
    pub group_name: String,
    /// Avatar location
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Our role: `owner`, `admin` or `member`
    #[serde(default)]
    pub role: String,
}

/// All groups the current user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupListResponse {
    /// Whether the list could be produced
    pub success: bool,
    /// Joined groups
    #[serde(default)]
    pub groups: Vec<GroupListItem>,
}

/// A member of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// User id
    pub user_id: String,
    /// Per-group display name
    #[serde(default)]
    pub nickname_in_group: Option<String>,
    /// `owner`, `admin` or `member`
    #[serde(default)]
    pub role: String,
    /// Avatar location
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Presence flag
    #[serde(default)]
    pub online: bool,
}

/// Request the member list of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMemberListRequest {
    /// Group to list
    pub group_id: String,
}

/// Member list of one group, optionally with its full description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMemberListResponse {
    /// Whether the list could be produced
    pub success: bool,
    /// Group the members belong to
    pub group_id: String,
    /// Members
    #[serde(default)]
    pub members: Vec<GroupMember>,
    /// Group description including the announcement
    #[serde(default)]
    pub group: Option<GroupInfo>,
}

/// Change group name, avatar or announcement. Absent fields are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdateInfoRequest {
    /// Group to update
    pub group_id: String,
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// New avatar location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// New announcement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcement: Option<String>,
}

/// Result of an info update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdateInfoResponse {
    /// Whether the update was applied
    pub success: bool,
    /// Updated description
    #[serde(default)]
    pub group: Option<GroupInfo>,
    /// Failure code
    #[serde(default)]
    pub error_code: Option<i32>,
    /// Failure description
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Request naming a single group: dismiss, quit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIdRequest {
    /// Target group
    pub group_id: String,
}

/// Request naming a group and a set of members: invite, kick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembersRequest {
    /// Target group
    pub group_id: String,
    /// Members to add or remove
    pub member_user_ids: Vec<String>,
}

/// Result of invite, kick, quit and dismiss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOperationResponse {
    /// Whether the operation was applied
    pub success: bool,
    /// Human-readable result
    #[serde(default)]
    pub message: Option<String>,
    /// Failure code
    #[serde(default)]
    pub error_code: Option<i32>,
    /// Failure description
    #[serde(default)]
    pub error_message: Option<String>,
}

/// We were invited into a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInviteNotify {
    /// Group joined
    pub group_id: String,
    /// Who invited us
    #[serde(default)]
    pub inviter_id: Option<String>,
    /// Inviter's username
    #[serde(default)]
    pub inviter_username: Option<String>,
}

/// We were removed from a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKickNotify {
    /// Group left
    pub group_id: String,
    /// Who removed us
    #[serde(default)]
    pub kicker_id: Option<String>,
}

/// Another member left a group we are in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupQuitNotify {
    /// Group affected
    pub group_id: String,
    /// Who left
    #[serde(default)]
    pub quit_user_id: Option<String>,
    /// Leaver's username
    #[serde(default)]
    pub quit_username: Option<String>,
}

/// A group we are in was dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDismissNotify {
    /// Group dismissed
    pub group_id: String,
}

/// A group we are in changed its name or announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdateInfoNotify {
    /// Group updated
    pub group_id: String,
    /// Current display name
    #[serde(default)]
    pub group_name: Option<String>,
    /// Current announcement
    #[serde(default)]
    pub announcement: Option<String>,
}
