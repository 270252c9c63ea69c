//! Message type registry.
//!
//! The 16-bit type field in every frame header selects how the payload is
//! interpreted. Codes are grouped by feature area: `0x00xx` session and chat,
//! `0x01xx` friends, `0x02xx` groups.

/// Protocol magic: "IMIM" in ASCII.
pub const MAGIC: u32 = 0x494D_494D;

/// Group messages arrive on the same code as single-chat messages and are
/// distinguished by the payload's `conversation_type`.
pub const GROUP_MESSAGE_RECEIVE: MessageType = MessageType::ReceiveMessage;

/// Every message type the client understands.
///
/// # Invariants
///
/// - `from_u16(t.to_u16()) == Some(t)` for every variant.
/// - Codes are unique; unknown codes map to `None` rather than a catch-all
///   variant so handlers cannot accidentally match them.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    // Session
    /// Client login request
    LoginRequest = 0x0001,
    /// Login result
    LoginResponse = 0x0002,
    /// Client registration request
    RegisterRequest = 0x0003,
    /// Registration result
    RegisterResponse = 0x0004,
    /// Outbound chat message (single or group)
    SendMessage = 0x0005,
    /// Inbound chat message (single or group)
    ReceiveMessage = 0x0006,
    /// Client keepalive
    Heartbeat = 0x0007,
    /// Server keepalive reply
    HeartbeatResponse = 0x0008,
    /// Online user list request
    UserListRequest = 0x0009,
    /// Online user list
    UserListResponse = 0x000A,
    /// End the session
    Logout = 0x000B,
    /// Server-side error report
    Error = 0x000C,

    // Friends
    /// Send a friend application
    FriendApplyRequest = 0x0100,
    /// Friend application result
    FriendApplyResponse = 0x0101,
    /// Incoming friend application
    FriendApplyNotify = 0x0102,
    /// Accept or reject an application
    FriendHandleRequest = 0x0103,
    /// Result of handling an application
    FriendHandleResponse = 0x0104,
    /// The other side handled our application
    FriendHandleNotify = 0x0105,
    /// Friend list request
    FriendListRequest = 0x0106,
    /// Friend list
    FriendListResponse = 0x0107,
    /// Remove a friend
    FriendDeleteRequest = 0x0108,
    /// Friend removal result
    FriendDeleteResponse = 0x0109,
    /// Block or unblock a friend
    FriendBlockRequest = 0x010A,
    /// Block result
    FriendBlockResponse = 0x010B,

    // Groups
    /// Create a group
    GroupCreateRequest = 0x0200,
    /// Group creation result
    GroupCreateResponse = 0x0201,
    /// Joined group list request
    GroupListRequest = 0x0202,
    /// Joined group list
    GroupListResponse = 0x0203,
    /// Member list request
    GroupMemberListRequest = 0x0204,
    /// Member list for one group
    GroupMemberListResponse = 0x0205,
    /// Invite members
    GroupInviteRequest = 0x0206,
    /// Invite result
    GroupInviteResponse = 0x0207,
    /// We were invited to a group
    GroupInviteNotify = 0x0208,
    /// Remove members
    GroupKickRequest = 0x0209,
    /// Kick result
    GroupKickResponse = 0x020A,
    /// We were removed from a group
    GroupKickNotify = 0x020B,
    /// Leave a group
    GroupQuitRequest = 0x020C,
    /// Leave result
    GroupQuitResponse = 0x020D,
    /// Someone left a group we are in
    GroupQuitNotify = 0x020E,
    /// Dismiss a group (owner only)
    GroupDismissRequest = 0x020F,
    /// Dismiss result
    GroupDismissResponse = 0x0210,
    /// A group we are in was dismissed
    GroupDismissNotify = 0x0211,
    /// Update group name, avatar or announcement
    GroupUpdateInfoRequest = 0x0212,
    /// Update result
    GroupUpdateInfoResponse = 0x0213,
    /// A group we are in was updated
    GroupUpdateInfoNotify = 0x0214,
}

impl MessageType {
    /// All registered message types, in code order.
    pub const ALL: [Self; 45] = [
        Self::LoginRequest,
        Self::LoginResponse,
        Self::RegisterRequest,
        Self::RegisterResponse,
        Self::SendMessage,
        Self::ReceiveMessage,
        Self::Heartbeat,
        Self::HeartbeatResponse,
        Self::UserListRequest,
        Self::UserListResponse,
        Self::Logout,
        Self::Error,
        Self::FriendApplyRequest,
        Self::FriendApplyResponse,
        Self::FriendApplyNotify,
        Self::FriendHandleRequest,
        Self::FriendHandleResponse,
        Self::FriendHandleNotify,
        Self::FriendListRequest,
        Self::FriendListResponse,
        Self::FriendDeleteRequest,
        Self::FriendDeleteResponse,
        Self::FriendBlockRequest,
        Self::FriendBlockResponse,
        Self::GroupCreateRequest,
        Self::GroupCreateResponse,
        Self::GroupListRequest,
        Self::GroupListResponse,
        Self::GroupMemberListRequest,
        Self::GroupMemberListResponse,
        Self::GroupInviteRequest,
        Self::GroupInviteResponse,
        Self::GroupInviteNotify,
        Self::GroupKickRequest,
        Self::GroupKickResponse,
        Self::GroupKickNotify,
        Self::GroupQuitRequest,
        Self::GroupQuitResponse,
        Self::GroupQuitNotify,
        Self::GroupDismissRequest,
        Self::GroupDismissResponse,
        Self::GroupDismissNotify,
        Self::GroupUpdateInfoRequest,
        Self::GroupUpdateInfoResponse,
        Self::GroupUpdateInfoNotify,
    ];

    /// Look up a wire code. `None` if the code is not registered.
    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        let ty = match code {
            0x0001 => Self::LoginRequest,
            0x0002 => Self::LoginResponse,
            0x0003 => Self::RegisterRequest,
            0x0004 => Self::RegisterResponse,
            0x0005 => Self::SendMessage,
            0x0006 => Self::ReceiveMessage,
            0x0007 => Self::Heartbeat,
            0x0008 => Self::HeartbeatResponse,
            0x0009 => Self::UserListRequest,
            0x000A => Self::UserListResponse,
            0x000B => Self::Logout,
            0x000C => Self::Error,
            0x0100 => Self::FriendApplyRequest,
            0x0101 => Self::FriendApplyResponse,
            0x0102 => Self::FriendApplyNotify,
            0x0103 => Self::FriendHandleRequest,
            0x0104 => Self::FriendHandleResponse,
            0x0105 => Self::FriendHandleNotify,
            0x0106 => Self::FriendListRequest,
            0x0107 => Self::FriendListResponse,
            0x0108 => Self::FriendDeleteRequest,
            0x0109 => Self::FriendDeleteResponse,
            0x010A => Self::FriendBlockRequest,
            0x010B => Self::FriendBlockResponse,
            0x0200 => Self::GroupCreateRequest,
            0x0201 => Self::GroupCreateResponse,
            0x0202 => Self::GroupListRequest,
            0x0203 => Self::GroupListResponse,
            0x0204 => Self::GroupMemberListRequest,
            0x0205 => Self::GroupMemberListResponse,
            0x0206 => Self::GroupInviteRequest,
            0x0207 => Self::GroupInviteResponse,
            0x0208 => Self::GroupInviteNotify,
            0x0209 => Self::GroupKickRequest,
            0x020A => Self::GroupKickResponse,
            0x020B => Self::GroupKickNotify,
            0x020C => Self::GroupQuitRequest,
            0x020D => Self::GroupQuitResponse,
            0x020E => Self::GroupQuitNotify,
            0x020F => Self::GroupDismissRequest,
            0x0210 => Self::GroupDismissResponse,
            0x0211 => Self::GroupDismissNotify,
            0x0212 => Self::GroupUpdateInfoRequest,
            0x0213 => Self::GroupUpdateInfoResponse,
            0x0214 => Self::GroupUpdateInfoNotify,
            _ => return None,
        };
        Some(ty)
    }

    /// Wire code for this type.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Stable name for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LoginRequest => "LOGIN_REQUEST",
            Self::LoginResponse => "LOGIN_RESPONSE",
            Self::RegisterRequest => "REGISTER_REQUEST",
            Self::RegisterResponse => "REGISTER_RESPONSE",
            Self::SendMessage => "SEND_MESSAGE",
            Self::ReceiveMessage => "RECEIVE_MESSAGE",
            Self::Heartbeat => "HEARTBEAT",
            Self::HeartbeatResponse => "HEARTBEAT_RESPONSE",
            Self::UserListRequest => "USER_LIST_REQUEST",
            Self::UserListResponse => "USER_LIST_RESPONSE",
            Self::Logout => "LOGOUT",
            Self::Error => "ERROR",
            Self::FriendApplyRequest => "FRIEND_APPLY_REQUEST",
            Self::FriendApplyResponse => "FRIEND_APPLY_RESPONSE",
            Self::FriendApplyNotify => "FRIEND_APPLY_NOTIFY",
            Self::FriendHandleRequest => "FRIEND_HANDLE_REQUEST",
            Self::FriendHandleResponse => "FRIEND_HANDLE_RESPONSE",
            Self::FriendHandleNotify => "FRIEND_HANDLE_NOTIFY",
            Self::FriendListRequest => "FRIEND_LIST_REQUEST",
            Self::FriendListResponse => "FRIEND_LIST_RESPONSE",
            Self::FriendDeleteRequest => "FRIEND_DELETE_REQUEST",
            Self::FriendDeleteResponse => "FRIEND_DELETE_RESPONSE",
            Self::FriendBlockRequest => "FRIEND_BLOCK_REQUEST",
            Self::FriendBlockResponse => "FRIEND_BLOCK_RESPONSE",
            Self::GroupCreateRequest => "GROUP_CREATE_REQUEST",
            Self::GroupCreateResponse => "GROUP_CREATE_RESPONSE",
            Self::GroupListRequest => "GROUP_LIST_REQUEST",
            Self::GroupListResponse => "GROUP_LIST_RESPONSE",
            Self::GroupMemberListRequest => "GROUP_MEMBER_LIST_REQUEST",
            Self::GroupMemberListResponse => "GROUP_MEMBER_LIST_RESPONSE",
            Self::GroupInviteRequest => "GROUP_INVITE_REQUEST",
            Self::GroupInviteResponse => "GROUP_INVITE_RESPONSE",
            Self::GroupInviteNotify => "GROUP_INVITE_NOTIFY",
            Self::GroupKickRequest => "GROUP_KICK_REQUEST",
            Self::GroupKickResponse => "GROUP_KICK_RESPONSE",
            Self::GroupKickNotify => "GROUP_KICK_NOTIFY",
            Self::GroupQuitRequest => "GROUP_QUIT_REQUEST",
            Self::GroupQuitResponse => "GROUP_QUIT_RESPONSE",
            Self::GroupQuitNotify => "GROUP_QUIT_NOTIFY",
            Self::GroupDismissRequest => "GROUP_DISMISS_REQUEST",
            Self::GroupDismissResponse => "GROUP_DISMISS_RESPONSE",
            Self::GroupDismissNotify => "GROUP_DISMISS_NOTIFY",
            Self::GroupUpdateInfoRequest => "GROUP_UPDATE_INFO_REQUEST",
            Self::GroupUpdateInfoResponse => "GROUP_UPDATE_INFO_RESPONSE",
            Self::GroupUpdateInfoNotify => "GROUP_UPDATE_INFO_NOTIFY",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#06x})", self.name(), self.to_u16())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn registry_roundtrip() {
        for ty in MessageType::ALL {
            assert_eq!(MessageType::from_u16(ty.to_u16()), Some(ty));
        }
    }

    #[test]
    fn codes_and_names_are_unique() {
        let codes: HashSet<u16> = MessageType::ALL.iter().map(|t| t.to_u16()).collect();
        let names: HashSet<&str> = MessageType::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(codes.len(), MessageType::ALL.len());
        assert_eq!(names.len(), MessageType::ALL.len());
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(MessageType::from_u16(0x0000), None);
        assert_eq!(MessageType::from_u16(0x000D), None);
        assert_eq!(MessageType::from_u16(0x010C), None);
        assert_eq!(MessageType::from_u16(0x0215), None);
        assert_eq!(MessageType::from_u16(0xFFFF), None);
    }

    #[test]
    fn group_receive_alias() {
        assert_eq!(GROUP_MESSAGE_RECEIVE.to_u16(), 0x0006);
    }

    #[test]
    fn magic_spells_imim() {
        assert_eq!(&MAGIC.to_be_bytes(), b"IMIM");
    }
}
