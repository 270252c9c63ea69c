//! JSON-encoded protocol messages.
//!
//! Frame headers are raw binary; payloads are UTF-8 JSON objects with
//! `snake_case` field names. The [`Payload`] enum covers every registered
//! message type, grouped by feature area: session, chat, friend, group.
//!
//! # Invariants
//!
//! Each payload variant maps to exactly one [`MessageType`] and carries the
//! same name (enforced by match exhaustiveness). Types whose body is an empty
//! object are unit variants; their body is ignored on decode.

pub mod chat;
pub mod friend;
pub mod group;
pub mod session;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Frame, FrameHeader, MessageType,
    errors::{ProtocolError, Result},
};

macro_rules! payloads {
    (
        empty { $( $(#[$umeta:meta])* $unit:ident, )* }
        json { $( $(#[$meta:meta])* $variant:ident($ty:ty), )* }
    ) => {
        /// All possible frame payloads.
        ///
        /// The payload type is determined by the message type in the frame
        /// header; the JSON body carries no variant tag.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Payload {
            $( $(#[$umeta])* $unit, )*
            $( $(#[$meta])* $variant($ty), )*
        }

        impl Payload {
            /// Message type corresponding to this payload.
            #[must_use]
            pub const fn message_type(&self) -> MessageType {
                match self {
                    $( Self::$unit => MessageType::$unit, )*
                    $( Self::$variant(_) => MessageType::$variant, )*
                }
            }

            /// Decode a payload body for the given message type.
            ///
            /// # Errors
            ///
            /// - `ProtocolError::PayloadTooLarge` if `bytes` exceeds the frame
            ///   limit
            /// - `ProtocolError::InvalidPayload` if the JSON does not match the
            ///   type's schema (including invalid UTF-8)
            pub fn decode(msg_type: MessageType, bytes: &[u8]) -> Result<Self> {
                if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
                    return Err(ProtocolError::PayloadTooLarge {
                        size: bytes.len(),
                        max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
                    });
                }

                let payload = match msg_type {
                    $( MessageType::$unit => Self::$unit, )*
                    $( MessageType::$variant => Self::$variant(from_json(msg_type, bytes)?), )*
                };
                Ok(payload)
            }

            /// Serialize the payload body.
            ///
            /// # Errors
            ///
            /// - `ProtocolError::InvalidPayload` if serialization fails
            pub fn to_json(&self) -> Result<Vec<u8>> {
                match self {
                    $( Self::$unit => Ok(b"{}".to_vec()), )*
                    $( Self::$variant(inner) => to_json(self.message_type(), inner), )*
                }
            }
        }
    };
}

payloads! {
    empty {
        /// Keepalive reply
        HeartbeatResponse,
        /// Online user list request
        UserListRequest,
        /// End the session
        Logout,
        /// Friend list request
        FriendListRequest,
        /// Joined group list request
        GroupListRequest,
    }
    json {
        /// Login credentials
        LoginRequest(session::LoginRequest),
        /// Login result
        LoginResponse(session::LoginResponse),
        /// Account creation
        RegisterRequest(session::RegisterRequest),
        /// Account creation result
        RegisterResponse(session::RegisterResponse),
        /// Outbound chat message
        SendMessage(chat::SendMessageRequest),
        /// Inbound chat message, single or group
        ReceiveMessage(chat::ChatMessage),
        /// Keepalive
        Heartbeat(session::Heartbeat),
        /// Online user list
        UserListResponse(session::UserListResponse),
        /// Server error report
        Error(session::ErrorPayload),
        /// Friend application
        FriendApplyRequest(friend::FriendApplyRequest),
        /// Friend application result
        FriendApplyResponse(friend::FriendApplyResponse),
        /// Incoming friend application
        FriendApplyNotify(friend::FriendApplyNotify),
        /// Accept or reject an application
        FriendHandleRequest(friend::FriendHandleRequest),
        /// Result of handling an application
        FriendHandleResponse(friend::FriendHandleResponse),
        /// Our application was handled
        FriendHandleNotify(friend::FriendHandleResponse),
        /// Friend list
        FriendListResponse(friend::FriendListResponse),
        /// Remove a friend
        FriendDeleteRequest(friend::FriendDeleteRequest),
        /// Removal result
        FriendDeleteResponse(friend::FriendDeleteResponse),
        /// Block or unblock
        FriendBlockRequest(friend::FriendBlockRequest),
        /// Block result
        FriendBlockResponse(friend::FriendBlockResponse),
        /// Create a group
        GroupCreateRequest(group::GroupCreateRequest),
        /// Group creation result
        GroupCreateResponse(group::GroupCreateResponse),
        /// Joined group list
        GroupListResponse(group::GroupListResponse),
        /// Member list request
        GroupMemberListRequest(group::GroupMemberListRequest),
        /// Member list
        GroupMemberListResponse(group::GroupMemberListResponse),
        /// Invite members
        GroupInviteRequest(group::GroupMembersRequest),
        /// Invite result
        GroupInviteResponse(group::GroupOperationResponse),
        /// We were invited
        GroupInviteNotify(group::GroupInviteNotify),
        /// Remove members
        GroupKickRequest(group::GroupMembersRequest),
        /// Kick result
        GroupKickResponse(group::GroupOperationResponse),
        /// We were removed
        GroupKickNotify(group::GroupKickNotify),
        /// Leave a group
        GroupQuitRequest(group::GroupIdRequest),
        /// Leave result
        GroupQuitResponse(group::GroupOperationResponse),
        /// A member left
        GroupQuitNotify(group::GroupQuitNotify),
        /// Dismiss a group
        GroupDismissRequest(group::GroupIdRequest),
        /// Dismiss result
        GroupDismissResponse(group::GroupOperationResponse),
        /// A group was dismissed
        GroupDismissNotify(group::GroupDismissNotify),
        /// Update group info
        GroupUpdateInfoRequest(group::GroupUpdateInfoRequest),
        /// Update result
        GroupUpdateInfoResponse(group::GroupUpdateInfoResponse),
        /// A group was updated
        GroupUpdateInfoNotify(group::GroupUpdateInfoNotify),
    }
}

impl Payload {
    /// Parse the payload of a raw transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownMessageType` if the header's type code is not
    ///   registered
    /// - any error from [`Payload::decode`]
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let code = frame.header.msg_type();
        let msg_type = MessageType::from_u16(code).ok_or(ProtocolError::UnknownMessageType(code))?;
        Self::decode(msg_type, &frame.payload)
    }

    /// Convert payload into a transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidPayload` if serialization fails
    pub fn into_frame(self) -> Result<Frame> {
        let body = self.to_json()?;
        Ok(Frame::with_type(self.message_type(), body))
    }
}

fn from_json<T: DeserializeOwned>(msg_type: MessageType, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::InvalidPayload {
        message_type: msg_type.name(),
        reason: e.to_string(),
    })
}

fn to_json<T: Serialize>(msg_type: MessageType, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ProtocolError::InvalidPayload {
        message_type: msg_type.name(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::session::{ErrorPayload, Heartbeat, LoginRequest};

    #[test]
    fn every_message_type_has_a_payload() {
        // Unit types decode from "{}"; the rest must at least reach serde.
        for ty in MessageType::ALL {
            match Payload::decode(ty, b"{}") {
                Ok(payload) => assert_eq!(payload.message_type(), ty),
                Err(ProtocolError::InvalidPayload { message_type, .. }) => {
                    assert_eq!(message_type, ty.name());
                },
                Err(other) => unreachable!("unexpected error for {ty}: {other}"),
            }
        }
    }

    #[test]
    fn into_frame_sets_type_and_body() {
        let payload = Payload::LoginRequest(LoginRequest {
            username: "alice".into(),
            password: "pw".into(),
        });
        let frame = payload.clone().into_frame().unwrap();
        assert_eq!(frame.message_type(), Some(MessageType::LoginRequest));
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&frame.payload).unwrap(),
            serde_json::json!({"username": "alice", "password": "pw"})
        );
        assert_eq!(Payload::from_frame(&frame).unwrap(), payload);
    }

    #[test]
    fn empty_bodies_ignore_content() {
        let frame = Frame::with_type(MessageType::HeartbeatResponse, &b""[..]);
        assert_eq!(Payload::from_frame(&frame).unwrap(), Payload::HeartbeatResponse);
        assert_eq!(Payload::Logout.to_json().unwrap(), b"{}");
    }

    #[test]
    fn heartbeat_body() {
        let frame = Payload::Heartbeat(Heartbeat { timestamp: 1_700_000_000 }).into_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), br#"{"timestamp":1700000000}"#);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let frame = Frame::new(FrameHeader::with_raw_type(0x0300), &b"{}"[..]);
        assert_eq!(Payload::from_frame(&frame), Err(ProtocolError::UnknownMessageType(0x0300)));
    }

    #[test]
    fn malformed_json_is_reported_with_type_name() {
        let frame = Frame::with_type(MessageType::Error, &b"{\"error_code\":"[..]);
        match Payload::from_frame(&frame) {
            Err(ProtocolError::InvalidPayload { message_type, .. }) => {
                assert_eq!(message_type, "ERROR");
            },
            other => unreachable!("expected InvalidPayload, got {other:?}"),
        }
    }

    #[test]
    fn error_frame_decodes() {
        let frame = Frame::with_type(
            MessageType::Error,
            &br#"{"error_code":1001,"error_message":"login first"}"#[..],
        );
        assert_eq!(
            Payload::from_frame(&frame).unwrap(),
            Payload::Error(ErrorPayload { error_code: 1001, error_message: "login first".into() })
        );
    }
}
