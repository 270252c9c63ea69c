//! Async client operations.
//!
//! [`ChatClient`] turns user intent into outbound frames and performs the
//! optimistic or local-failure updates that accompany them. Responses are
//! applied later by the [`crate::Runtime`] when they arrive.

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use imlink_proto::{
    Payload,
    payloads::{
        chat::{ChatMessage, ConversationType, SendMessageRequest},
        friend::{
            FriendApplyRequest, FriendApplyResponse, FriendBlockRequest, FriendDeleteRequest,
            FriendHandleAction, FriendHandleRequest, FriendHandleResponse,
        },
        group::{
            GroupCreateRequest, GroupIdRequest, GroupMemberListRequest, GroupMembersRequest,
            GroupUpdateInfoRequest,
        },
        session::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    },
};

use crate::{AppError, Notifier, Store, Transport};

/// Author id recorded on optimistic messages sent while logged out.
const UNKNOWN_USER_ID: &str = "unknown";

/// Author name recorded on optimistic messages sent while logged out.
const UNKNOWN_USERNAME: &str = "me";

/// Handle for issuing chat operations.
///
/// Cheap to clone; clones share the transport, notifier and store.
pub struct ChatClient<T, N> {
    transport: Arc<T>,
    notifier: Arc<N>,
    store: Arc<Store>,
}

impl<T, N> Clone for ChatClient<T, N> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            notifier: Arc::clone(&self.notifier),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Transport, N: Notifier> ChatClient<T, N> {
    /// Create a client with a fresh, empty store.
    pub fn new(transport: T, notifier: N) -> Self {
        Self::with_store(transport, notifier, Arc::new(Store::new()))
    }

    /// Create a client over an existing store.
    pub fn with_store(transport: T, notifier: N, store: Arc<Store>) -> Self {
        Self { transport: Arc::new(transport), notifier: Arc::new(notifier), store }
    }

    /// Observable client state.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connect the transport.
    pub async fn connect(&self) -> bool {
        self.transport.connect().await
    }

    /// Disconnect the transport.
    pub async fn disconnect(&self) {
        self.transport.disconnect().await;
    }

    /// Serialize and send one payload.
    ///
    /// # Errors
    ///
    /// - `AppError::Encode` if the payload cannot be serialized
    /// - `AppError::SendFailed` if the transport rejected the write
    pub async fn try_send(&self, payload: &Payload) -> Result<(), AppError> {
        let msg_type = payload.message_type();
        let body = payload.to_json().map_err(|e| AppError::Encode(msg_type, e.to_string()))?;
        if self.transport.send(msg_type, &body).await {
            Ok(())
        } else {
            Err(AppError::SendFailed(msg_type))
        }
    }

    /// Send one payload, logging any failure.
    pub async fn send_payload(&self, payload: &Payload) -> bool {
        match self.try_send(payload).await {
            Ok(()) => true,
            Err(e) if e.is_transient() => {
                tracing::debug!(error = %e, "Send failed");
                false
            },
            Err(e) => {
                tracing::error!(error = %e, "Send failed");
                false
            },
        }
    }

    /// Request a session. On send failure the login slot gets a local
    /// failure result.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let payload = Payload::LoginRequest(LoginRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        });
        let sent = self.send_payload(&payload).await;
        if !sent {
            self.store.set_login_response(LoginResponse::failure("failed to send login request"));
        }
        sent
    }

    /// Create an account. On send failure the register slot gets a local
    /// failure result.
    pub async fn register(&self, username: &str, password: &str, nickname: &str) -> bool {
        let payload = Payload::RegisterRequest(RegisterRequest {
            username: username.to_owned(),
            password: password.to_owned(),
            nickname: nickname.to_owned(),
        });
        let sent = self.send_payload(&payload).await;
        if !sent {
            self.store
                .set_register_response(RegisterResponse::failure("failed to send register request"));
        }
        sent
    }

    /// Send a single-chat message and append it locally once written.
    pub async fn send_message(&self, to_user_id: &str, content: &str) -> bool {
        let request = SendMessageRequest::single(to_user_id, content);
        let sent = self.send_payload(&Payload::SendMessage(request)).await;
        if sent {
            let mut msg = self.optimistic_message(content);
            msg.to_user_id = Some(to_user_id.to_owned());
            self.store.messages.modify(|messages| messages.push(msg));
        }
        sent
    }

    /// Send a group message and append it locally once written.
    pub async fn send_group_message(&self, group_id: &str, content: &str) -> bool {
        let request = SendMessageRequest::group(group_id, content);
        let sent = self.send_payload(&Payload::SendMessage(request)).await;
        if sent {
            let mut msg = self.optimistic_message(content);
            msg.conversation_type = ConversationType::Group;
            msg.group_id = Some(group_id.to_owned());
            self.store.messages.modify(|messages| messages.push(msg));
        }
        sent
    }

    fn optimistic_message(&self, content: &str) -> ChatMessage {
        let (from_user_id, from_username) = self.store.current_user.with(|user| match user {
            Some(u) => (u.user_id.clone(), u.username.clone()),
            None => (UNKNOWN_USER_ID.to_owned(), UNKNOWN_USERNAME.to_owned()),
        });

        ChatMessage {
            from_user_id,
            from_username,
            content: content.to_owned(),
            message_type: "text".to_owned(),
            timestamp: unix_time_secs(),
            conversation_type: ConversationType::Single,
            group_id: None,
            to_user_id: None,
        }
    }

    /// Apply to befriend a user by name.
    pub async fn send_friend_apply(
        &self,
        target_username: &str,
        greeting: Option<&str>,
        remark: Option<&str>,
    ) -> bool {
        let payload = Payload::FriendApplyRequest(FriendApplyRequest {
            target_username: target_username.to_owned(),
            greeting: greeting.map(str::to_owned),
            remark: remark.map(str::to_owned),
        });
        let sent = self.send_payload(&payload).await;
        if !sent {
            self.store.friend_apply_response.set(Some(FriendApplyResponse {
                success: false,
                apply_id: None,
                message: Some("failed to send friend application".to_owned()),
            }));
        }
        sent
    }

    /// Accept or reject a pending application.
    pub async fn handle_friend_apply(
        &self,
        apply_id: &str,
        action: FriendHandleAction,
        remark: Option<&str>,
    ) -> bool {
        let payload = Payload::FriendHandleRequest(FriendHandleRequest {
            apply_id: apply_id.to_owned(),
            action,
            remark: remark.map(str::to_owned),
        });
        let sent = self.send_payload(&payload).await;
        if !sent {
            self.store.friend_handle_response.set(Some(FriendHandleResponse {
                success: false,
                action: Some(action.as_str().to_owned()),
                friend: None,
            }));
        }
        sent
    }

    /// Refresh the friend list. Skipped while logged out.
    pub async fn request_friend_list(&self) -> bool {
        if !self.store.is_logged_in() {
            tracing::debug!("Not logged in, skipping friend list request");
            return false;
        }
        self.send_payload(&Payload::FriendListRequest).await
    }

    /// Remove a friend.
    pub async fn delete_friend(&self, friend_user_id: &str) -> bool {
        let payload = Payload::FriendDeleteRequest(FriendDeleteRequest {
            friend_user_id: friend_user_id.to_owned(),
        });
        self.send_payload(&payload).await
    }

    /// Block or unblock a user.
    pub async fn block_friend(&self, target_user_id: &str, block: bool) -> bool {
        let payload = Payload::FriendBlockRequest(FriendBlockRequest {
            target_user_id: target_user_id.to_owned(),
            block,
        });
        self.send_payload(&payload).await
    }

    /// Refresh the online user list.
    pub async fn request_user_list(&self) -> bool {
        self.send_payload(&Payload::UserListRequest).await
    }

    /// End the session and drop the connection.
    ///
    /// Local session state is cleared whether or not the logout frame could
    /// be written.
    pub async fn logout(&self) {
        if !self.send_payload(&Payload::Logout).await {
            tracing::debug!("Logout frame not sent");
        }
        self.transport.disconnect().await;

        self.store.login_response.set(None);
        self.store.register_response.set(None);
        self.store.unread_counts.modify(std::collections::BTreeMap::clear);
        self.store.current_user.set(None);
        tracing::info!("Logged out");
    }

    /// Create a group with the given initial members.
    pub async fn create_group(&self, group_name: &str, member_user_ids: Vec<String>) -> bool {
        self.store.group_create_response.set(None);
        let payload = Payload::GroupCreateRequest(GroupCreateRequest {
            group_name: group_name.to_owned(),
            avatar_url: None,
            member_user_ids,
        });
        self.send_payload(&payload).await
    }

    /// Refresh the joined group list.
    pub async fn request_group_list(&self) -> bool {
        self.send_payload(&Payload::GroupListRequest).await
    }

    /// Fetch members of one group.
    pub async fn request_group_member_list(&self, group_id: &str) -> bool {
        let payload =
            Payload::GroupMemberListRequest(GroupMemberListRequest { group_id: group_id.to_owned() });
        self.send_payload(&payload).await
    }

    /// Change a group's name, avatar or announcement. `None` fields are left
    /// unchanged.
    pub async fn update_group_info(
        &self,
        group_id: &str,
        group_name: Option<&str>,
        avatar_url: Option<&str>,
        announcement: Option<&str>,
    ) -> bool {
        self.store.group_update_info_response.set(None);
        let payload = Payload::GroupUpdateInfoRequest(GroupUpdateInfoRequest {
            group_id: group_id.to_owned(),
            group_name: group_name.map(str::to_owned),
            avatar_url: avatar_url.map(str::to_owned),
            announcement: announcement.map(str::to_owned),
        });
        self.send_payload(&payload).await
    }

    /// Dismiss a group we own.
    pub async fn dismiss_group(&self, group_id: &str) -> bool {
        self.store.group_dismiss_response.set(None);
        let payload = Payload::GroupDismissRequest(GroupIdRequest { group_id: group_id.to_owned() });
        self.send_payload(&payload).await
    }

    /// Invite users into a group.
    pub async fn invite_group_members(&self, group_id: &str, member_user_ids: Vec<String>) -> bool {
        self.store.group_invite_response.set(None);
        let payload = Payload::GroupInviteRequest(GroupMembersRequest {
            group_id: group_id.to_owned(),
            member_user_ids,
        });
        self.send_payload(&payload).await
    }

    /// Remove one member from a group.
    pub async fn kick_group_member(&self, group_id: &str, user_id: &str) -> bool {
        self.store.group_kick_response.set(None);
        let payload = Payload::GroupKickRequest(GroupMembersRequest {
            group_id: group_id.to_owned(),
            member_user_ids: vec![user_id.to_owned()],
        });
        self.send_payload(&payload).await
    }

    /// Leave a group.
    pub async fn quit_group(&self, group_id: &str) -> bool {
        self.store.group_quit_response.set(None);
        let payload = Payload::GroupQuitRequest(GroupIdRequest { group_id: group_id.to_owned() });
        self.send_payload(&payload).await
    }

    /// Mark a single chat as on screen and clear its unread count.
    pub fn open_conversation(&self, user_id: &str) {
        self.store.active_conversation.set(Some(user_id.to_owned()));
        self.clear_unread(user_id);
    }

    /// No single chat on screen.
    pub fn close_conversation(&self) {
        self.store.active_conversation.set(None);
    }

    /// Forget the unread count for one user.
    pub fn clear_unread(&self, user_id: &str) {
        self.store.unread_counts.modify(|counts| {
            counts.remove(user_id);
        });
    }

    /// The notification sink.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

fn unix_time_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs() as i64)
}
