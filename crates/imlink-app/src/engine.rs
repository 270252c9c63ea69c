//! Reconciliation of server frames into client state.
//!
//! The [`Engine`] is a pure state machine: it reads and writes the
//! [`Store`], and returns [`EngineAction`]s for everything that needs I/O.
//! Time is injected so the auth-error throttle can be tested without
//! sleeping.
//!
//! # Policies
//!
//! - Lists (users, friends, groups) are replaced wholesale by list responses.
//! - Chat messages are deduplicated by author and content within
//!   [`EngineConfig::dedup_window_secs`]. The server carries no message ids.
//! - Successful group mutations trigger a group list refresh.
//! - Foreign single-chat messages always count as unread; the notification
//!   is skipped while that conversation is on screen.
//! - An auth-required error while logged in ends the session, at most once
//!   per [`EngineConfig::auth_error_throttle`].

use std::{ops::Sub, time::Duration};

use imlink_proto::{
    Frame, Payload,
    payloads::{
        chat::ChatMessage,
        friend::FriendHandleResponse,
        group::{GroupMemberListResponse, GroupOperationResponse},
        session::{ErrorPayload, LoginResponse},
    },
};

use crate::{AppError, CurrentUser, EngineAction, EngineConfig, IncomingNotice, Store};

/// Applies inbound payloads to a [`Store`].
///
/// # Type Parameters
///
/// - `I`: time instant (real or virtual) used for the auth-error throttle
#[derive(Debug)]
pub struct Engine<I> {
    config: EngineConfig,
    last_auth_error: Option<I>,
}

impl<I> Engine<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an engine with no throttle history.
    pub fn new(config: EngineConfig) -> Self {
        Self { config, last_auth_error: None }
    }

    /// Decode and apply one frame.
    ///
    /// Frames that fail to decode are logged and produce no actions. Nothing
    /// here can stop the caller from handling the next frame.
    pub fn handle(&mut self, store: &Store, frame: &Frame, now: I) -> Vec<EngineAction> {
        match Payload::from_frame(frame).map_err(AppError::from) {
            Ok(payload) => self.apply(store, payload, now),
            Err(AppError::UnknownMessageType(code)) => {
                tracing::warn!("Ignoring frame with unknown message type 0x{:04X}", code);
                Vec::new()
            },
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable frame");
                Vec::new()
            },
        }
    }

    /// Apply an already decoded payload.
    pub fn apply(&mut self, store: &Store, payload: Payload, now: I) -> Vec<EngineAction> {
        tracing::debug!(msg_type = %payload.message_type(), "Applying payload");

        match payload {
            Payload::LoginResponse(resp) => {
                if resp.success {
                    let user = CurrentUser {
                        user_id: resp.user_id.clone().unwrap_or_default(),
                        username: resp.username.clone().unwrap_or_default(),
                    };
                    tracing::info!(user_id = %user.user_id, "Logged in");
                    store.current_user.set(Some(user));
                } else {
                    tracing::info!(message = %resp.message, "Login rejected");
                }
                store.set_login_response(resp);
                Vec::new()
            },
            Payload::RegisterResponse(resp) => {
                store.set_register_response(resp);
                Vec::new()
            },
            Payload::ReceiveMessage(msg) => self.on_message(store, msg),
            Payload::UserListResponse(list) => {
                store.users.set(list.users);
                Vec::new()
            },
            Payload::HeartbeatResponse => Vec::new(),
            Payload::Error(err) => self.on_error(store, err, now),

            Payload::FriendApplyResponse(resp) => {
                store.friend_apply_response.set(Some(resp));
                Vec::new()
            },
            Payload::FriendApplyNotify(notify) => {
                tracing::info!(from = %notify.from_user.username, "Friend application received");
                store.friend_apply_notifications.modify(|list| list.push(notify));
                Vec::new()
            },
            Payload::FriendHandleResponse(resp) => {
                store.friend_handle_response.set(Some(resp.clone()));
                upsert_handled_friend(store, resp);
                Vec::new()
            },
            Payload::FriendHandleNotify(resp) => {
                upsert_handled_friend(store, resp);
                Vec::new()
            },
            Payload::FriendListResponse(list) => {
                store.friends.set(list.friends);
                Vec::new()
            },
            Payload::FriendDeleteResponse(resp) => {
                if resp.success && store.is_logged_in() {
                    vec![EngineAction::Send(Payload::FriendListRequest)]
                } else {
                    Vec::new()
                }
            },
            Payload::FriendBlockResponse(resp) => {
                tracing::debug!(success = resp.success, block = resp.block, "Block result");
                Vec::new()
            },

            Payload::GroupCreateResponse(resp) => {
                let refresh = resp.success;
                if resp.success
                    && let Some(group) = resp.group.clone()
                {
                    store.store_group_info(group);
                }
                store.group_create_response.set(Some(resp));
                refresh_groups_if(refresh)
            },
            Payload::GroupListResponse(list) => {
                if list.success {
                    store.groups.set(list.groups);
                }
                Vec::new()
            },
            Payload::GroupMemberListResponse(resp) => {
                on_member_list(store, resp);
                Vec::new()
            },
            Payload::GroupUpdateInfoResponse(resp) => {
                let refresh = resp.success;
                if resp.success
                    && let Some(group) = resp.group.clone()
                {
                    store.store_group_info(group);
                }
                store.group_update_info_response.set(Some(resp));
                refresh_groups_if(refresh)
            },
            Payload::GroupDismissResponse(resp) => {
                on_group_operation(&store.group_dismiss_response, resp, true)
            },
            Payload::GroupInviteResponse(resp) => {
                on_group_operation(&store.group_invite_response, resp, true)
            },
            Payload::GroupQuitResponse(resp) => {
                on_group_operation(&store.group_quit_response, resp, true)
            },
            Payload::GroupKickResponse(resp) => {
                on_group_operation(&store.group_kick_response, resp, true)
            },

            Payload::GroupInviteNotify(notify) => {
                tracing::info!(group_id = %notify.group_id, "Invited to group");
                refresh_groups_if(true)
            },
            Payload::GroupKickNotify(notify) => {
                tracing::info!(group_id = %notify.group_id, "Removed from group");
                refresh_groups_if(true)
            },
            Payload::GroupDismissNotify(notify) => {
                tracing::info!(group_id = %notify.group_id, "Group dismissed");
                refresh_groups_if(true)
            },
            Payload::GroupUpdateInfoNotify(notify) => {
                tracing::info!(group_id = %notify.group_id, "Group info changed");
                refresh_groups_if(true)
            },
            Payload::GroupQuitNotify(notify) => {
                tracing::info!(
                    group_id = %notify.group_id,
                    user = notify.quit_username.as_deref().unwrap_or("?"),
                    "Member left group"
                );
                Vec::new()
            },

            // Client-to-server types have no business arriving here
            Payload::LoginRequest(_)
            | Payload::RegisterRequest(_)
            | Payload::SendMessage(_)
            | Payload::Heartbeat(_)
            | Payload::UserListRequest
            | Payload::Logout
            | Payload::FriendApplyRequest(_)
            | Payload::FriendHandleRequest(_)
            | Payload::FriendListRequest
            | Payload::FriendDeleteRequest(_)
            | Payload::FriendBlockRequest(_)
            | Payload::GroupCreateRequest(_)
            | Payload::GroupListRequest
            | Payload::GroupMemberListRequest(_)
            | Payload::GroupInviteRequest(_)
            | Payload::GroupKickRequest(_)
            | Payload::GroupQuitRequest(_)
            | Payload::GroupDismissRequest(_)
            | Payload::GroupUpdateInfoRequest(_) => {
                tracing::warn!("Unexpected request-type frame from server");
                Vec::new()
            },
        }
    }

    fn on_message(&self, store: &Store, msg: ChatMessage) -> Vec<EngineAction> {
        let window = self.config.dedup_window_secs;
        let duplicate = store.messages.with(|messages| {
            messages.iter().any(|m| {
                m.from_user_id == msg.from_user_id
                    && m.content == msg.content
                    && m.timestamp.abs_diff(msg.timestamp) < window
            })
        });
        if duplicate {
            tracing::debug!(from = %msg.from_user_id, "Duplicate message dropped");
            return Vec::new();
        }

        store.messages.modify(|messages| messages.push(msg.clone()));

        if msg.is_group() {
            return Vec::new();
        }

        let from_other = store
            .current_user
            .with(|user| user.as_ref().is_some_and(|u| u.user_id != msg.from_user_id));
        if !from_other {
            return Vec::new();
        }

        store.unread_counts.modify(|counts| {
            *counts.entry(msg.from_user_id.clone()).or_insert(0) += 1;
        });

        let on_screen = store
            .active_conversation
            .with(|active| active.as_deref() == Some(msg.from_user_id.as_str()));
        if on_screen {
            return Vec::new();
        }

        vec![EngineAction::Notify(IncomingNotice {
            from_user_id: msg.from_user_id,
            from_username: msg.from_username,
            content: msg.content,
        })]
    }

    fn on_error(&mut self, store: &Store, err: ErrorPayload, now: I) -> Vec<EngineAction> {
        let mut actions = Vec::new();

        if err.is_auth_required() {
            if !store.is_logged_in() {
                tracing::debug!("Auth-required error while logged out, ignoring");
                return actions;
            }

            if let Some(last) = self.last_auth_error
                && now >= last
                && now - last < self.config.auth_error_throttle
            {
                tracing::debug!("Auth-required error throttled");
                return actions;
            }

            tracing::warn!(message = %err.error_message, "Session rejected by server");
            self.last_auth_error = Some(now);
            store.current_user.set(None);
            actions.push(EngineAction::Disconnect);
        } else {
            tracing::warn!(code = err.error_code, message = %err.error_message, "Server error");
        }

        store.set_login_response(LoginResponse::failure(err.error_message));
        actions
    }
}

fn upsert_handled_friend(store: &Store, resp: FriendHandleResponse) {
    if resp.success
        && let Some(friend) = resp.friend
    {
        store.upsert_friend(friend);
    }
}

fn on_member_list(store: &Store, resp: GroupMemberListResponse) {
    if !resp.success {
        return;
    }

    store.group_members.modify(|map| {
        map.insert(resp.group_id.clone(), resp.members);
    });
    if let Some(group) = resp.group {
        store.store_group_info(group);
    }
}

fn on_group_operation(
    slot: &crate::Slot<Option<GroupOperationResponse>>,
    resp: GroupOperationResponse,
    refresh_on_success: bool,
) -> Vec<EngineAction> {
    let refresh = refresh_on_success && resp.success;
    slot.set(Some(resp));
    refresh_groups_if(refresh)
}

fn refresh_groups_if(refresh: bool) -> Vec<EngineAction> {
    if refresh { vec![EngineAction::Send(Payload::GroupListRequest)] } else { Vec::new() }
}

#[cfg(test)]
mod tests {
    use imlink_proto::payloads::chat::ConversationType;

    use super::*;

    type TestEngine = Engine<Duration>;

    fn logged_in(user_id: &str) -> Store {
        let store = Store::new();
        store.current_user.set(Some(CurrentUser { user_id: user_id.into(), username: "me".into() }));
        store
    }

    fn chat(from: &str, content: &str, timestamp: i64) -> ChatMessage {
        ChatMessage {
            from_user_id: from.into(),
            from_username: format!("user{from}"),
            content: content.into(),
            message_type: "text".into(),
            timestamp,
            conversation_type: ConversationType::Single,
            group_id: None,
            to_user_id: None,
        }
    }

    fn auth_error() -> Payload {
        Payload::Error(ErrorPayload {
            error_code: ErrorPayload::AUTH_REQUIRED,
            error_message: "please log in".into(),
        })
    }

    #[test]
    fn dedup_window_boundary() {
        let store = logged_in("1");
        let mut engine = TestEngine::new(EngineConfig::default());

        engine.apply(&store, Payload::ReceiveMessage(chat("2", "hi", 100)), Duration::ZERO);
        engine.apply(&store, Payload::ReceiveMessage(chat("2", "hi", 104)), Duration::ZERO);
        assert_eq!(store.messages.get().len(), 1);

        engine.apply(&store, Payload::ReceiveMessage(chat("2", "hi", 106)), Duration::ZERO);
        assert_eq!(store.messages.get().len(), 2);
    }

    #[test]
    fn open_conversation_counts_but_does_not_notify() {
        let store = logged_in("1");
        store.active_conversation.set(Some("2".into()));
        let mut engine = TestEngine::new(EngineConfig::default());

        let actions =
            engine.apply(&store, Payload::ReceiveMessage(chat("2", "hi", 100)), Duration::ZERO);
        assert!(actions.is_empty());
        assert_eq!(store.unread_counts.get().get("2"), Some(&1));
        assert_eq!(store.messages.get().len(), 1);
    }

    #[test]
    fn auth_error_throttle() {
        let store = logged_in("1");
        let mut engine = TestEngine::new(EngineConfig::default());

        let first = engine.apply(&store, auth_error(), Duration::from_secs(10));
        assert_eq!(first, vec![EngineAction::Disconnect]);

        // Log back in, then hit the throttle window
        store.current_user.set(Some(CurrentUser { user_id: "1".into(), username: "me".into() }));
        let second = engine.apply(&store, auth_error(), Duration::from_millis(11_000));
        assert!(second.is_empty());
        assert!(store.is_logged_in());

        let third = engine.apply(&store, auth_error(), Duration::from_millis(11_600));
        assert_eq!(third, vec![EngineAction::Disconnect]);
        assert!(!store.is_logged_in());
    }

    #[test]
    fn non_auth_error_surfaces_as_login_failure() {
        let store = logged_in("1");
        let mut engine = TestEngine::new(EngineConfig::default());

        let actions = engine.apply(
            &store,
            Payload::Error(ErrorPayload { error_code: 500, error_message: "boom".into() }),
            Duration::ZERO,
        );
        assert!(actions.is_empty());
        assert!(store.is_logged_in());
        assert_eq!(store.login_response.get().unwrap().message, "boom");
    }

    #[test]
    fn kick_response_refreshes_only_on_success() {
        let store = logged_in("1");
        let mut engine = TestEngine::new(EngineConfig::default());
        let ok = GroupOperationResponse {
            success: true,
            message: None,
            error_code: None,
            error_message: None,
        };

        let actions = engine.apply(&store, Payload::GroupKickResponse(ok.clone()), Duration::ZERO);
        assert_eq!(actions, vec![EngineAction::Send(Payload::GroupListRequest)]);
        assert_eq!(store.group_kick_response.get(), Some(ok.clone()));

        let failed = GroupOperationResponse { success: false, ..ok };
        let actions =
            engine.apply(&store, Payload::GroupKickResponse(failed.clone()), Duration::ZERO);
        assert!(actions.is_empty());
        assert_eq!(store.group_kick_response.get(), Some(failed));
    }
}
