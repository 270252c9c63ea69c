//! Observable client state.
//!
//! Each piece of state lives in its own [`Slot`], a thin wrapper over a
//! [`tokio::sync::watch`] channel. Readers take snapshots with
//! [`Slot::get`] or follow changes with [`Slot::subscribe`]; only this crate
//! writes.
//!
//! # Invariants
//!
//! - Every write notifies subscribers, even when the new value equals the
//!   old one.
//! - `unread_counts` loses a user's key when that conversation is opened;
//!   later messages count again until it is cleared.

use std::{
    collections::BTreeMap,
    sync::Arc,
};

use imlink_proto::payloads::{
    chat::ChatMessage,
    friend::{FriendApplyNotify, FriendApplyResponse, FriendHandleResponse, FriendInfo},
    group::{
        GroupCreateResponse, GroupInfo, GroupListItem, GroupMember, GroupOperationResponse,
        GroupUpdateInfoResponse,
    },
    session::{LoginResponse, RegisterResponse, UserInfoItem},
};
use tokio::sync::watch;

/// One observable value.
#[derive(Debug)]
pub struct Slot<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Slot<T> {
    fn new(value: T) -> Self {
        let (tx, _) = watch::channel(value);
        Self { tx }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Follow changes to this slot.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub(crate) fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub(crate) fn modify(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }
}

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Server-assigned id
    pub user_id: String,
    /// Login name
    pub username: String,
}

/// All client state visible to a front end.
#[derive(Debug)]
pub struct Store {
    /// Whether the transport is connected
    pub connected: Slot<bool>,
    /// Session, `None` when logged out
    pub current_user: Slot<Option<CurrentUser>>,
    /// Conversation log, single and group, in arrival order
    pub messages: Slot<Vec<ChatMessage>>,
    /// Online users
    pub users: Slot<Vec<UserInfoItem>>,
    /// Friend list
    pub friends: Slot<Vec<FriendInfo>>,
    /// Result of the last friend application we sent
    pub friend_apply_response: Slot<Option<FriendApplyResponse>>,
    /// Friend applications addressed to us
    pub friend_apply_notifications: Slot<Vec<FriendApplyNotify>>,
    /// Result of the last accept/reject
    pub friend_handle_response: Slot<Option<FriendHandleResponse>>,
    /// Unread single-chat messages per author
    pub unread_counts: Slot<BTreeMap<String, u32>>,
    /// Result of the last login attempt or surfaced server error
    pub login_response: Slot<Option<Arc<LoginResponse>>>,
    /// Result of the last registration attempt
    pub register_response: Slot<Option<Arc<RegisterResponse>>>,
    /// Joined groups
    pub groups: Slot<Vec<GroupListItem>>,
    /// Result of the last group creation
    pub group_create_response: Slot<Option<GroupCreateResponse>>,
    /// Members per group id
    pub group_members: Slot<BTreeMap<String, Vec<GroupMember>>>,
    /// Group details per group id
    pub group_info: Slot<BTreeMap<String, GroupInfo>>,
    /// Result of the last group info update
    pub group_update_info_response: Slot<Option<GroupUpdateInfoResponse>>,
    /// Result of the last dismiss
    pub group_dismiss_response: Slot<Option<GroupOperationResponse>>,
    /// Result of the last invite
    pub group_invite_response: Slot<Option<GroupOperationResponse>>,
    /// Result of the last kick
    pub group_kick_response: Slot<Option<GroupOperationResponse>>,
    /// Result of the last quit
    pub group_quit_response: Slot<Option<GroupOperationResponse>>,
    /// User id of the single chat currently on screen
    pub active_conversation: Slot<Option<String>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Empty, logged-out, disconnected state.
    pub fn new() -> Self {
        Self {
            connected: Slot::new(false),
            current_user: Slot::new(None),
            messages: Slot::new(Vec::new()),
            users: Slot::new(Vec::new()),
            friends: Slot::new(Vec::new()),
            friend_apply_response: Slot::new(None),
            friend_apply_notifications: Slot::new(Vec::new()),
            friend_handle_response: Slot::new(None),
            unread_counts: Slot::new(BTreeMap::new()),
            login_response: Slot::new(None),
            register_response: Slot::new(None),
            groups: Slot::new(Vec::new()),
            group_create_response: Slot::new(None),
            group_members: Slot::new(BTreeMap::new()),
            group_info: Slot::new(BTreeMap::new()),
            group_update_info_response: Slot::new(None),
            group_dismiss_response: Slot::new(None),
            group_invite_response: Slot::new(None),
            group_kick_response: Slot::new(None),
            group_quit_response: Slot::new(None),
            active_conversation: Slot::new(None),
        }
    }

    /// Whether a session is established.
    pub fn is_logged_in(&self) -> bool {
        self.current_user.with(Option::is_some)
    }

    /// Messages exchanged with one user, in arrival order.
    pub fn conversation_with(&self, user_id: &str) -> Vec<ChatMessage> {
        self.messages.with(|messages| {
            messages
                .iter()
                .filter(|m| {
                    !m.is_group()
                        && (m.from_user_id == user_id || m.to_user_id.as_deref() == Some(user_id))
                })
                .cloned()
                .collect()
        })
    }

    /// Messages posted to one group, in arrival order.
    pub fn group_conversation(&self, group_id: &str) -> Vec<ChatMessage> {
        self.messages.with(|messages| {
            messages
                .iter()
                .filter(|m| m.is_group() && m.group_id.as_deref() == Some(group_id))
                .cloned()
                .collect()
        })
    }

    /// Total unread single-chat messages.
    pub fn total_unread(&self) -> u32 {
        self.unread_counts.with(|counts| counts.values().sum())
    }

    pub(crate) fn set_login_response(&self, response: LoginResponse) {
        self.login_response.set(Some(Arc::new(response)));
    }

    pub(crate) fn set_register_response(&self, response: RegisterResponse) {
        self.register_response.set(Some(Arc::new(response)));
    }

    /// Insert or replace a friend, keyed by user id.
    pub(crate) fn upsert_friend(&self, friend: FriendInfo) {
        self.friends.modify(|friends| {
            match friends.iter_mut().find(|f| f.user_id == friend.user_id) {
                Some(existing) => *existing = friend,
                None => friends.push(friend),
            }
        });
    }

    pub(crate) fn store_group_info(&self, info: GroupInfo) {
        self.group_info.modify(|map| {
            map.insert(info.group_id.clone(), info);
        });
    }
}

#[cfg(test)]
mod tests {
    use imlink_proto::payloads::chat::ConversationType;

    use super::*;

    fn friend(id: &str, name: &str) -> FriendInfo {
        FriendInfo {
            user_id: id.into(),
            username: name.into(),
            nickname: None,
            avatar_url: None,
            remark: None,
            group_name: None,
            is_blocked: false,
            online: false,
        }
    }

    #[test]
    fn equal_writes_still_notify() {
        let store = Store::new();
        let rx = store.connected.subscribe();
        store.connected.set(false);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn login_results_are_fresh_objects() {
        let store = Store::new();
        store.set_login_response(LoginResponse::failure("x"));
        let first = store.login_response.get().unwrap();
        store.set_login_response(LoginResponse::failure("x"));
        let second = store.login_response.get().unwrap();
        assert_eq!(first, second);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn upsert_friend_replaces_by_id() {
        let store = Store::new();
        store.upsert_friend(friend("1", "alice"));
        store.upsert_friend(friend("2", "bob"));
        store.upsert_friend(friend("1", "alice2"));

        let friends = store.friends.get();
        assert_eq!(friends.len(), 2);
        assert_eq!(friends[0].username, "alice2");
    }

    #[test]
    fn conversation_filters() {
        let store = Store::new();
        let msg = |from: &str, to: Option<&str>, group: Option<&str>| ChatMessage {
            from_user_id: from.into(),
            from_username: from.into(),
            content: "x".into(),
            message_type: "text".into(),
            timestamp: 0,
            conversation_type: if group.is_some() {
                ConversationType::Group
            } else {
                ConversationType::Single
            },
            group_id: group.map(Into::into),
            to_user_id: to.map(Into::into),
        };
        store.messages.set(vec![
            msg("2", None, None),
            msg("1", Some("2"), None),
            msg("3", None, None),
            msg("2", None, Some("g1")),
        ]);

        assert_eq!(store.conversation_with("2").len(), 2);
        assert_eq!(store.group_conversation("g1").len(), 1);
    }
}
