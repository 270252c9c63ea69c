//! Integration tests for ChatClient and Runtime behavior.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - Store slots reflect the frames received
//! - Follow-up requests went out (or did not)
//! - Notifications fired only where expected

use imlink_app::{ChatClient, EngineConfig, Runtime};
use imlink_harness::{Notification, RecordingNotifier, RecordingTransport};
use imlink_proto::{
    Frame, FrameHeader, MessageType, Payload,
    payloads::{
        chat::{ChatMessage, ConversationType},
        friend::{
            FriendApplyNotify, FriendDeleteResponse, FriendHandleAction, FriendHandleResponse,
            FriendInfo, FriendListResponse, FriendUserBrief,
        },
        group::{
            GroupCreateResponse, GroupInfo, GroupListItem, GroupListResponse, GroupMember,
            GroupMemberListResponse, GroupMembersRequest, GroupOperationResponse,
            GroupQuitNotify, GroupInviteNotify,
        },
        session::{ErrorPayload, LoginResponse},
    },
};

type TestClient = ChatClient<RecordingTransport, RecordingNotifier>;
type TestRuntime = Runtime<RecordingTransport, RecordingNotifier>;

/// Client, runtime, and handles to inspect the doubles.
fn setup() -> (TestClient, TestRuntime, RecordingTransport, RecordingNotifier) {
    let transport = RecordingTransport::new();
    let notifier = RecordingNotifier::new();
    let client = ChatClient::new(transport.clone(), notifier.clone());
    let runtime = Runtime::new(client.clone(), EngineConfig::default());
    (client, runtime, transport, notifier)
}

/// Simulate receiving a payload from the server.
async fn receive(runtime: &mut TestRuntime, payload: Payload) {
    let frame = payload.into_frame().unwrap();
    runtime.dispatch(&frame).await;
}

/// Log in as user "1" ("alice") through a server response.
async fn log_in(runtime: &mut TestRuntime) {
    receive(
        runtime,
        Payload::LoginResponse(LoginResponse {
            success: true,
            message: "ok".into(),
            user_id: Some("1".into()),
            username: Some("alice".into()),
        }),
    )
    .await;
}

fn chat(from: &str, content: &str, timestamp: i64) -> Payload {
    Payload::ReceiveMessage(ChatMessage {
        from_user_id: from.into(),
        from_username: format!("user{from}"),
        content: content.into(),
        message_type: "text".into(),
        timestamp,
        conversation_type: ConversationType::Single,
        group_id: None,
        to_user_id: Some("1".into()),
    })
}

fn group_chat(from: &str, group_id: &str, content: &str, timestamp: i64) -> Payload {
    Payload::ReceiveMessage(ChatMessage {
        from_user_id: from.into(),
        from_username: format!("user{from}"),
        content: content.into(),
        message_type: "text".into(),
        timestamp,
        conversation_type: ConversationType::Group,
        group_id: Some(group_id.into()),
        to_user_id: None,
    })
}

fn friend(id: &str, name: &str) -> FriendInfo {
    FriendInfo {
        user_id: id.into(),
        username: name.into(),
        nickname: None,
        avatar_url: None,
        remark: None,
        group_name: None,
        is_blocked: false,
        online: true,
    }
}

fn group_info(id: &str, name: &str) -> GroupInfo {
    GroupInfo {
        group_id: id.into(),
        group_name: name.into(),
        owner_id: "1".into(),
        avatar_url: None,
        announcement: None,
        created_at: 0,
    }
}

fn op(success: bool) -> GroupOperationResponse {
    GroupOperationResponse { success, message: None, error_code: None, error_message: None }
}

#[tokio::test]
async fn login_success_sets_session() {
    let (client, mut runtime, _transport, _notifier) = setup();

    log_in(&mut runtime).await;

    let store = client.store();
    let user = store.current_user.get().unwrap();
    assert_eq!((user.user_id.as_str(), user.username.as_str()), ("1", "alice"));
    assert!(store.login_response.get().unwrap().success);
}

#[tokio::test]
async fn login_failure_leaves_session_empty() {
    let (client, mut runtime, _transport, _notifier) = setup();

    receive(&mut runtime, Payload::LoginResponse(LoginResponse::failure("bad password"))).await;

    assert!(client.store().current_user.get().is_none());
    assert_eq!(client.store().login_response.get().unwrap().message, "bad password");
}

#[tokio::test]
async fn login_send_failure_fills_local_result() {
    let (client, _runtime, transport, _notifier) = setup();
    transport.set_failing(true);

    assert!(!client.login("alice", "pw").await);

    let result = client.store().login_response.get().unwrap();
    assert!(!result.success);
    assert!(!result.message.is_empty());
}

#[tokio::test]
async fn unread_and_notifications() {
    let (client, mut runtime, _transport, notifier) = setup();
    log_in(&mut runtime).await;

    receive(&mut runtime, chat("2", "hey", 100)).await;
    receive(&mut runtime, chat("2", "you there?", 101)).await;
    receive(&mut runtime, chat("3", "hello", 102)).await;
    // Our own message echoed back
    receive(&mut runtime, chat("1", "mine", 103)).await;
    // Group message never counts
    receive(&mut runtime, group_chat("2", "g1", "team", 104)).await;

    let store = client.store();
    let unread = store.unread_counts.get();
    assert_eq!(unread.get("2"), Some(&2));
    assert_eq!(unread.get("3"), Some(&1));
    assert_eq!(unread.get("1"), None);
    assert_eq!(store.total_unread(), 3);
    assert_eq!(store.messages.get().len(), 5);

    assert_eq!(
        notifier.notifications(),
        vec![
            Notification {
                from_user_id: "2".into(),
                from_username: "user2".into(),
                content: "hey".into()
            },
            Notification {
                from_user_id: "2".into(),
                from_username: "user2".into(),
                content: "you there?".into()
            },
            Notification {
                from_user_id: "3".into(),
                from_username: "user3".into(),
                content: "hello".into()
            },
        ]
    );

    client.open_conversation("2");
    assert_eq!(store.unread_counts.get().get("2"), None);
    assert_eq!(store.active_conversation.get().as_deref(), Some("2"));

    // Messages for the open conversation count but don't notify
    receive(&mut runtime, chat("2", "new", 200)).await;
    assert_eq!(store.unread_counts.get().get("2"), Some(&1));
    assert_eq!(notifier.notifications().len(), 3);

    client.close_conversation();
    receive(&mut runtime, chat("2", "later", 300)).await;
    assert_eq!(store.unread_counts.get().get("2"), Some(&2));
    assert_eq!(notifier.notifications().len(), 4);
}

#[tokio::test]
async fn logged_out_messages_do_not_count() {
    let (client, mut runtime, _transport, notifier) = setup();

    receive(&mut runtime, chat("2", "hey", 100)).await;

    assert_eq!(client.store().messages.get().len(), 1);
    assert!(client.store().unread_counts.get().is_empty());
    assert!(notifier.notifications().is_empty());
}

#[tokio::test]
async fn optimistic_send_then_echo_is_one_entry() {
    let (client, mut runtime, transport, _notifier) = setup();
    log_in(&mut runtime).await;

    assert!(client.send_message("2", "hi").await);
    let sent = client.store().messages.get();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from_user_id, "1");
    assert_eq!(sent[0].to_user_id.as_deref(), Some("2"));

    // Server echoes with its own timestamp, within the window
    receive(&mut runtime, chat("1", "hi", sent[0].timestamp + 1)).await;

    assert_eq!(client.store().messages.get().len(), 1);
    assert_eq!(transport.sent_types(), vec![MessageType::SendMessage]);
}

#[tokio::test]
async fn failed_send_appends_nothing() {
    let (client, _runtime, transport, _notifier) = setup();
    transport.set_failing(true);

    assert!(!client.send_message("2", "hi").await);
    assert!(!client.send_group_message("g1", "hi all").await);
    assert!(client.store().messages.get().is_empty());
}

#[tokio::test]
async fn group_send_while_logged_out_uses_placeholder_author() {
    let (client, _runtime, _transport, _notifier) = setup();

    assert!(client.send_group_message("g1", "hi all").await);

    let messages = client.store().group_conversation("g1");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].from_user_id, "unknown");
    assert_eq!(messages[0].from_username, "me");
    assert!(messages[0].is_group());
}

#[tokio::test]
async fn auth_error_ends_session() {
    let (client, mut runtime, transport, _notifier) = setup();
    assert!(client.connect().await);
    log_in(&mut runtime).await;

    receive(
        &mut runtime,
        Payload::Error(ErrorPayload { error_code: 1001, error_message: "session expired".into() }),
    )
    .await;

    assert!(client.store().current_user.get().is_none());
    assert_eq!(transport.disconnect_calls(), 1);
    let result = client.store().login_response.get().unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "session expired");

    // Logged out now: further 1001s are ignored entirely
    receive(
        &mut runtime,
        Payload::Error(ErrorPayload { error_code: 1001, error_message: "again".into() }),
    )
    .await;
    assert_eq!(transport.disconnect_calls(), 1);
    assert_eq!(client.store().login_response.get().unwrap().message, "session expired");
}

#[tokio::test]
async fn malformed_and_unknown_frames_do_not_stop_dispatch() {
    let (client, mut runtime, _transport, _notifier) = setup();

    runtime.dispatch(&Frame::with_type(MessageType::LoginResponse, &b"{not json"[..])).await;
    runtime.dispatch(&Frame::new(FrameHeader::with_raw_type(0x0999), &b"{}"[..])).await;
    runtime.dispatch(&Frame::with_type(MessageType::HeartbeatResponse, &b"{}"[..])).await;
    assert!(client.store().login_response.get().is_none());

    log_in(&mut runtime).await;
    assert!(client.store().is_logged_in());
}

#[tokio::test]
async fn friend_flow() {
    let (client, mut runtime, transport, _notifier) = setup();
    log_in(&mut runtime).await;

    receive(
        &mut runtime,
        Payload::FriendListResponse(FriendListResponse {
            success: true,
            friends: vec![friend("2", "bob")],
        }),
    )
    .await;
    assert_eq!(client.store().friends.get().len(), 1);

    receive(
        &mut runtime,
        Payload::FriendApplyNotify(FriendApplyNotify {
            apply_id: "a1".into(),
            from_user: FriendUserBrief {
                user_id: "3".into(),
                username: "carol".into(),
                nickname: None,
                avatar_url: None,
            },
            greeting: Some("hi".into()),
            created_at: 0,
        }),
    )
    .await;
    assert_eq!(client.store().friend_apply_notifications.get().len(), 1);

    assert!(client.handle_friend_apply("a1", FriendHandleAction::Accept, None).await);
    receive(
        &mut runtime,
        Payload::FriendHandleResponse(FriendHandleResponse {
            success: true,
            action: Some("accept".into()),
            friend: Some(friend("3", "carol")),
        }),
    )
    .await;
    let friends = client.store().friends.get();
    assert_eq!(friends.iter().map(|f| f.user_id.as_str()).collect::<Vec<_>>(), vec!["2", "3"]);
    assert!(client.store().friend_handle_response.get().unwrap().success);

    // The other side accepting our application: upsert, slot untouched
    receive(
        &mut runtime,
        Payload::FriendHandleNotify(FriendHandleResponse {
            success: true,
            action: Some("accept".into()),
            friend: Some(friend("2", "bobby")),
        }),
    )
    .await;
    assert_eq!(client.store().friends.get().len(), 2);
    assert_eq!(client.store().friends.get()[0].username, "bobby");

    transport.clear();
    receive(
        &mut runtime,
        Payload::FriendDeleteResponse(FriendDeleteResponse { success: true, message: None }),
    )
    .await;
    assert_eq!(transport.sent_types(), vec![MessageType::FriendListRequest]);
}

#[tokio::test]
async fn friend_list_request_skipped_when_logged_out() {
    let (client, _runtime, transport, _notifier) = setup();

    assert!(!client.request_friend_list().await);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn friend_apply_send_failure_fills_local_result() {
    let (client, _runtime, transport, _notifier) = setup();
    transport.set_failing(true);

    assert!(!client.send_friend_apply("carol", Some("hi"), None).await);
    assert!(!client.store().friend_apply_response.get().unwrap().success);

    assert!(!client.handle_friend_apply("a1", FriendHandleAction::Reject, None).await);
    let handled = client.store().friend_handle_response.get().unwrap();
    assert!(!handled.success);
    assert_eq!(handled.action.as_deref(), Some("reject"));
}

#[tokio::test]
async fn group_lifecycle() {
    let (client, mut runtime, transport, _notifier) = setup();
    log_in(&mut runtime).await;

    assert!(client.create_group("team", vec!["2".into(), "3".into()]).await);
    assert!(client.store().group_create_response.get().is_none());
    transport.clear();

    receive(
        &mut runtime,
        Payload::GroupCreateResponse(GroupCreateResponse {
            success: true,
            group: Some(group_info("g1", "team")),
            error_code: None,
            error_message: None,
        }),
    )
    .await;
    assert!(client.store().group_create_response.get().unwrap().success);
    assert_eq!(client.store().group_info.get()["g1"].group_name, "team");
    assert_eq!(transport.sent_types(), vec![MessageType::GroupListRequest]);

    // Failed list responses don't wipe the current list
    receive(
        &mut runtime,
        Payload::GroupListResponse(GroupListResponse {
            success: true,
            groups: vec![GroupListItem {
                group_id: "g1".into(),
                group_name: "team".into(),
                avatar_url: None,
                role: "owner".into(),
            }],
        }),
    )
    .await;
    receive(
        &mut runtime,
        Payload::GroupListResponse(GroupListResponse { success: false, groups: Vec::new() }),
    )
    .await;
    assert_eq!(client.store().groups.get().len(), 1);

    receive(
        &mut runtime,
        Payload::GroupMemberListResponse(GroupMemberListResponse {
            success: true,
            group_id: "g1".into(),
            members: vec![GroupMember {
                user_id: "1".into(),
                nickname_in_group: None,
                role: "owner".into(),
                avatar_url: None,
                online: true,
            }],
            group: Some(group_info("g1", "renamed")),
        }),
    )
    .await;
    assert_eq!(client.store().group_members.get()["g1"].len(), 1);
    assert_eq!(client.store().group_info.get()["g1"].group_name, "renamed");
}

#[tokio::test]
async fn kick_sends_single_member_and_refreshes_on_success() {
    let (client, mut runtime, transport, _notifier) = setup();
    log_in(&mut runtime).await;

    receive(&mut runtime, Payload::GroupKickResponse(op(false))).await;
    assert!(client.kick_group_member("g1", "3").await);
    // Pending slot is reset before the request goes out
    assert!(client.store().group_kick_response.get().is_none());

    assert_eq!(
        transport.sent_payloads(),
        vec![Payload::GroupKickRequest(GroupMembersRequest {
            group_id: "g1".into(),
            member_user_ids: vec!["3".into()],
        })]
    );

    transport.clear();
    receive(&mut runtime, Payload::GroupKickResponse(op(true))).await;
    assert!(client.store().group_kick_response.get().unwrap().success);
    assert_eq!(transport.sent_types(), vec![MessageType::GroupListRequest]);
}

#[tokio::test]
async fn group_mutation_responses_refresh_on_success() {
    let (client, mut runtime, transport, _notifier) = setup();
    log_in(&mut runtime).await;

    receive(&mut runtime, Payload::GroupInviteResponse(op(true))).await;
    receive(&mut runtime, Payload::GroupQuitResponse(op(true))).await;
    receive(&mut runtime, Payload::GroupDismissResponse(op(true))).await;
    receive(&mut runtime, Payload::GroupDismissResponse(op(false))).await;

    assert_eq!(transport.sent_types(), vec![MessageType::GroupListRequest; 3]);
    assert!(!client.store().group_dismiss_response.get().unwrap().success);
    assert!(client.store().group_invite_response.get().unwrap().success);
}

#[tokio::test]
async fn group_notifies() {
    let (_client, mut runtime, transport, _notifier) = setup();
    log_in(&mut runtime).await;

    receive(
        &mut runtime,
        Payload::GroupInviteNotify(GroupInviteNotify {
            group_id: "g2".into(),
            inviter_id: Some("2".into()),
            inviter_username: Some("bob".into()),
        }),
    )
    .await;
    assert_eq!(transport.sent_types(), vec![MessageType::GroupListRequest]);

    transport.clear();
    receive(
        &mut runtime,
        Payload::GroupQuitNotify(GroupQuitNotify {
            group_id: "g2".into(),
            quit_user_id: Some("3".into()),
            quit_username: Some("carol".into()),
        }),
    )
    .await;
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn logout_clears_session() {
    let (client, mut runtime, transport, _notifier) = setup();
    assert!(client.connect().await);
    assert!(client.register("alice", "pw", "Alice").await);
    log_in(&mut runtime).await;
    receive(&mut runtime, chat("2", "hey", 100)).await;
    assert_eq!(client.store().total_unread(), 1);

    client.logout().await;

    let store = client.store();
    assert!(store.current_user.get().is_none());
    assert!(store.login_response.get().is_none());
    assert!(store.register_response.get().is_none());
    assert!(store.unread_counts.get().is_empty());
    // Conversation history survives logout
    assert_eq!(store.messages.get().len(), 1);
    assert_eq!(transport.disconnect_calls(), 1);
    assert_eq!(
        transport.sent_types(),
        vec![MessageType::RegisterRequest, MessageType::Logout]
    );
}

#[tokio::test]
async fn connection_signal_is_mirrored() {
    let (client, runtime, transport, _notifier) = setup();
    let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let run = tokio::spawn(runtime.run(rx));

    let mut connected = client.store().connected.subscribe();
    assert!(client.connect().await);
    tokio::time::timeout(std::time::Duration::from_secs(2), connected.wait_for(|c| *c))
        .await
        .unwrap()
        .unwrap();

    transport.set_connected(false);
    tokio::time::timeout(std::time::Duration::from_secs(2), connected.wait_for(|c| !*c))
        .await
        .unwrap()
        .unwrap();

    run.abort();
}
