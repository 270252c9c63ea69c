//! Full stack: ChatClient + Runtime over a real ConnectionManager talking to
//! the mock server.

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use imlink_app::{ChatClient, EngineConfig, Runtime, Store};
use imlink_client::{ClientConfig, ConnectionManager};
use imlink_harness::{MockServer, RecordingNotifier};
use imlink_proto::{
    MessageType, Payload,
    payloads::{
        chat::{ChatMessage, ConversationType},
        session::{LoginResponse, UserInfoItem, UserListResponse},
    },
};
use tokio::{sync::watch, time::timeout};

const WAIT: Duration = Duration::from_secs(2);

/// Wait until a slot satisfies `cond`
async fn settle<T>(rx: &mut watch::Receiver<T>, cond: impl FnMut(&T) -> bool) {
    timeout(WAIT, rx.wait_for(cond)).await.unwrap().unwrap();
}

/// Server that logs everyone in as user "1" and echoes chat messages back,
/// followed by a user list marker.
async fn echo_server() -> MockServer {
    let server = MockServer::start().await.unwrap();

    server.respond_with(MessageType::LoginRequest, |_| {
        vec![Payload::LoginResponse(LoginResponse {
            success: true,
            message: "welcome".into(),
            user_id: Some("1".into()),
            username: Some("alice".into()),
        })]
    });

    server.respond_with(MessageType::SendMessage, |frame| {
        let Ok(Payload::SendMessage(req)) = Payload::from_frame(frame) else {
            return Vec::new();
        };
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        vec![
            Payload::ReceiveMessage(ChatMessage {
                from_user_id: "1".into(),
                from_username: "alice".into(),
                content: req.content,
                message_type: req.message_type,
                timestamp: now,
                conversation_type: ConversationType::Single,
                group_id: None,
                to_user_id: req.to_user_id,
            }),
            Payload::UserListResponse(UserListResponse {
                users: vec![UserInfoItem {
                    user_id: "1".into(),
                    username: "alice".into(),
                    nickname: None,
                    online: true,
                }],
            }),
        ]
    });

    server
}

fn quiet(config: ClientConfig) -> ClientConfig {
    ClientConfig { heartbeat_initial_delay: Duration::from_secs(3600), ..config }
}

#[tokio::test]
async fn login_send_echo_is_one_entry() {
    let server = echo_server().await;
    let (manager, inbound) = ConnectionManager::new(quiet(server.client_config()));
    let client = ChatClient::new(manager, RecordingNotifier::new());
    let store: Arc<Store> = Arc::clone(client.store());
    let run = tokio::spawn(Runtime::new(client.clone(), EngineConfig::default()).run(inbound));

    let mut connected = store.connected.subscribe();
    assert!(client.connect().await);
    settle(&mut connected, |c| *c).await;

    let mut user = store.current_user.subscribe();
    assert!(client.login("alice", "pw").await);
    settle(&mut user, Option::is_some).await;

    let mut users = store.users.subscribe();
    assert!(client.send_message("2", "hi").await);
    // Optimistic entry is there before any server response
    assert_eq!(store.messages.get().len(), 1);
    settle(&mut users, |list| !list.is_empty()).await;

    // Optimistic entry plus echo collapse to one
    let messages = store.messages.get();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hi");
    assert_eq!(messages[0].from_user_id, "1");
    assert_eq!(server.received_payloads(MessageType::SendMessage).len(), 1);

    run.abort();
}

#[tokio::test]
async fn logout_disconnects() {
    let server = echo_server().await;
    let (manager, inbound) = ConnectionManager::new(quiet(server.client_config()));
    let client = ChatClient::new(manager, RecordingNotifier::new());
    let store = Arc::clone(client.store());
    let run = tokio::spawn(Runtime::new(client.clone(), EngineConfig::default()).run(inbound));

    assert!(client.connect().await);
    let mut user = store.current_user.subscribe();
    assert!(client.login("alice", "pw").await);
    settle(&mut user, Option::is_some).await;

    let mut connected = store.connected.subscribe();
    client.logout().await;

    assert!(server.wait_for(MessageType::Logout, WAIT).await.is_some());
    assert!(!client.transport().is_connected());
    settle(&mut connected, |c| !*c).await;
    assert!(store.current_user.get().is_none());

    run.abort();
}
