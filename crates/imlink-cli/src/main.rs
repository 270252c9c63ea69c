//! imlink terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Connect to a local server
//! imlink --host 127.0.0.1 --port 8889
//!
//! # Verbose connection logging
//! RUST_LOG=imlink_client=debug imlink
//! ```
//!
//! Commands are read line by line from stdin; `/help` lists them. Plain text
//! is sent to the conversation opened with `/open`.

mod command;
mod view;

use clap::Parser;
use imlink_app::{ChatClient, EngineConfig, LogNotifier, Runtime};
use imlink_client::{ClientConfig, ConnectionManager};
use imlink_proto::payloads::friend::FriendHandleAction;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    command::{Command, CommandError, HELP},
    view::{View, emit},
};

type Client = ChatClient<ConnectionManager, LogNotifier>;

/// imlink chat client
#[derive(Parser, Debug)]
#[command(name = "imlink")]
#[command(about = "Terminal client for the imlink chat protocol")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = imlink_client::DEFAULT_PORT)]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Logs go to stderr; stdout is the conversation.
    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let config = ClientConfig::new(args.host, args.port);
    let addr = config.addr();
    let (manager, inbound) = ConnectionManager::new(config);
    let client = ChatClient::new(manager, LogNotifier);

    let dispatch = tokio::spawn(Runtime::new(client.clone(), EngineConfig::default()).run(inbound));
    let view = View::start(client.store());

    tracing::info!("Connecting to {}", addr);
    if !client.connect().await {
        emit(&format!("* could not connect to {addr}, use /connect to retry"));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match command::parse(&line) {
            Ok(Command::Exit) => break,
            Ok(command) => execute(&client, command).await,
            Err(CommandError::Empty) => {},
            Err(e) => emit(&format!("* {e}")),
        }
    }

    client.disconnect().await;
    drop(view);
    dispatch.abort();
    Ok(())
}

async fn execute(client: &Client, command: Command) {
    let sent = match command {
        Command::Connect => client.connect().await,
        Command::Login { username, password } => client.login(&username, &password).await,
        Command::Register { username, password, nickname } => {
            client.register(&username, &password, &nickname).await
        },
        Command::Msg { to_user_id, text } => client.send_message(&to_user_id, &text).await,
        Command::GroupMsg { group_id, text } => client.send_group_message(&group_id, &text).await,
        Command::Say { text } => match client.store().active_conversation.get() {
            Some(user_id) => client.send_message(&user_id, &text).await,
            None => {
                emit("* no open conversation, use /open <user_id> or /msg");
                return;
            },
        },
        Command::Open { user_id } => {
            client.open_conversation(&user_id);
            for msg in client.store().conversation_with(&user_id) {
                emit(&format!("  {}: {}", msg.from_username, msg.content));
            }
            return;
        },
        Command::Close => {
            client.close_conversation();
            return;
        },
        Command::Friends => client.request_friend_list().await,
        Command::Groups => client.request_group_list().await,
        Command::Users => client.request_user_list().await,
        Command::Apply { username, greeting } => {
            client.send_friend_apply(&username, greeting.as_deref(), None).await
        },
        Command::Accept { apply_id } => {
            client.handle_friend_apply(&apply_id, FriendHandleAction::Accept, None).await
        },
        Command::Reject { apply_id } => {
            client.handle_friend_apply(&apply_id, FriendHandleAction::Reject, None).await
        },
        Command::Delete { user_id } => client.delete_friend(&user_id).await,
        Command::Create { name, members } => client.create_group(&name, members).await,
        Command::Members { group_id } => client.request_group_member_list(&group_id).await,
        Command::Invite { group_id, members } => {
            client.invite_group_members(&group_id, members).await
        },
        Command::Kick { group_id, user_id } => client.kick_group_member(&group_id, &user_id).await,
        Command::Quit { group_id } => client.quit_group(&group_id).await,
        Command::Dismiss { group_id } => client.dismiss_group(&group_id).await,
        Command::Logout => {
            client.logout().await;
            return;
        },
        Command::Help => {
            emit(HELP);
            return;
        },
        Command::Exit => return,
    };

    if !sent {
        let hint = if client.transport().is_connected() { "" } else { " (not connected)" };
        emit(&format!("* request not sent{hint}"));
    }
}
