//! Prints store changes to the terminal.

use std::{collections::BTreeMap, io::Write as _, sync::Arc};

use imlink_app::Store;
use imlink_proto::payloads::{chat::ChatMessage, group::GroupOperationResponse};
use tokio::{sync::watch, task::JoinHandle};

/// Background printers, one per followed slot. Stops on drop.
pub struct View {
    tasks: Vec<JoinHandle<()>>,
}

impl View {
    /// Start following `store`.
    pub fn start(store: &Arc<Store>) -> Self {
        let mut printed = 0usize;
        let tasks = vec![
            follow(store.connected.subscribe(), |connected| {
                Some(if *connected { "* connected".into() } else { "* disconnected".into() })
            }),
            follow(store.login_response.subscribe(), |resp| {
                resp.as_ref().map(|r| {
                    if r.success {
                        format!("* logged in as {}", r.username.as_deref().unwrap_or("?"))
                    } else {
                        format!("* login failed: {}", r.message)
                    }
                })
            }),
            follow(store.register_response.subscribe(), |resp| {
                resp.as_ref().map(|r| {
                    if r.success {
                        format!("* registered, user id {}", r.user_id.as_deref().unwrap_or("?"))
                    } else {
                        format!("* registration failed: {}", r.message)
                    }
                })
            }),
            follow(store.messages.subscribe(), move |messages| {
                let fresh = messages.get(printed..).unwrap_or_default();
                printed = messages.len();
                if fresh.is_empty() {
                    return None;
                }
                Some(fresh.iter().map(render_message).collect::<Vec<_>>().join("\n"))
            }),
            follow(store.users.subscribe(), |users| {
                let names: Vec<String> = users
                    .iter()
                    .map(|u| {
                        let status = if u.online { "" } else { " offline" };
                        format!("{}({}){status}", u.username, u.user_id)
                    })
                    .collect();
                Some(format!("* users: {}", names.join(", ")))
            }),
            follow(store.friends.subscribe(), |friends| {
                let names: Vec<String> =
                    friends.iter().map(|f| format!("{}({})", f.username, f.user_id)).collect();
                Some(format!("* friends: {}", names.join(", ")))
            }),
            follow(store.friend_apply_notifications.subscribe(), |applies| {
                applies.last().map(|a| {
                    format!(
                        "* friend request {} from {}: {} (/accept {} or /reject {})",
                        a.apply_id,
                        a.from_user.username,
                        a.greeting.as_deref().unwrap_or(""),
                        a.apply_id,
                        a.apply_id
                    )
                })
            }),
            follow(store.friend_apply_response.subscribe(), |resp| {
                resp.as_ref().map(|r| outcome("friend request", r.success, r.message.as_deref()))
            }),
            follow(store.friend_handle_response.subscribe(), |resp| {
                resp.as_ref().map(|r| outcome("handle request", r.success, r.action.as_deref()))
            }),
            follow(store.unread_counts.subscribe(), render_unread),
            follow(store.groups.subscribe(), |groups| {
                let names: Vec<String> =
                    groups.iter().map(|g| format!("{}({})", g.group_name, g.group_id)).collect();
                Some(format!("* groups: {}", names.join(", ")))
            }),
            follow(store.group_members.subscribe(), |members| {
                let lines: Vec<String> = members
                    .iter()
                    .map(|(group_id, list)| {
                        let ids: Vec<&str> = list.iter().map(|m| m.user_id.as_str()).collect();
                        format!("* members of {group_id}: {}", ids.join(", "))
                    })
                    .collect();
                (!lines.is_empty()).then(|| lines.join("\n"))
            }),
            follow(store.group_create_response.subscribe(), |resp| {
                resp.as_ref().map(|r| match (&r.group, r.success) {
                    (Some(g), true) => format!("* created group {} ({})", g.group_name, g.group_id),
                    _ => outcome("create group", false, r.error_message.as_deref()),
                })
            }),
            follow(store.group_update_info_response.subscribe(), |resp| {
                resp.as_ref().map(|r| outcome("update group", r.success, r.error_message.as_deref()))
            }),
            follow(store.group_invite_response.subscribe(), |resp| render_op("invite", resp.as_ref())),
            follow(store.group_kick_response.subscribe(), |resp| render_op("kick", resp.as_ref())),
            follow(store.group_quit_response.subscribe(), |resp| render_op("quit", resp.as_ref())),
            follow(store.group_dismiss_response.subscribe(), |resp| render_op("dismiss", resp.as_ref())),
        ];
        Self { tasks }
    }
}

impl Drop for View {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Print `render`'s output after every change to the slot.
fn follow<T, F>(mut rx: watch::Receiver<T>, mut render: F) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    F: FnMut(&T) -> Option<String> + Send + 'static,
{
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let line = render(&rx.borrow_and_update());
            if let Some(line) = line {
                emit(&line);
            }
        }
    })
}

pub(crate) fn emit(line: &str) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{line}");
}

fn render_message(msg: &ChatMessage) -> String {
    match (&msg.group_id, &msg.to_user_id) {
        (Some(group_id), _) if msg.is_group() => {
            format!("[{group_id}] {}: {}", msg.from_username, msg.content)
        },
        (_, Some(to)) => format!("{} -> {to}: {}", msg.from_username, msg.content),
        _ => format!("{}: {}", msg.from_username, msg.content),
    }
}

fn render_unread(counts: &BTreeMap<String, u32>) -> Option<String> {
    if counts.is_empty() {
        return None;
    }
    let parts: Vec<String> = counts.iter().map(|(user, n)| format!("{user}:{n}")).collect();
    Some(format!("* unread {}", parts.join(" ")))
}

fn render_op(what: &str, resp: Option<&GroupOperationResponse>) -> Option<String> {
    resp.map(|r| {
        let detail = r.error_message.as_deref().or(r.message.as_deref());
        outcome(what, r.success, detail)
    })
}

fn outcome(what: &str, success: bool, detail: Option<&str>) -> String {
    match (success, detail) {
        (true, _) => format!("* {what}: ok"),
        (false, Some(detail)) => format!("* {what} failed: {detail}"),
        (false, None) => format!("* {what} failed"),
    }
}
