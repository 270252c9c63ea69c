//! User-facing notification seam.

/// Receives a callback for each new incoming single-chat message.
pub trait Notifier: Send + Sync + 'static {
    /// A message from someone else arrived outside the open conversation.
    fn notify_message(&self, from_user_id: &str, from_username: &str, content: &str);
}

/// Notifier that writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_message(&self, from_user_id: &str, from_username: &str, content: &str) {
        tracing::info!(from_user_id, from_username, content, "New message");
    }
}
