//! Reconciliation tuning.

use std::time::Duration;

/// Settings for the [`crate::Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Messages from the same author with the same content whose timestamps
    /// differ by less than this many seconds are treated as one message.
    pub dedup_window_secs: u64,
    /// Auth-required errors arriving within this window of the last handled
    /// one are dropped.
    pub auth_error_throttle: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { dedup_window_secs: 5, auth_error_throttle: Duration::from_millis(1500) }
    }
}
