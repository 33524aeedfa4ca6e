use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the subscription manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// How long `wait_ready` waits for the first batch (milliseconds)
    /// Default: 5000ms
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// When a scope already has a live subscription, close it and open the
    /// new one instead of rejecting the second `subscribe`.
    /// Default: false
    #[serde(default)]
    pub replace_existing: bool,
}

fn default_ready_timeout_ms() -> u64 {
    5_000
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: default_ready_timeout_ms(),
            replace_existing: false,
        }
    }
}

impl SubscriptionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ready_timeout_ms(mut self, ms: u64) -> Self {
        self.ready_timeout_ms = ms;
        self
    }

    pub fn with_replace_existing(mut self, replace: bool) -> Self {
        self.replace_existing = replace;
        self
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}
