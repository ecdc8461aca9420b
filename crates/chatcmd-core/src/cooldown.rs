//! Per-sender command cooldowns.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::tree::NodeId;

/// Last successful use of each (sender, root command) pair.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_used: Mutex<HashMap<(String, NodeId), Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left before `sender` may run `command` again, if any. An
    /// expired window is dropped.
    pub async fn remaining(
        &self,
        sender: &str,
        command: NodeId,
        cooldown: Duration,
    ) -> Option<Duration> {
        let mut last_used = self.last_used.lock().await;
        let key = (sender.to_string(), command);
        let left = cooldown
            .checked_sub(last_used.get(&key)?.elapsed())
            .filter(|left| !left.is_zero());
        if left.is_none() {
            last_used.remove(&key);
        }
        left
    }

    /// Number of windows currently held.
    pub async fn len(&self) -> usize {
        self.last_used.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Start a new cooldown window for `sender` on `command`.
    pub async fn record(&self, sender: &str, command: NodeId) {
        self.last_used
            .lock()
            .await
            .insert((sender.to_string(), command), Instant::now());
    }
}
