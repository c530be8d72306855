// ABOUTME: Identity-scoped sandbox reuse cache keyed by template, port, and caller identity
// ABOUTME: Injected into the allocator; eviction is liveness-probe-triggered, never timed

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One live cache entry. At most one per reuse key; the sandbox id always
/// refers to a sandbox the owning allocator created itself.
#[derive(Debug, Clone)]
pub struct ReuseEntry {
    pub sandbox_id: String,
    pub last_used_at: DateTime<Utc>,
}

/// Process-lifetime cache mapping reuse keys to live sandboxes.
///
/// Concurrent allocations for the same key may race and each create a
/// sandbox; the cache is an at-most-one-live-sandbox optimization, not a
/// serialization point.
#[derive(Debug, Default)]
pub struct ReuseCache {
    entries: RwLock<HashMap<String, ReuseEntry>>,
}

impl ReuseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the reuse key, or `None` when the caller identity is empty
    /// (anonymous callers never share sandboxes).
    pub fn key(template: &str, port: u16, user_id: Option<&str>) -> Option<String> {
        let user = user_id.unwrap_or("").trim();
        if user.is_empty() {
            return None;
        }
        Some(format!("{template}::{port}::{user}"))
    }

    pub async fn get(&self, key: &str) -> Option<ReuseEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: &str, sandbox_id: &str) {
        self.entries.write().await.insert(
            key.to_string(),
            ReuseEntry {
                sandbox_id: sandbox_id.to_string(),
                last_used_at: Utc::now(),
            },
        );
    }

    /// Refresh the last-used timestamp after a successful reuse.
    pub async fn touch(&self, key: &str) {
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            entry.last_used_at = Utc::now();
        }
    }

    /// Drop a stale entry after a failed liveness probe.
    pub async fn evict(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
