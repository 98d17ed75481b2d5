//! Window counter storage.
//!
//! # Responsibilities
//! - Hold one `RateLimitEntry` per `scope:client` key
//! - Make the reset-or-increment step atomic per key
//! - Drop expired windows on sweep
//!
//! # Design Decisions
//! - The store is the concurrency seam: `MemoryWindowStore` relies on the
//!   shard lock held by a DashMap entry guard; a shared external store can
//!   implement `WindowStore` with its own atomic increment
//! - No `.await` inside a read-modify-write

use dashmap::DashMap;

/// Counter for one key within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    /// Unix milliseconds at which the window ends.
    pub window_reset_at: u64,
}

impl RateLimitEntry {
    fn fresh(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 0,
            window_reset_at: now_ms.saturating_add(window_ms),
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.window_reset_at <= now_ms
    }
}

pub trait WindowStore: Send + Sync {
    /// Count one request against `key`, opening a fresh window first when
    /// none exists or the stored one has ended. Returns the updated entry.
    fn hit(&self, key: &str, now_ms: u64, window_ms: u64) -> RateLimitEntry;

    /// Remove entries whose window has ended. Returns how many were removed.
    fn sweep(&self, now_ms: u64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryWindowStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e.value())
    }
}

impl WindowStore for MemoryWindowStore {
    fn hit(&self, key: &str, now_ms: u64, window_ms: u64) -> RateLimitEntry {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry::fresh(now_ms, window_ms));

        if entry.is_expired(now_ms) {
            *entry = RateLimitEntry::fresh(now_ms, window_ms);
        }
        entry.count = entry.count.saturating_add(1);
        *entry
    }

    fn sweep(&self, now_ms: u64) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now_ms);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
