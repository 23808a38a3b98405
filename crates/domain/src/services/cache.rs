use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use metrics::{counter, gauge};
use parking_lot::RwLock;
use tokio::{
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::debug;

/// Upper bound used when `now + ttl` would overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent TTL store for serialized responses.
///
/// Reads share the lock, writes are exclusive. Expired entries are hidden
/// from [`ResponseCache::get`] immediately and physically removed by
/// [`ResponseCache::sweep_expired`], which [`ResponseCache::spawn_sweeper`]
/// runs on a fixed interval.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value unless it is missing or past its expiry.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: Vec<u8>, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.entries
            .write()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        gauge!("cache_entries").set(entries.len() as f64);
        if removed > 0 {
            counter!("cache_sweep_evictions_total").increment(removed as u64);
        }
        removed
    }

    /// Number of physically stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns the periodic sweep. The task holds a weak reference and exits
    /// once the cache itself is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let period = interval.max(Duration::from_millis(1));
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep_expired();
                if removed > 0 {
                    debug!(removed, "swept expired cache entries");
                }
            }
        })
    }
}
