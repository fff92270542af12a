//! Short-lived in-memory cache of rendered feeds.
//!
//! Entries are keyed by the full request triple `(url, selector, limit)` and
//! expire a fixed TTL after they were stored. There is no size bound and a
//! fresh entry is never dropped. Expired entries are never served; they stay
//! in memory until overwritten or removed by [`FeedCache::evict_expired`].
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Default TTL for rendered feeds (5 minutes)
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Identifies one rendered feed.
///
/// Kept as a structured key so no component value can collide with
/// another by containing a separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub selector: String,
    pub limit: usize,
}

impl CacheKey {
    pub fn new(url: impl Into<String>, selector: impl Into<String>, limit: usize) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
            limit,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    expires_at: DateTime<Utc>,
    body: String,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Process-wide feed cache shared by all request handlers.
///
/// Every read and write goes through a single mutex. The lock is never held
/// across an `.await`.
#[derive(Default)]
pub struct FeedCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached body if an entry exists and `now` is before its
    /// expiry. Missing and expired entries look the same to the caller.
    pub fn lookup(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<String> {
        match self.lock().get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.body.clone()),
            _ => None,
        }
    }

    /// Inserts or overwrites the entry for `key`, expiring at `now + ttl`.
    pub fn store(&self, key: CacheKey, body: String, now: DateTime<Utc>, ttl: TimeDelta) {
        let expires_at = now
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.lock().insert(key, CacheEntry { expires_at, body });
    }

    /// Delete all entries that are no longer fresh at `now`.
    ///
    /// Returns the number of entries evicted.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written,
        // so a poisoned map is still usable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Converts a TTL in seconds to a [`TimeDelta`], saturating at the maximum.
pub fn ttl_from_secs(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}
