//! In-memory TTL cache of validation results.
//!
//! Entries expire `ttl` after they were last written. Expired entries are
//! dropped lazily by [`ValidationCache::get`] and in bulk by
//! [`ValidationCache::purge_expired`], which the background sweep calls.
//! When full, the cache evicts the entry with the oldest `cached_at`
//! (insertion order, not access order).

use crate::cache::key::log_id;
use crate::clock::Clock;
use crate::protocol::models::ValidationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// A cached validation result with its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached verdict.
    pub value: ValidationResult,

    /// When the entry was last written.
    pub cached_at: DateTime<Utc>,

    /// `cached_at + ttl`.
    pub expires_at: DateTime<Utc>,

    /// Successful lookups since the entry was last written.
    pub hit_count: u64,

    /// Write order, breaks `cached_at` ties on eviction.
    sequence: u64,
}

impl CacheEntry {
    /// Whether the entry is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Resident entries, including expired ones not yet swept.
    pub entries: usize,

    /// Configured capacity (0 = caching disabled).
    pub max_size: usize,

    /// Lookups answered from the cache.
    pub hit_count: u64,

    /// Lookups that found nothing live.
    pub miss_count: u64,

    /// `hit_count / (hit_count + miss_count)`, 0 before any lookup.
    pub hit_ratio: f64,

    /// Entry lifetime in seconds.
    pub ttl_seconds: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    next_sequence: u64,
    generation: u64,
}

/// Concurrent TTL cache of validation results keyed by license key hash.
pub struct ValidationCache {
    state: RwLock<CacheState>,
    ttl: Duration,
    ttl_delta: chrono::Duration,
    max_size: usize,
    clock: Arc<dyn Clock>,
}

impl ValidationCache {
    /// Create a cache holding at most `max_size` entries for `ttl` each.
    ///
    /// A `max_size` of zero disables caching: every `set` is ignored.
    pub fn new(ttl: Duration, max_size: usize, clock: Arc<dyn Clock>) -> Self {
        // Out-of-range TTLs are clamped to a millennium; `set` saturates anyway.
        let ttl_delta =
            chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365_000));

        Self {
            state: RwLock::new(CacheState::default()),
            ttl,
            ttl_delta,
            max_size,
            clock,
        }
    }

    /// Look up a live entry.
    ///
    /// A hit bumps the entry's `hit_count` and the global hit counter. An
    /// absent or expired key counts as a miss; an expired entry is removed.
    pub fn get(&self, key: &str) -> Option<ValidationResult> {
        let now = self.clock.now_utc();
        let mut guard = self.write();
        let state = &mut *guard;

        match state.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.hit_count += 1;
                let value = entry.value.clone();
                state.hits += 1;
                tracing::debug!(action = "cache_hit", key = log_id(key), "Validation cache hit");
                Some(value)
            }
            Some(_) => {
                state.entries.remove(key);
                state.misses += 1;
                tracing::debug!(action = "cache_expired", key = log_id(key), "Validation cache entry expired");
                None
            }
            None => {
                state.misses += 1;
                tracing::debug!(action = "cache_miss", key = log_id(key), "Validation cache miss");
                None
            }
        }
    }

    /// Insert or wholesale-refresh an entry.
    ///
    /// Inserting a new key into a full cache first evicts the entry with the
    /// smallest `cached_at`; on a tie the earliest write goes. Overwriting an
    /// existing key never evicts.
    pub fn set(&self, key: &str, value: ValidationResult) {
        self.insert(key, value, None);
    }

    /// Like [`set`](Self::set), but only if no [`invalidate`](Self::invalidate)
    /// or [`clear`](Self::clear) ran since `generation` was read from
    /// [`generation`](Self::generation). Returns whether the entry was stored.
    ///
    /// Lets a caller that fetched `value` outside the lock avoid resurrecting
    /// an entry that was invalidated while it waited.
    pub fn set_if_current(&self, key: &str, value: ValidationResult, generation: u64) -> bool {
        self.insert(key, value, Some(generation))
    }

    /// Invalidation counter, bumped by every `invalidate` and `clear`.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    fn insert(&self, key: &str, value: ValidationResult, expected: Option<u64>) -> bool {
        if self.max_size == 0 {
            return false;
        }

        let now = self.clock.now_utc();
        let expires_at = now
            .checked_add_signed(self.ttl_delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut state = self.write();
        if expected.is_some_and(|generation| generation != state.generation) {
            tracing::debug!(
                action = "cache_stale_write",
                key = log_id(key),
                "Dropped validation result invalidated in flight"
            );
            return false;
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        if !state.entries.contains_key(key) && state.entries.len() >= self.max_size {
            if let Some(victim) = oldest_key(&state.entries) {
                state.entries.remove(&victim);
                tracing::debug!(
                    action = "cache_evict",
                    key = log_id(&victim),
                    max_size = self.max_size,
                    "Evicted oldest validation cache entry"
                );
            }
        }

        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                cached_at: now,
                expires_at,
                hit_count: 0,
                sequence,
            },
        );
        true
    }

    /// Remove an entry regardless of its age. Returns whether one existed.
    ///
    /// Always advances the generation, so in-flight
    /// [`set_if_current`](Self::set_if_current) calls for any key are dropped.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = {
            let mut state = self.write();
            state.generation += 1;
            state.entries.remove(key).is_some()
        };
        if removed {
            tracing::debug!(action = "cache_invalidate", key = log_id(key), "Invalidated validation cache entry");
        }
        removed
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_utc();
        let mut state = self.write();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        before - state.entries.len()
    }

    /// Remove all entries. Hit and miss counters are kept.
    pub fn clear(&self) {
        let mut state = self.write();
        state.generation += 1;
        state.entries.clear();
    }

    /// Copy of the entry stored under `key`, expired or not. Does not count
    /// as a lookup.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.read().entries.get(key).cloned()
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Whether no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.read();
        let total = state.hits + state.misses;
        let hit_ratio = if total == 0 {
            0.0
        } else {
            state.hits as f64 / total as f64
        };

        CacheStats {
            entries: state.entries.len(),
            max_size: self.max_size,
            hit_count: state.hits,
            miss_count: state.misses,
            hit_ratio,
            ttl_seconds: self.ttl.as_secs(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn oldest_key(entries: &HashMap<String, CacheEntry>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, entry)| (entry.cached_at, entry.sequence))
        .map(|(key, _)| key.clone())
}
