use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};

use super::DEFAULT_MAX_ENTRIES;
use crate::timestamp::UnixTimestamp;

/// Default lifetime of a consumed-mandate record.
pub const DEFAULT_CONSUMED_TTL_SECS: u64 = 3600;

/// Settings for [`ConsumedMandateCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumedCacheConfig {
    /// Lifetime applied when [`ConsumedMandateCache::consume_mandate`] is
    /// called without an explicit TTL.
    pub default_ttl_secs: u64,
    /// Number of records above which a new consumption first sweeps
    /// expired records.
    pub max_entries: usize,
}

impl Default for ConsumedCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_CONSUMED_TTL_SECS,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Counters reported by [`ConsumedMandateCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Successful first consumptions since creation.
    pub total_consumed: u64,
    /// Lookups that found a live record.
    pub cache_hits: u64,
    /// Lookups that found nothing live.
    pub cache_misses: u64,
    /// Records currently held, including expired ones not yet cleaned up.
    pub entries: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry<P> {
    payload: P,
    expires_at: UnixTimestamp,
}

impl<P> CacheEntry<P> {
    fn is_live(&self, now: UnixTimestamp) -> bool {
        now < self.expires_at
    }
}

/// A content-addressed record of consumed mandates.
///
/// Keys are fingerprints of mandate content (see
/// [`fingerprint`](crate::canonical::fingerprint)), so a retry carrying the
/// identical payload is recognized even when it arrives under a new id.
/// The first caller to consume a fingerprint wins; later callers see `false`
/// until the record expires or is revoked.
#[derive(Debug)]
pub struct ConsumedMandateCache<P = serde_json::Value> {
    entries: DashMap<String, CacheEntry<P>>,
    default_ttl_secs: u64,
    max_entries: usize,
    total_consumed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl<P> Default for ConsumedMandateCache<P> {
    fn default() -> Self {
        Self::new(ConsumedCacheConfig::default())
    }
}

impl<P> ConsumedMandateCache<P> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: ConsumedCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl_secs: config.default_ttl_secs,
            max_entries: config.max_entries.max(1),
            total_consumed: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    /// Marks `hash` as consumed, storing `payload` for `ttl_secs` (or the
    /// configured default).
    ///
    /// Returns `true` if this call consumed the hash and `false` if a live
    /// record already existed. Once the cache holds `max_entries` records a
    /// new hash first triggers [`cleanup_expired`](Self::cleanup_expired);
    /// live records are never evicted.
    pub fn consume_mandate(
        &self,
        hash: &str,
        payload: P,
        ttl_secs: Option<u64>,
        now: UnixTimestamp,
    ) -> bool {
        // Sweep before taking the entry guard: `retain` locks every shard.
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(hash) {
            let removed = self.cleanup_expired(now);
            #[cfg(feature = "telemetry")]
            tracing::debug!(removed, "consumed cache at capacity, ran cleanup");
            #[cfg(not(feature = "telemetry"))]
            let _ = removed;
        }
        let expires_at = now + ttl_secs.unwrap_or(self.default_ttl_secs);
        let record = CacheEntry {
            payload,
            expires_at,
        };
        let consumed = match self.entries.entry(hash.to_owned()) {
            Entry::Occupied(mut existing) => {
                if existing.get().is_live(now) {
                    false
                } else {
                    existing.insert(record);
                    true
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        };
        if consumed {
            self.total_consumed.fetch_add(1, Ordering::Relaxed);
        } else {
            #[cfg(feature = "telemetry")]
            tracing::warn!(hash, "mandate content already consumed");
        }
        consumed
    }

    /// Returns whether `hash` has a live record.
    #[must_use]
    pub fn is_consumed(&self, hash: &str, now: UnixTimestamp) -> bool {
        self.entries
            .get(hash)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Removes the record for `hash`, making it consumable again.
    ///
    /// Returns `true` if a record was removed.
    pub fn revoke_mandate(&self, hash: &str) -> bool {
        self.entries.remove(hash).is_some()
    }

    /// Removes expired records and returns how many were removed.
    pub fn cleanup_expired(&self, now: UnixTimestamp) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = entry.is_live(now);
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    /// Returns the running counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_consumed: self.total_consumed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

impl<P: Clone> ConsumedMandateCache<P> {
    /// Returns the payload stored for `hash` if its record is live.
    ///
    /// Counts a hit or a miss.
    #[must_use]
    pub fn get_mandate(&self, hash: &str, now: UnixTimestamp) -> Option<P> {
        let payload = self
            .entries
            .get(hash)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.payload.clone());
        let counter = if payload.is_some() {
            &self.cache_hits
        } else {
            &self.cache_misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(secs: u64) -> UnixTimestamp {
        UnixTimestamp::from_secs(secs)
    }

    #[test]
    fn test_first_consumer_wins() {
        let cache = ConsumedMandateCache::default();
        assert!(cache.consume_mandate("h1", json!({"id": "pm-1"}), None, ts(0)));
        assert!(!cache.consume_mandate("h1", json!({"id": "pm-2"}), None, ts(10)));
        assert_eq!(cache.get_mandate("h1", ts(10)), Some(json!({"id": "pm-1"})));
        assert!(cache.is_consumed("h1", ts(10)));
    }

    #[test]
    fn test_ttl_and_default_ttl() {
        let cache: ConsumedMandateCache<u32> =
            ConsumedMandateCache::new(ConsumedCacheConfig {
                default_ttl_secs: 60,
                ..ConsumedCacheConfig::default()
            });
        assert!(cache.consume_mandate("a", 1, None, ts(100)));
        assert!(cache.consume_mandate("b", 2, Some(5), ts(100)));

        assert!(cache.is_consumed("a", ts(159)));
        assert!(!cache.is_consumed("a", ts(160)));
        assert!(!cache.is_consumed("b", ts(105)));

        assert!(cache.consume_mandate("b", 3, Some(5), ts(105)));
        assert_eq!(cache.get_mandate("b", ts(106)), Some(3));
    }

    #[test]
    fn test_revoke_makes_hash_consumable() {
        let cache: ConsumedMandateCache<()> = ConsumedMandateCache::default();
        assert!(cache.consume_mandate("h", (), None, ts(0)));
        assert!(cache.revoke_mandate("h"));
        assert!(!cache.revoke_mandate("h"));
        assert!(cache.consume_mandate("h", (), None, ts(1)));
    }

    #[test]
    fn test_counters() {
        let cache: ConsumedMandateCache<&str> = ConsumedMandateCache::default();
        cache.consume_mandate("h", "p", Some(10), ts(0));
        cache.consume_mandate("h", "p", Some(10), ts(1));
        let _ = cache.get_mandate("h", ts(2));
        let _ = cache.get_mandate("h", ts(3));
        let _ = cache.get_mandate("missing", ts(3));
        let _ = cache.get_mandate("h", ts(10));

        assert_eq!(
            cache.stats(),
            CacheStats {
                total_consumed: 1,
                cache_hits: 2,
                cache_misses: 2,
                entries: 1,
            }
        );
        assert_eq!(cache.cleanup_expired(ts(10)), 1);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_capacity_pressure_sweeps_expired_records() {
        let cache: ConsumedMandateCache<u8> = ConsumedMandateCache::new(ConsumedCacheConfig {
            default_ttl_secs: 10,
            max_entries: 2,
        });
        assert!(cache.consume_mandate("a", 1, None, ts(0)));
        assert!(cache.consume_mandate("b", 2, Some(100), ts(0)));

        // "a" expired, so the next new hash sweeps it out.
        assert!(cache.consume_mandate("c", 3, None, ts(20)));
        assert_eq!(cache.stats().entries, 2);
        assert!(cache.is_consumed("b", ts(20)));

        // Both records live: the bound is soft and nothing is evicted.
        assert!(cache.consume_mandate("d", 4, None, ts(21)));
        assert_eq!(cache.stats().entries, 3);
        assert!(!cache.consume_mandate("b", 5, None, ts(21)));
    }
}
