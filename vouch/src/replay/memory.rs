use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{ReplayConfig, ReplayStats, ReplayStore, ReplayStoreError};
use crate::timestamp::UnixTimestamp;

/// A single-process [`ReplayStore`] backed by a sharded concurrent map.
///
/// `max_entries` is a soft bound: when an insert finds the map full it runs
/// [`cleanup`](ReplayStore::cleanup) first. Live records are never evicted,
/// so a store still full of live records grows past the bound.
#[derive(Debug)]
pub struct InMemoryReplayStore {
    records: DashMap<String, UnixTimestamp>,
    max_entries: usize,
}

impl Default for InMemoryReplayStore {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}

impl InMemoryReplayStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            records: DashMap::new(),
            max_entries: config.max_entries.max(1),
        }
    }

    /// Returns the number of records held, live or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn make_room(&self, key: &str, now: UnixTimestamp) {
        if self.records.len() < self.max_entries || self.records.contains_key(key) {
            return;
        }
        let removed = self.cleanup(now);
        #[cfg(feature = "telemetry")]
        {
            tracing::debug!(removed, "replay store at capacity, ran cleanup");
            if self.records.len() >= self.max_entries {
                tracing::warn!(
                    live = self.records.len(),
                    max_entries = self.max_entries,
                    "replay store over capacity with live records"
                );
            }
        }
        #[cfg(not(feature = "telemetry"))]
        let _ = removed;
    }
}

impl ReplayStore for InMemoryReplayStore {
    fn check_and_store(
        &self,
        key: &str,
        expires_at: UnixTimestamp,
        now: UnixTimestamp,
    ) -> Result<bool, ReplayStoreError> {
        self.make_room(key, now);
        // The entry guard holds the shard lock, so the read and the write
        // below happen as one step for this key.
        match self.records.entry(key.to_owned()) {
            Entry::Occupied(mut record) => {
                if now < *record.get() {
                    return Ok(false);
                }
                record.insert(expires_at);
                Ok(true)
            }
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
                Ok(true)
            }
        }
    }

    fn contains(&self, key: &str, now: UnixTimestamp) -> bool {
        self.records
            .get(key)
            .is_some_and(|expires_at| now < *expires_at)
    }

    fn cleanup(&self, now: UnixTimestamp) -> usize {
        let mut removed = 0;
        self.records.retain(|_, expires_at| {
            let live = now < *expires_at;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    fn stats(&self, now: UnixTimestamp) -> ReplayStats {
        let mut stats = ReplayStats::default();
        for record in &self.records {
            stats.total += 1;
            if now < *record.value() {
                stats.active += 1;
            } else {
                stats.expired += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: u64) -> UnixTimestamp {
        UnixTimestamp::from_secs(secs)
    }

    #[test]
    fn test_first_sighting_then_replay() {
        let store = InMemoryReplayStore::default();
        assert_eq!(store.check_and_store("m-1", ts(200), ts(100)), Ok(true));
        assert_eq!(store.check_and_store("m-1", ts(200), ts(150)), Ok(false));
        assert!(store.contains("m-1", ts(199)));
    }

    #[test]
    fn test_expired_id_is_reusable() {
        let store = InMemoryReplayStore::default();
        assert_eq!(store.check_and_store("m-1", ts(200), ts(100)), Ok(true));
        assert!(!store.contains("m-1", ts(200)));
        assert_eq!(store.check_and_store("m-1", ts(300), ts(200)), Ok(true));
        assert_eq!(store.check_and_store("m-1", ts(300), ts(250)), Ok(false));
    }

    #[test]
    fn test_cleanup_keeps_live_records() {
        let store = InMemoryReplayStore::default();
        store.check_and_store("a", ts(110), ts(100)).unwrap();
        store.check_and_store("b", ts(120), ts(100)).unwrap();
        store.check_and_store("c", ts(500), ts(100)).unwrap();

        assert_eq!(
            store.stats(ts(150)),
            ReplayStats {
                total: 3,
                active: 1,
                expired: 2
            }
        );
        assert_eq!(store.cleanup(ts(150)), 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains("c", ts(150)));
        assert_eq!(store.cleanup(ts(150)), 0);
    }

    #[test]
    fn test_capacity_pressure_triggers_cleanup() {
        let store = InMemoryReplayStore::new(ReplayConfig { max_entries: 2 });
        store.check_and_store("a", ts(110), ts(100)).unwrap();
        store.check_and_store("b", ts(110), ts(100)).unwrap();

        // Both records expired by now, so the insert makes room.
        assert_eq!(store.check_and_store("c", ts(300), ts(200)), Ok(true));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_full_store_still_admits_new_keys() {
        let store = InMemoryReplayStore::new(ReplayConfig { max_entries: 2 });
        store.check_and_store("a", ts(500), ts(100)).unwrap();
        store.check_and_store("b", ts(500), ts(100)).unwrap();

        assert_eq!(store.check_and_store("never-seen", ts(500), ts(100)), Ok(true));
        assert_eq!(store.len(), 3);
        // Live records survive the pressure and still report replays.
        assert_eq!(store.check_and_store("a", ts(500), ts(100)), Ok(false));
        assert_eq!(store.check_and_store("never-seen", ts(500), ts(101)), Ok(false));
    }
}
