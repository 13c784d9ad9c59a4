//! In-memory snapshot of the environment table.
//!
//! Readers load an `Arc<Snapshot>` and never see a partially refreshed map:
//! a refresh builds a complete new snapshot off to the side and publishes it
//! with a single pointer swap.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;

use crate::environment::entry::EnvironmentEntry;
use crate::environment::keys::EnvironmentKey;
use crate::environment::EnvironmentError;
use crate::observability::metrics;
use crate::store::ConfigStore;

/// Immutable view of every entry as of one store read.
#[derive(Debug)]
pub struct Snapshot {
    entries: HashMap<String, EnvironmentEntry>,
    loaded_at: Option<Instant>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            loaded_at: None,
        }
    }

    fn from_entries(entries: Vec<EnvironmentEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.key_code.clone(), e)).collect(),
            loaded_at: Some(Instant::now()),
        }
    }

    /// Value for a well-known key.
    pub fn get(&self, key: EnvironmentKey) -> Result<&str, EnvironmentError> {
        self.get_code(key.code())
    }

    /// Value for a raw key code.
    pub fn get_code(&self, key_code: &str) -> Result<&str, EnvironmentError> {
        let entry = self
            .entries
            .get(key_code)
            .ok_or_else(|| EnvironmentError::NotFound {
                key_code: key_code.to_string(),
            })?;
        if entry.values.is_empty() {
            return Err(EnvironmentError::EmptyValue {
                key_code: key_code.to_string(),
            });
        }
        Ok(&entry.values)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` until the first successful refresh.
    pub fn loaded_at(&self) -> Option<Instant> {
        self.loaded_at
    }

    /// Entries sorted by key code.
    pub fn entries(&self) -> Vec<&EnvironmentEntry> {
        let mut all: Vec<_> = self.entries.values().collect();
        all.sort_by(|a, b| a.key_code.cmp(&b.key_code));
        all
    }
}

/// Process-wide cache of the environment table.
pub struct EnvironmentCache {
    current: ArcSwap<Snapshot>,
}

impl EnvironmentCache {
    /// Create an empty cache. Every lookup fails until the first refresh.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    /// Reload every entry from the store and publish them atomically.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self, store: &dyn ConfigStore) -> Result<usize, EnvironmentError> {
        let entries = match store.fetch_all().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retained = self.current.load().len(),
                    "Environment refresh failed, keeping cached entries"
                );
                metrics::record_cache_refresh(false, self.current.load().len());
                return Err(EnvironmentError::StoreUnavailable(e));
            }
        };

        let snapshot = Snapshot::from_entries(entries);
        let count = snapshot.len();
        self.current.store(Arc::new(snapshot));

        metrics::record_cache_refresh(true, count);
        tracing::info!(entries = count, "Environment cache refreshed");
        Ok(count)
    }

    /// Current snapshot. Hold on to it to read several keys consistently.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Cached value for `key`. Never performs I/O.
    pub fn get(&self, key: EnvironmentKey) -> Result<String, EnvironmentError> {
        self.current.load().get(key).map(str::to_string)
    }

    /// Cached value for `key`, or `default` when absent or empty.
    pub fn get_or(&self, key: EnvironmentKey, default: &str) -> String {
        match self.current.load().get(key) {
            Ok(v) => v.to_string(),
            Err(_) => {
                tracing::warn!(key = %key, default = %default, "Environment key missing, using default");
                default.to_string()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for EnvironmentCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryConfigStore;

    fn entries(project: &str, version: &str) -> Vec<EnvironmentEntry> {
        vec![
            EnvironmentEntry::new(EnvironmentKey::ProjectId.code(), project, "test"),
            EnvironmentEntry::new(EnvironmentKey::Version.code(), version, "test"),
        ]
    }

    #[tokio::test]
    async fn empty_before_first_refresh() {
        let cache = EnvironmentCache::new();
        assert!(cache.is_empty());
        assert!(cache.snapshot().loaded_at().is_none());
        assert!(matches!(
            cache.get(EnvironmentKey::ProjectId),
            Err(EnvironmentError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn refresh_loads_store_contents() {
        let store = MemoryConfigStore::new(entries("P1", "1.0"));
        let cache = EnvironmentCache::new();

        assert_eq!(cache.refresh(&store).await.unwrap(), 2);
        assert_eq!(cache.get(EnvironmentKey::ProjectId).unwrap(), "P1");
        assert_eq!(cache.get(EnvironmentKey::Version).unwrap(), "1.0");
        assert!(cache.snapshot().loaded_at().is_some());
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let store = MemoryConfigStore::new(entries("P1", "1.0"));
        let cache = EnvironmentCache::new();
        cache.refresh(&store).await.unwrap();

        let err = cache.snapshot().get_code("nonexistent").unwrap_err();
        assert!(matches!(err, EnvironmentError::NotFound { ref key_code } if key_code == "nonexistent"));
    }

    #[tokio::test]
    async fn empty_value_is_an_error() {
        let store = MemoryConfigStore::new(vec![EnvironmentEntry::new(
            EnvironmentKey::Secret.code(),
            "",
            "test",
        )]);
        let cache = EnvironmentCache::new();
        cache.refresh(&store).await.unwrap();

        assert!(matches!(
            cache.get(EnvironmentKey::Secret),
            Err(EnvironmentError::EmptyValue { .. })
        ));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let store = MemoryConfigStore::new(entries("P1", "1.0"));
        let cache = EnvironmentCache::new();
        cache.refresh(&store).await.unwrap();

        store.set_entries(entries("P2", "2.0"));
        store.set_available(false);

        let err = cache.refresh(&store).await.unwrap_err();
        assert!(matches!(err, EnvironmentError::StoreUnavailable(_)));
        assert_eq!(cache.get(EnvironmentKey::ProjectId).unwrap(), "P1");
    }

    #[tokio::test]
    async fn refresh_drops_removed_keys() {
        let store = MemoryConfigStore::new(entries("P1", "1.0"));
        let cache = EnvironmentCache::new();
        cache.refresh(&store).await.unwrap();

        store.set_entries(vec![EnvironmentEntry::new(
            EnvironmentKey::ProjectId.code(),
            "P2",
            "test",
        )]);
        cache.refresh(&store).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.get(EnvironmentKey::Version).is_err());
    }

    #[tokio::test]
    async fn get_or_falls_back() {
        let cache = EnvironmentCache::new();
        assert_eq!(
            cache.get_or(EnvironmentKey::CloudflareIpListV4, "https://example.com/v4"),
            "https://example.com/v4"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_see_a_mixed_snapshot() {
        let store = Arc::new(MemoryConfigStore::new(entries("A", "A")));
        let cache = Arc::new(EnvironmentCache::new());
        cache.refresh(store.as_ref()).await.unwrap();

        let writer = {
            let store = store.clone();
            let cache = cache.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    let tag = if i % 2 == 0 { "B" } else { "A" };
                    store.set_entries(entries(tag, tag));
                    cache.refresh(store.as_ref()).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..1000 {
                    let snap = cache.snapshot();
                    let project = snap.get(EnvironmentKey::ProjectId).unwrap();
                    let version = snap.get(EnvironmentKey::Version).unwrap();
                    assert_eq!(project, version);
                    tokio::task::yield_now().await;
                }
            }));
        }

        writer.await.unwrap();
        for r in readers {
            r.await.unwrap();
        }
    }
}
