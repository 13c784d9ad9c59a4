//! Environment service: owns the store handle and the cache.

use std::sync::Arc;

use crate::environment::cache::{EnvironmentCache, Snapshot};
use crate::environment::entry::EnvironmentEntry;
use crate::environment::keys::EnvironmentKey;
use crate::environment::EnvironmentError;
use crate::store::ConfigStore;

/// Business-level access to the environment table.
///
/// Shared through application state rather than a global.
pub struct EnvironmentService {
    store: Arc<dyn ConfigStore>,
    cache: EnvironmentCache,
}

impl EnvironmentService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            cache: EnvironmentCache::new(),
        }
    }

    /// Reload the cache from the store. This is the only mutator.
    pub async fn refresh_cache(&self) -> Result<usize, EnvironmentError> {
        self.cache.refresh(self.store.as_ref()).await
    }

    /// Cached value for a well-known key.
    pub fn get_value(&self, key: EnvironmentKey) -> Result<String, EnvironmentError> {
        self.cache.get(key)
    }

    /// Every entry, read straight from the store.
    ///
    /// An empty table is reported as [`EnvironmentError::Empty`].
    pub async fn get_all(&self) -> Result<Vec<EnvironmentEntry>, EnvironmentError> {
        let mut entries = self
            .store
            .fetch_all()
            .await
            .map_err(EnvironmentError::StoreUnavailable)?;
        if entries.is_empty() {
            tracing::warn!("Environment table is empty");
            return Err(EnvironmentError::Empty);
        }
        entries.sort_by(|a, b| a.key_code.cmp(&b.key_code));
        tracing::debug!(count = entries.len(), "Environment entries listed");
        Ok(entries)
    }

    /// One entry straight from the store.
    ///
    /// `key` is either a symbolic name such as `VERSION` or a raw key code.
    pub async fn find_entry(&self, key: &str) -> Result<Option<EnvironmentEntry>, EnvironmentError> {
        let key_code = EnvironmentKey::from_name(key).map_or(key, |k| k.code());
        self.store
            .find_by_key(key_code)
            .await
            .map_err(EnvironmentError::StoreUnavailable)
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.cache.snapshot()
    }

    pub fn cache(&self) -> &EnvironmentCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryConfigStore;

    #[tokio::test]
    async fn get_all_reports_empty_table() {
        let service = EnvironmentService::new(Arc::new(MemoryConfigStore::new(Vec::new())));
        assert!(matches!(service.get_all().await, Err(EnvironmentError::Empty)));
    }

    #[tokio::test]
    async fn get_all_is_sorted_and_bypasses_cache() {
        let store = Arc::new(MemoryConfigStore::new(vec![
            EnvironmentEntry::new("10000002", "1.0", "test"),
            EnvironmentEntry::new("10000001", "P1", "test"),
        ]));
        let service = EnvironmentService::new(store);

        let all = service.get_all().await.unwrap();
        assert_eq!(all[0].key_code, "10000001");
        assert_eq!(all[1].key_code, "10000002");
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn find_entry_accepts_name_or_code() {
        let store = Arc::new(MemoryConfigStore::new(vec![EnvironmentEntry::new(
            "10000002",
            "1.0",
            "test",
        )]));
        let service = EnvironmentService::new(store.clone());

        let by_name = service.find_entry("VERSION").await.unwrap().unwrap();
        assert_eq!(by_name.values, "1.0");
        let by_code = service.find_entry("10000002").await.unwrap().unwrap();
        assert_eq!(by_code.key_code, "10000002");
        assert!(service.find_entry("SECRET").await.unwrap().is_none());

        store.set_available(false);
        assert!(matches!(
            service.find_entry("VERSION").await,
            Err(EnvironmentError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn value_lookup_goes_through_cache() {
        let store = Arc::new(MemoryConfigStore::new(vec![EnvironmentEntry::new(
            "10000002",
            "1.0",
            "test",
        )]));
        let service = EnvironmentService::new(store.clone());
        assert!(service.get_value(EnvironmentKey::Version).is_err());

        service.refresh_cache().await.unwrap();
        assert_eq!(service.get_value(EnvironmentKey::Version).unwrap(), "1.0");

        store.set_entries(Vec::new());
        assert_eq!(service.get_value(EnvironmentKey::Version).unwrap(), "1.0");
    }
}
