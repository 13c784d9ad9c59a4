//! In-memory config store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;

use crate::config::SeedEntry;
use crate::environment::EnvironmentEntry;
use crate::store::{ConfigStore, StoreError};

/// Entries held in process memory.
///
/// Backs local development (seeded from `[[environment.seed]]`) and tests.
pub struct MemoryConfigStore {
    entries: ArcSwap<Vec<EnvironmentEntry>>,
    available: AtomicBool,
}

impl MemoryConfigStore {
    pub fn new(entries: Vec<EnvironmentEntry>) -> Self {
        Self {
            entries: ArcSwap::from_pointee(entries),
            available: AtomicBool::new(true),
        }
    }

    /// Build a store from configuration seed entries.
    pub fn from_seed(seed: &[SeedEntry]) -> Self {
        Self::new(
            seed.iter()
                .map(|s| EnvironmentEntry::new(&s.key_code, &s.values, &s.created_by))
                .collect(),
        )
    }

    /// Replace all entries.
    pub fn set_entries(&self, entries: Vec<EnvironmentEntry>) {
        self.entries.store(Arc::new(entries));
    }

    /// Simulate the store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store marked unavailable".into()))
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn fetch_all(&self) -> Result<Vec<EnvironmentEntry>, StoreError> {
        self.check_available()?;
        Ok(self.entries.load().as_ref().clone())
    }

    async fn find_by_key(&self, key_code: &str) -> Result<Option<EnvironmentEntry>, StoreError> {
        self.check_available()?;
        Ok(self
            .entries
            .load()
            .iter()
            .find(|e| e.key_code == key_code)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_entries_are_served() {
        let store = MemoryConfigStore::from_seed(&[SeedEntry {
            key_code: "10000001".into(),
            values: "P1".into(),
            created_by: "ops".into(),
        }]);

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].created_by, "ops");

        let found = store.find_by_key("10000001").await.unwrap().unwrap();
        assert_eq!(found.values, "P1");
        assert!(store.find_by_key("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_store_errors() {
        let store = MemoryConfigStore::new(Vec::new());
        store.set_available(false);
        assert!(matches!(store.fetch_all().await, Err(StoreError::Unavailable(_))));

        store.set_available(true);
        assert!(store.fetch_all().await.unwrap().is_empty());
    }
}
