//! In-memory snapshot store shared by the engine and its readers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

use crate::snapshot::{IndexSnapshotSet, RefreshMode};

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Thread-safe mapping from index name to its published snapshot set.
///
/// Sets are published whole behind an `Arc`, so a reader holding a set
/// never observes a batch half-applied. Cloning the store shares it,
/// including the per-index write locks every engine on it takes.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<HashMap<String, Arc<IndexSnapshotSet>>>>,
    locks: LockTable,
}

/// Exclusive hold on one index for a load, refresh or discard.
///
/// Dropping the lease releases the index and forgets its lock entry once
/// no other task holds or waits on it.
#[derive(Debug)]
pub(crate) struct IndexLease {
    index: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockTable,
}

impl Drop for IndexLease {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let mut locks = lock_table(&self.locks);
        let mutex = Arc::clone(OwnedMutexGuard::mutex(&guard));
        drop(guard);
        // One reference in the table, one here: nobody else is queued.
        if Arc::strong_count(&mutex) == 2 {
            locks.remove(&self.index);
        }
    }
}

fn lock_table(locks: &LockTable) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
    locks.lock().expect("index lock table is not poisoned")
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current published set for `index`, if any.
    pub async fn get(&self, index: &str) -> Option<Arc<IndexSnapshotSet>> {
        let sets = self.inner.read().await;
        sets.get(index).cloned()
    }

    /// Refresh mode of `index`; `Uninitialized` when nothing is published.
    pub async fn mode(&self, index: &str) -> RefreshMode {
        self.get(index)
            .await
            .map(|set| set.mode())
            .unwrap_or(RefreshMode::Uninitialized)
    }

    /// Replaces whatever was published for the set's index.
    pub async fn publish(&self, set: IndexSnapshotSet) -> Arc<IndexSnapshotSet> {
        let set = Arc::new(set);
        let mut sets = self.inner.write().await;
        sets.insert(set.index().to_owned(), Arc::clone(&set));
        set
    }

    /// Drops the published set of one index.
    pub async fn remove(&self, index: &str) -> Option<Arc<IndexSnapshotSet>> {
        let mut sets = self.inner.write().await;
        sets.remove(index)
    }

    /// Drops every published set.
    pub async fn clear(&self) {
        let mut sets = self.inner.write().await;
        sets.clear();
    }

    /// Waits for exclusive use of `index` among every engine sharing this store.
    pub(crate) async fn lease(&self, index: &str) -> IndexLease {
        let mutex = {
            let mut locks = lock_table(&self.locks);
            Arc::clone(locks.entry(index.to_owned()).or_default())
        };
        IndexLease {
            index: index.to_owned(),
            guard: Some(mutex.lock_owned().await),
            locks: Arc::clone(&self.locks),
        }
    }

    #[cfg(test)]
    fn leased_indices(&self) -> usize {
        lock_table(&self.locks).len()
    }

    /// Names of indices with a published set, sorted.
    pub async fn indices(&self) -> Vec<String> {
        let sets = self.inner.read().await;
        let mut names: Vec<String> = sets.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SymbolFamily, UtcDateTime};

    fn empty_set(index: &str) -> IndexSnapshotSet {
        IndexSnapshotSet::baseline(index, SymbolFamily::Numeric, Vec::new(), UtcDateTime::now())
    }

    #[tokio::test]
    async fn publish_replaces_previous_set() {
        let store = SnapshotStore::new();
        assert_eq!(store.mode("HSI").await, RefreshMode::Uninitialized);

        let first = store.publish(empty_set("HSI")).await;
        let second = store.publish(empty_set("HSI")).await;

        assert_eq!(store.len().await, 1);
        let current = store.get("HSI").await.expect("published");
        assert!(Arc::ptr_eq(&current, &second));
        assert!(!Arc::ptr_eq(&current, &first));
        assert_eq!(store.mode("HSI").await, RefreshMode::BaselineReady);
    }

    #[tokio::test]
    async fn remove_and_clear_tear_down_sets() {
        let store = SnapshotStore::new();
        store.publish(empty_set("HSI")).await;
        store.publish(empty_set("SP 500")).await;
        assert_eq!(store.indices().await, vec!["HSI", "SP 500"]);

        assert!(store.remove("HSI").await.is_some());
        assert!(store.get("HSI").await.is_none());

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn lease_entries_are_forgotten_once_released() {
        let store = SnapshotStore::new();
        let first = store.lease("HSI").await;
        assert_eq!(store.leased_indices(), 1);

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let _lease = store.lease("HSI").await;
            })
        };
        tokio::task::yield_now().await;
        drop(first);
        waiter.await.expect("waiter finishes");

        assert_eq!(store.leased_indices(), 0);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = SnapshotStore::new();
        let reader = store.clone();
        store.publish(empty_set("HSTECH")).await;
        assert!(reader.get("HSTECH").await.is_some());
    }
}
