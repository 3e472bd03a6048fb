//! Deduplicating permanent cache in front of a dataset source.
//!
//! Boundary datasets are fetched at most once per process: the first caller
//! for a kind becomes the leader and performs the upstream fetch, while
//! concurrent callers for the same kind follow a watch channel and receive
//! the leader's outcome, success or failure alike. Successes are cached
//! forever; failures are broadcast but never cached, so the next caller
//! after a failure starts a fresh fetch.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{watch, Mutex};

use crate::collection::FeatureCollection;
use crate::error::GeodataError;
use crate::source::{DatasetKind, DatasetSource};

/// Outcome broadcast on an in-flight channel; `None` until the leader
/// finishes.
type FetchOutcome = Option<Result<Arc<FeatureCollection>, GeodataError>>;

/// Who a caller turned out to be for an in-flight fetch.
enum Role {
    Leader(watch::Sender<FetchOutcome>),
    Follower(watch::Receiver<FetchOutcome>),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Per-process dataset cache with single-flight fetching.
pub struct DatasetStore {
    source: DatasetSource,
    cache: DashMap<DatasetKind, Arc<FeatureCollection>>,
    inflight: Mutex<HashMap<DatasetKind, watch::Receiver<FetchOutcome>>>,
}

impl DatasetStore {
    /// Build a store over any dataset source.
    pub fn new(source: impl Into<DatasetSource>) -> Self {
        Self {
            source: source.into(),
            cache: DashMap::new(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    /// The cached collection for a kind, if one has been loaded.
    pub fn cached(&self, kind: DatasetKind) -> Option<Arc<FeatureCollection>> {
        self.cache.get(&kind).map(|entry| Arc::clone(&entry))
    }

    /// Load a dataset, fetching it at most once across concurrent callers.
    pub async fn load(&self, kind: DatasetKind) -> Result<Arc<FeatureCollection>, GeodataError> {
        loop {
            if let Some(cached) = self.cached(kind) {
                return Ok(cached);
            }

            let role = {
                let mut inflight = self.inflight.lock().await;
                // Re-check under the lock: a leader may have published
                // between the fast path above and acquiring the lock.
                if let Some(cached) = self.cached(kind) {
                    return Ok(cached);
                }
                match inflight.get(&kind) {
                    Some(rx) => Role::Follower(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        inflight.insert(kind, rx);
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Leader(tx) => return self.fetch_and_publish(kind, tx).await,
                Role::Follower(mut rx) => {
                    loop {
                        if let Some(outcome) = rx.borrow_and_update().clone() {
                            return outcome;
                        }
                        if rx.changed().await.is_err() {
                            // The leader was dropped without publishing.
                            // Clear its channel and retry from the top; this
                            // caller may become the next leader.
                            self.clear_stale_inflight(kind, &rx).await;
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Leader path: fetch upstream, cache on success, broadcast the outcome.
    async fn fetch_and_publish(
        &self,
        kind: DatasetKind,
        tx: watch::Sender<FetchOutcome>,
    ) -> Result<Arc<FeatureCollection>, GeodataError> {
        let outcome = match self.source.fetch(kind).await {
            Ok(collection) => {
                tracing::debug!(
                    dataset = %kind,
                    features = collection.len(),
                    "boundary dataset cached"
                );
                Ok(Arc::new(collection))
            }
            Err(e) => {
                tracing::warn!(dataset = %kind, error = %e, "boundary dataset fetch failed");
                Err(e)
            }
        };

        // Order matters: publish to the cache before retiring the in-flight
        // entry, so a caller that misses the channel finds the cache instead.
        if let Ok(collection) = &outcome {
            self.cache.insert(kind, Arc::clone(collection));
        }
        self.inflight.lock().await.remove(&kind);
        let _ = tx.send(Some(outcome.clone()));
        outcome
    }

    /// Drop an in-flight entry whose leader died, unless a newer fetch has
    /// already replaced it.
    async fn clear_stale_inflight(&self, kind: DatasetKind, rx: &watch::Receiver<FetchOutcome>) {
        let mut inflight = self.inflight.lock().await;
        let is_same = inflight
            .get(&kind)
            .is_some_and(|held| held.same_channel(rx));
        if is_same {
            inflight.remove(&kind);
        }
    }
}

impl std::fmt::Debug for DatasetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetStore")
            .field("source", &self.source)
            .field("cached_kinds", &self.cache.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Feature;
    use crate::source::MemoryDatasetSource;
    use serde_json::json;

    fn collection_named(name: &str) -> FeatureCollection {
        let feature: Feature = serde_json::from_value(json!({
            "properties": { "id": 1, "name": name }
        }))
        .unwrap();
        FeatureCollection {
            features: vec![feature],
        }
    }

    fn memory_store() -> DatasetStore {
        DatasetStore::new(
            MemoryDatasetSource::new()
                .with_dataset(DatasetKind::Cantons, collection_named("Zürich")),
        )
    }

    fn source_fetches(store: &DatasetStore) -> u64 {
        match store.source() {
            DatasetSource::Memory(source) => source.fetch_count(),
            other => panic!("expected memory source, got {other:?}"),
        }
    }

    // ── caching ──

    #[tokio::test]
    async fn repeated_loads_hit_the_source_once() {
        let store = memory_store();
        assert!(store.cached(DatasetKind::Cantons).is_none());

        let first = store.load(DatasetKind::Cantons).await.unwrap();
        let second = store.load(DatasetKind::Cantons).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source_fetches(&store), 1);
        assert!(store.cached(DatasetKind::Cantons).is_some());
    }

    #[tokio::test]
    async fn kinds_cache_independently() {
        let store = DatasetStore::new(
            MemoryDatasetSource::new()
                .with_dataset(DatasetKind::Cantons, collection_named("Zürich"))
                .with_dataset(DatasetKind::Districts, collection_named("Affoltern")),
        );

        store.load(DatasetKind::Cantons).await.unwrap();
        store.load(DatasetKind::Districts).await.unwrap();
        store.load(DatasetKind::Cantons).await.unwrap();

        assert_eq!(source_fetches(&store), 2);
    }

    // ── failure handling ──

    #[tokio::test]
    async fn failures_are_returned_but_never_cached() {
        let store = memory_store();

        let first = store.load(DatasetKind::Districts).await.unwrap_err();
        let second = store.load(DatasetKind::Districts).await.unwrap_err();

        assert_eq!(
            first,
            GeodataError::NotConfigured {
                kind: DatasetKind::Districts
            }
        );
        assert_eq!(first, second);
        // Both loads reached the source: the failure was not cached.
        assert_eq!(source_fetches(&store), 2);
        assert!(store.cached(DatasetKind::Districts).is_none());
    }

    #[tokio::test]
    async fn failure_on_one_kind_leaves_other_kinds_usable() {
        let store = memory_store();

        store.load(DatasetKind::Communities).await.unwrap_err();
        let cantons = store.load(DatasetKind::Cantons).await.unwrap();
        assert_eq!(cantons.len(), 1);
    }
}
