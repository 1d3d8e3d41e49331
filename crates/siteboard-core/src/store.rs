//! Snapshot store with DashMap
//!
//! Holds the latest snapshot per website identifier. A fetch replaces the
//! entry wholesale; entries are shared as `Arc<WebsiteSnapshot>` and never
//! mutated in place.

use crate::api::SnapshotSource;
use crate::error::CoreError;
use crate::event::{EventBus, SiteEvent};
use crate::setup::needs_setup;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use siteboard_types::WebsiteSnapshot;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A freshly fetched snapshot and the setup decision made for it
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub snapshot: Arc<WebsiteSnapshot>,
    /// Evaluated once, when this snapshot was loaded
    pub needs_setup: bool,
    pub loaded_at: DateTime<Utc>,
}

/// Central snapshot store
///
/// Thread-safe; unrelated website identifiers never contend.
pub struct SnapshotStore {
    source: Arc<dyn SnapshotSource>,
    snapshots: DashMap<String, LoadedSnapshot>,
    event_bus: EventBus,
}

impl SnapshotStore {
    pub fn new(source: Arc<dyn SnapshotSource>, event_bus: EventBus) -> Self {
        Self {
            source,
            snapshots: DashMap::new(),
            event_bus,
        }
    }

    /// Get the event bus for subscribing to updates
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Fetch the current snapshot and replace the stored one
    ///
    /// On failure the previously stored snapshot (if any) is left untouched.
    /// Nothing is retried.
    pub async fn load(&self, website_id: &str) -> Result<LoadedSnapshot, CoreError> {
        debug!(website_id, "Loading website snapshot");

        let snapshot = match self.source.fetch_snapshot(website_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(website_id, error = %e, "Failed to load website snapshot");
                self.event_bus.publish(SiteEvent::SnapshotFailed {
                    website_id: website_id.to_string(),
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        if snapshot.id != website_id {
            warn!(
                website_id,
                returned_id = %snapshot.id,
                "Snapshot identifier differs from the requested one"
            );
        }
        for (expected, item) in snapshot.content.mismatched() {
            warn!(
                website_id,
                item_id = %item.id,
                expected = %expected,
                actual = %item.kind(),
                "Content item filed under the wrong collection"
            );
        }

        let loaded = LoadedSnapshot {
            needs_setup: needs_setup(&snapshot),
            snapshot: Arc::new(snapshot),
            loaded_at: Utc::now(),
        };

        self.snapshots
            .insert(website_id.to_string(), loaded.clone());

        info!(
            website_id,
            needs_setup = loaded.needs_setup,
            content_items = loaded.snapshot.content.len(),
            "Website snapshot loaded"
        );
        self.event_bus.publish(SiteEvent::SnapshotLoaded {
            website_id: website_id.to_string(),
            needs_setup: loaded.needs_setup,
        });

        Ok(loaded)
    }

    /// Latest stored snapshot, if any
    pub fn get(&self, website_id: &str) -> Option<LoadedSnapshot> {
        self.snapshots.get(website_id).map(|entry| entry.value().clone())
    }

    pub fn evict(&self, website_id: &str) -> bool {
        self.snapshots.remove(website_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use siteboard_types::{IntegrationKind, Plan};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves snapshots whose `last_sync` is set from the second fetch on
    struct SyncingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotSource for SyncingSource {
        async fn fetch_snapshot(&self, website_id: &str) -> Result<WebsiteSnapshot, CoreError> {
            if website_id == "missing" {
                return Err(CoreError::NotFound {
                    website_id: website_id.to_string(),
                });
            }
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut s =
                WebsiteSnapshot::new(website_id, "example.com", IntegrationKind::Shopify, Plan::Free);
            s.access_key = Some("abc".to_string());
            if n > 0 {
                s.last_sync = Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap());
            }
            Ok(s)
        }
    }

    fn store() -> SnapshotStore {
        SnapshotStore::new(
            Arc::new(SyncingSource {
                fetches: AtomicUsize::new(0),
            }),
            EventBus::default(),
        )
    }

    #[tokio::test]
    async fn test_load_replaces_wholesale() {
        let store = store();

        let first = store.load("w1").await.unwrap();
        assert!(first.needs_setup);

        let second = store.load("w1").await.unwrap();
        assert!(!second.needs_setup);
        assert!(!Arc::ptr_eq(&first.snapshot, &second.snapshot));

        // The first snapshot value is unchanged by the reload
        assert!(first.snapshot.last_sync.is_none());

        let stored = store.get("w1").unwrap();
        assert!(Arc::ptr_eq(&stored.snapshot, &second.snapshot));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_stored_and_publishes() {
        let store = store();
        let mut rx = store.event_bus().subscribe();

        let err = store.load("missing").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(store.get("missing").is_none());

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, SiteEvent::SnapshotFailed { ref website_id, .. } if website_id == "missing"));
    }

    #[tokio::test]
    async fn test_loaded_event_carries_setup_flag() {
        let store = store();
        let mut rx = store.event_bus().subscribe();

        store.load("w1").await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            SiteEvent::SnapshotLoaded {
                website_id: "w1".to_string(),
                needs_setup: true,
            }
        );
    }

    #[tokio::test]
    async fn test_evict() {
        let store = store();
        store.load("w1").await.unwrap();
        assert!(store.evict("w1"));
        assert!(store.is_empty());
        assert!(!store.evict("w1"));
    }
}
