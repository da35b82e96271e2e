// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata cache
//!
//! This module provides the shared, memoized metadata cache used by every
//! open document in a project.
//!
//! ## Overview
//!
//! The cache guarantees at-most-once fetching per `(dataset, table)` key:
//! each key owns a memoized in-flight cell, so a request arriving while a
//! fetch for the same key is outstanding awaits that fetch instead of issuing
//! a second one. Fetch failures are logged and memoized as `None`; callers
//! never see a catalog error through the cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::warn;

use crate::metadata::TableMetadata;
use crate::r#trait::Catalog;

type TableKey = (String, String);
type Slot = Arc<OnceCell<Option<TableMetadata>>>;

/// Shared metadata cache over a destination catalog
pub struct MetadataCache {
    catalog: Arc<dyn Catalog>,
    entries: Mutex<HashMap<TableKey, Slot>>,
}

impl MetadataCache {
    /// Create a new cache over a catalog
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch metadata for a table, at most once per key
    ///
    /// # Arguments
    ///
    /// * `dataset` - Dataset (schema) name
    /// * `table` - Table name
    ///
    /// # Returns
    ///
    /// The table's metadata, or `None` when the table is unknown, access is
    /// denied, or the fetch failed. Failures are logged, never raised.
    pub async fn get_metadata(&self, dataset: &str, table: &str) -> Option<TableMetadata> {
        let key = (dataset.to_string(), table.to_string());
        let slot = {
            let mut entries = self.entries.lock().await;
            entries.entry(key).or_default().clone()
        };

        slot.get_or_init(|| async {
            match self.catalog.get_metadata(dataset, table).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Metadata fetch failed for {}.{}: {}", dataset, table, e);
                    None
                }
            }
        })
        .await
        .clone()
    }

    /// Drop all cached entries
    ///
    /// Used when the destination schema is known to have changed (e.g. after
    /// a deploy run).
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of resolved or in-flight entries
    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatalogError, CatalogResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCatalog {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingCatalog {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl Catalog for CountingCatalog {
        async fn get_metadata(
            &self,
            dataset: &str,
            table: &str,
        ) -> CatalogResult<Option<TableMetadata>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CatalogError::ConnectionFailed("down".to_string()));
            }
            Ok(Some(TableMetadata::new(dataset, table)))
        }
    }

    #[tokio::test]
    async fn test_fetches_at_most_once_per_key() {
        let catalog = Arc::new(CountingCatalog::new(false));
        let cache = MetadataCache::new(catalog.clone());

        let first = cache.get_metadata("analytics", "orders").await;
        let second = cache.get_metadata("analytics", "orders").await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_separately() {
        let catalog = Arc::new(CountingCatalog::new(false));
        let cache = MetadataCache::new(catalog.clone());

        cache.get_metadata("analytics", "orders").await;
        cache.get_metadata("analytics", "customers").await;

        assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.entry_count().await, 2);
    }

    #[tokio::test]
    async fn test_failure_memoized_as_none() {
        let catalog = Arc::new(CountingCatalog::new(true));
        let cache = MetadataCache::new(catalog.clone());

        assert!(cache.get_metadata("analytics", "orders").await.is_none());
        assert!(cache.get_metadata("analytics", "orders").await.is_none());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_allows_refetch() {
        let catalog = Arc::new(CountingCatalog::new(false));
        let cache = MetadataCache::new(catalog.clone());

        cache.get_metadata("analytics", "orders").await;
        cache.clear().await;
        cache.get_metadata("analytics", "orders").await;

        assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
    }
}
