// src/fetch/task.rs
//! One category's refresh unit: fetch, persist, cache, count.

use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::cache::VolatileCache;
use crate::error::WatchError;
use crate::fetch::Fetcher;
use crate::metrics::FetchMetrics;
use crate::snapshot::SnapshotStore;
use crate::types::Category;

/// Drives a single fetcher through the refresh pipeline.
///
/// `run` never returns an error: any failure (fetcher error, timeout,
/// snapshot write) is logged and counted, and both the durable snapshot
/// and the cache entry from the last success stay exactly as they were.
/// On success the snapshot store is written first, then the cache, so a
/// cache hit always has a durable record behind it.
pub struct FetchTask {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<SnapshotStore>,
    cache: Arc<VolatileCache>,
    metrics: Arc<FetchMetrics>,
    fetch_timeout: Duration,
    cache_ttl_secs: u64,
}

impl FetchTask {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<SnapshotStore>,
        cache: Arc<VolatileCache>,
        metrics: Arc<FetchMetrics>,
        fetch_timeout: Duration,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            fetcher,
            store,
            cache,
            metrics,
            fetch_timeout,
            cache_ttl_secs,
        }
    }

    pub fn category(&self) -> Category {
        self.fetcher.category()
    }

    pub async fn run(&self) {
        let category = self.fetcher.category();
        self.metrics.record_attempt(category);
        debug!("Fetching {} via {}", category, self.fetcher.name());

        let payload = match timeout(self.fetch_timeout, self.fetcher.fetch()).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(err)) => {
                self.report_failure(category, &err);
                return;
            }
            Err(_) => {
                let err = WatchError::TimeoutError(format!(
                    "{} fetch exceeded {:?}",
                    category, self.fetch_timeout
                ));
                self.report_failure(category, &err);
                return;
            }
        };

        let items = item_count(&payload);
        match self.store.put(category, payload) {
            Ok(snapshot) => {
                self.cache.set(
                    category.as_str(),
                    snapshot.payload.clone(),
                    Some(self.cache_ttl_secs),
                );
                self.metrics.record_success(category, items);
                info!(
                    "Refreshed {} via {} ({} items)",
                    category,
                    self.fetcher.name(),
                    items
                );
            }
            Err(err) => self.report_failure(category, &err),
        }
    }

    fn report_failure(&self, category: Category, err: &WatchError) {
        self.metrics.record_failure(category, &err.to_string());
        if err.is_recoverable() {
            warn!(
                "Refresh of {} via {} failed: {}",
                category,
                self.fetcher.name(),
                err
            );
        } else {
            error!(
                "Refresh of {} via {} failed: {}",
                category,
                self.fetcher.name(),
                err
            );
        }
    }
}

/// Item count for the metrics: list length or object key count.
fn item_count(payload: &Value) -> usize {
    match payload {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 1,
    }
}
