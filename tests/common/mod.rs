// tests/common/mod.rs
//! Shared fixtures for the integration suites: an in-temp-dir pipeline
//! and a fetcher whose behavior tests can steer mid-flight.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use mediawatch::cache::VolatileCache;
use mediawatch::error::{Result, WatchError};
use mediawatch::fetch::{FetchTask, Fetcher};
use mediawatch::metrics::FetchMetrics;
use mediawatch::reader::DataReader;
use mediawatch::snapshot::SnapshotStore;
use mediawatch::types::Category;

pub struct ScriptedFetcher {
    name: String,
    category: Category,
    payload: Mutex<Value>,
    fail: AtomicBool,
    delay: Duration,
}

impl ScriptedFetcher {
    pub fn new(name: &str, category: Category, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            category,
            payload: Mutex::new(payload),
            fail: AtomicBool::new(false),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(name: &str, category: Category, payload: Value, delay: Duration) -> Self {
        let mut fetcher = Self::new(name, category, payload);
        fetcher.delay = delay;
        fetcher
    }

    pub fn set_payload(&self, payload: Value) {
        *self.payload.lock().unwrap() = payload;
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> Category {
        self.category
    }

    async fn fetch(&self) -> Result<Value> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(WatchError::FetchError("scripted failure".to_string()));
        }
        Ok(self.payload.lock().unwrap().clone())
    }
}

/// Store, cache, metrics and reader rooted in a fresh temp dir.
pub struct Pipeline {
    pub dir: TempDir,
    pub store: Arc<SnapshotStore>,
    pub cache: Arc<VolatileCache>,
    pub metrics: Arc<FetchMetrics>,
    pub reader: Arc<DataReader>,
}

impl Pipeline {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SnapshotStore::open(dir.path()).unwrap());
        let cache = Arc::new(VolatileCache::new(60));
        let metrics = Arc::new(FetchMetrics::new());
        let reader = Arc::new(DataReader::new(cache.clone(), store.clone()));
        Self {
            dir,
            store,
            cache,
            metrics,
            reader,
        }
    }

    pub fn task(
        &self,
        fetcher: Arc<dyn Fetcher>,
        timeout: Duration,
        ttl_secs: u64,
    ) -> Arc<FetchTask> {
        Arc::new(FetchTask::new(
            fetcher,
            self.store.clone(),
            self.cache.clone(),
            self.metrics.clone(),
            timeout,
            ttl_secs,
        ))
    }
}
