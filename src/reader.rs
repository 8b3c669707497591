// src/reader.rs
//! Read path: freshest available data for a category, without ever
//! touching the network.

use log::debug;
use std::sync::Arc;

use crate::cache::VolatileCache;
use crate::snapshot::SnapshotStore;
use crate::types::{Category, Freshness, Reading};

/// Answers reads from the volatile cache first, then the snapshot store.
///
/// `updated_at` is always taken from the durable record, cache hit or not,
/// so consumers see when the data was actually fetched rather than when it
/// was cached.
pub struct DataReader {
    cache: Arc<VolatileCache>,
    store: Arc<SnapshotStore>,
}

impl DataReader {
    pub fn new(cache: Arc<VolatileCache>, store: Arc<SnapshotStore>) -> Self {
        Self { cache, store }
    }

    pub fn read(&self, category: Category) -> Reading {
        if let Some(value) = self.cache.get(category.as_str()) {
            return Reading {
                category,
                payload: Some(value),
                updated_at: self.store.last_updated(category),
                freshness: Freshness::Cached,
            };
        }

        match self.store.get(category) {
            Some(snapshot) => Reading {
                category,
                payload: Some(snapshot.payload),
                updated_at: Some(snapshot.updated_at),
                freshness: Freshness::Snapshot,
            },
            None => {
                debug!("No data recorded yet for {}", category);
                Reading {
                    category,
                    payload: None,
                    updated_at: None,
                    freshness: Freshness::Empty,
                }
            }
        }
    }
}
