// src/snapshot.rs
//! Flat-file persistence for the last successful fetch per category.
//!
//! Each category owns one JSON file (`<data_dir>/<category>.json`) holding
//! `{"data": ..., "updated_at": ...}`. Writes go to a uniquely named temp
//! file in the same directory and are renamed into place, so a record is
//! replaced whole or not at all; concurrent writers for the same category
//! resolve to whichever completes last. Reads are served from an in-memory
//! index that is populated once at open and on every successful write.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Result, WatchError};
use crate::types::{Category, Snapshot};

/// On-disk record shape, shared with the dashboards that read these files.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    data: Value,
    updated_at: DateTime<Utc>,
}

pub struct SnapshotStore {
    dir: PathBuf,
    index: DashMap<Category, Snapshot>,
}

impl SnapshotStore {
    /// Opens the store, creating `dir` if needed and loading every
    /// readable per-category record into the index. Unreadable records are
    /// logged and skipped so one corrupt file cannot block startup.
    pub fn open<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            WatchError::SnapshotWriteError(format!(
                "Failed to create data dir {}: {}",
                dir.display(),
                e
            ))
        })?;

        // TODO: sweep stale .tmp files left behind by a crashed writer
        let store = Self {
            dir,
            index: DashMap::new(),
        };

        let mut loaded = 0;
        for category in Category::ALL {
            let path = store.path_for(category);
            if !path.exists() {
                continue;
            }
            match load_record(&path) {
                Ok(record) => {
                    store.index.insert(
                        category,
                        Snapshot {
                            category,
                            payload: record.data,
                            updated_at: record.updated_at,
                        },
                    );
                    loaded += 1;
                }
                Err(e) => {
                    warn!("Skipping unreadable snapshot {}: {}", path.display(), e);
                }
            }
        }

        info!(
            "Snapshot store opened at {} ({} snapshots loaded)",
            store.dir.display(),
            loaded
        );
        Ok(store)
    }

    /// Durably records `payload` as the current snapshot for `category`.
    ///
    /// On any failure the previous record, durable and in-memory, stays
    /// untouched and the error is returned to the caller.
    pub fn put(&self, category: Category, payload: Value) -> Result<Snapshot> {
        let path = self.path_for(category);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", category.as_str(), Uuid::new_v4()));

        let record = SnapshotRecord {
            data: payload,
            updated_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&record).map_err(|e| {
            WatchError::SnapshotWriteError(format!(
                "Failed to serialize {} snapshot: {}",
                category, e
            ))
        })?;

        // Hold the index entry across the rename so the file and the
        // in-memory record agree on which concurrent writer won.
        let entry = self.index.entry(category);

        if let Err(e) = fs::write(&tmp, &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(WatchError::SnapshotWriteError(format!(
                "Failed to write {}: {}",
                tmp.display(),
                e
            )));
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(WatchError::SnapshotWriteError(format!(
                "Failed to replace {}: {}",
                path.display(),
                e
            )));
        }

        let snapshot = Snapshot {
            category,
            payload: record.data,
            updated_at: record.updated_at,
        };
        entry.insert(snapshot.clone());
        debug!(
            "Snapshot recorded for {} at {}",
            category, snapshot.updated_at
        );
        Ok(snapshot)
    }

    /// Returns the current snapshot for `category`. `None` means no
    /// successful fetch has ever been recorded, which is the expected
    /// state before the first pass completes.
    pub fn get(&self, category: Category) -> Option<Snapshot> {
        self.index.get(&category).map(|entry| entry.clone())
    }

    /// Timestamp of the current record without cloning its payload.
    pub fn last_updated(&self, category: Category) -> Option<DateTime<Utc>> {
        self.index.get(&category).map(|entry| entry.updated_at)
    }

    /// Number of categories with a durable record.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{}.json", category.as_str()))
    }
}

fn load_record(path: &Path) -> anyhow::Result<SnapshotRecord> {
    let raw = fs::read_to_string(path)?;
    let record = serde_json::from_str(&raw)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();

        let written = store
            .put(Category::News, json!([{"title": "Canal+ renews deal"}]))
            .unwrap();
        let read = store.get(Category::News).unwrap();

        assert_eq!(read.payload, json!([{"title": "Canal+ renews deal"}]));
        assert_eq!(read.updated_at, written.updated_at);
        assert_eq!(store.last_updated(Category::News), Some(written.updated_at));
    }

    #[test]
    fn unwritten_category_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        assert!(store.get(Category::BoxOffice).is_none());
        assert!(store.last_updated(Category::BoxOffice).is_none());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let written = {
            let store = SnapshotStore::open(dir.path()).unwrap();
            store.put(Category::Stocks, json!({"WBD": 11.2})).unwrap()
        };

        let reopened = SnapshotStore::open(dir.path()).unwrap();
        let read = reopened.get(Category::Stocks).unwrap();
        assert_eq!(read.payload, json!({"WBD": 11.2}));
        assert_eq!(read.updated_at, written.updated_at);
    }

    #[test]
    fn on_disk_record_has_data_and_updated_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        store.put(Category::Alerts, json!(["alert"])).unwrap();

        let raw = fs::read_to_string(dir.path().join("alerts.json")).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["data"], json!(["alert"]));
        assert!(parsed["updated_at"].is_string());
    }

    #[test]
    fn corrupt_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SnapshotStore::open(dir.path()).unwrap();
            store.put(Category::Stocks, json!({"NFLX": 610.0})).unwrap();
        }
        fs::write(dir.path().join("news.json"), "{not json at all").unwrap();

        let store = SnapshotStore::open(dir.path()).unwrap();
        assert!(store.get(Category::News).is_none());
        assert!(store.get(Category::Stocks).is_some());
    }

    #[test]
    fn write_failure_leaves_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("store");
        let store = SnapshotStore::open(&nested).unwrap();

        fs::remove_dir_all(&nested).unwrap();
        let err = store.put(Category::News, json!([])).unwrap_err();
        assert!(matches!(err, WatchError::SnapshotWriteError(_)));
        assert!(store.get(Category::News).is_none());
    }

    #[test]
    fn overwrite_replaces_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();

        store
            .put(Category::BoxOffice, json!({"films": ["Dune 3"]}))
            .unwrap();
        store
            .put(Category::BoxOffice, json!({"films": ["Avatar 4", "Akira"]}))
            .unwrap();

        let read = store.get(Category::BoxOffice).unwrap();
        assert_eq!(read.payload, json!({"films": ["Avatar 4", "Akira"]}));
        // No temp files linger after the rename.
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
