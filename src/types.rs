// src/types.rs
//! Shared data types for the refresh pipeline: categories, snapshots and
//! read results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WatchError;

/// A data domain that is fetched and refreshed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Stocks,
    BoxOffice,
    News,
    Alerts,
}

impl Category {
    /// All categories, in the order the initial fetch pass runs them.
    pub const ALL: [Category; 4] = [
        Category::Stocks,
        Category::BoxOffice,
        Category::News,
        Category::Alerts,
    ];

    /// Stable string form, used as cache key and snapshot file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Stocks => "stocks",
            Category::BoxOffice => "boxoffice",
            Category::News => "news",
            Category::Alerts => "alerts",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stocks" => Ok(Category::Stocks),
            "boxoffice" => Ok(Category::BoxOffice),
            "news" => Ok(Category::News),
            "alerts" => Ok(Category::Alerts),
            other => Err(WatchError::ParseError(format!(
                "Unknown category: {}",
                other
            ))),
        }
    }
}

/// The last durably recorded fetch result for a category.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub category: Category,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Which layer answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Served from the volatile cache, within its TTL.
    Cached,
    /// Served from the durable snapshot store.
    Snapshot,
    /// No successful fetch has ever been recorded.
    Empty,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Cached => "cached",
            Freshness::Snapshot => "snapshot",
            Freshness::Empty => "empty",
        }
    }
}

/// Result of a read: the freshest available payload plus provenance.
///
/// `updated_at` always reflects the durable record, even on a cache hit.
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub category: Category,
    pub payload: Option<serde_json::Value>,
    pub updated_at: Option<DateTime<Utc>>,
    pub freshness: Freshness,
}
