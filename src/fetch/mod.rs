// src/fetch/mod.rs
//! The fetch seam: the `Fetcher` trait external sources plug into, the
//! shipped adapters, and the task that drives one category's refresh.

pub mod sources;
pub mod task;

pub use sources::{DerivedFetcher, HttpJsonFetcher, StaticFetcher};
pub use task::FetchTask;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::Category;

/// Interface to an external data source for one category.
///
/// Implementations own everything source-specific: endpoints, parsing,
/// credentials. The pipeline only cares that `fetch` eventually yields a
/// JSON payload or an error; it never inspects payloads beyond counting
/// items for the metrics.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short name for logs (e.g. "yahoo-quotes", "curated-boxoffice").
    fn name(&self) -> &str;

    /// The category this fetcher refreshes.
    fn category(&self) -> Category;

    /// Retrieves the current payload from the source.
    async fn fetch(&self) -> Result<Value>;
}
