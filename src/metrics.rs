// src/metrics.rs
//! Per-category fetch counters for the status surface and periodic logs.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use itertools::Itertools;
use log::info;
use serde::Serialize;
use std::collections::HashMap;

use crate::types::Category;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_items: usize,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Shared fetch counters, recorded by fetch tasks and read by the status
/// loop and any health endpoint the surrounding service exposes.
#[derive(Debug, Default)]
pub struct FetchMetrics {
    stats: DashMap<Category, CategoryStats>,
}

impl FetchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self, category: Category) {
        self.stats.entry(category).or_default().attempts += 1;
    }

    pub fn record_success(&self, category: Category, items: usize) {
        let mut entry = self.stats.entry(category).or_default();
        entry.successes += 1;
        entry.last_items = items;
        entry.last_success_at = Some(Utc::now());
    }

    pub fn record_failure(&self, category: Category, error: &str) {
        let mut entry = self.stats.entry(category).or_default();
        entry.failures += 1;
        entry.last_failure_at = Some(Utc::now());
        entry.last_error = Some(error.to_string());
    }

    pub fn get(&self, category: Category) -> Option<CategoryStats> {
        self.stats.get(&category).map(|entry| entry.clone())
    }

    /// Serializable report keyed by category name.
    pub fn summary(&self) -> HashMap<String, CategoryStats> {
        self.stats
            .iter()
            .map(|entry| (entry.key().as_str().to_string(), entry.value().clone()))
            .collect()
    }

    /// One-line report for the periodic status log.
    pub fn status_line(&self) -> String {
        Category::ALL
            .iter()
            .map(|category| match self.get(*category) {
                Some(stats) => format!(
                    "{} {}/{} ok ({} items)",
                    category, stats.successes, stats.attempts, stats.last_items
                ),
                None => format!("{} never fetched", category),
            })
            .join(", ")
    }

    /// Logs one line per category, used after the initial pass and in
    /// one-shot mode.
    pub fn log_summary(&self) {
        for category in Category::ALL {
            if let Some(stats) = self.get(category) {
                info!(
                    "  {}: {} attempts, {} ok, {} failed, last items: {}, last success: {}",
                    category,
                    stats.attempts,
                    stats.successes,
                    stats.failures,
                    stats.last_items,
                    stats
                        .last_success_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string()),
                );
                if let Some(err) = stats.last_error {
                    info!("    last error: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn records_attempts_successes_and_failures() {
        let metrics = FetchMetrics::new();
        metrics.record_attempt(Category::News);
        metrics.record_success(Category::News, 12);
        metrics.record_attempt(Category::News);
        metrics.record_failure(Category::News, "feed unreachable");

        let stats = metrics.get(Category::News).unwrap();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.last_items, 12);
        assert!(stats.last_success_at.is_some());
        assert_eq!(stats.last_error.as_deref(), Some("feed unreachable"));
    }

    #[test]
    fn summary_is_serializable() {
        let metrics = FetchMetrics::new();
        metrics.record_attempt(Category::Stocks);
        metrics.record_success(Category::Stocks, 8);

        let value = serde_json::to_value(metrics.summary()).unwrap();
        assert_eq!(value["stocks"]["successes"], 1);
        assert_eq!(value["stocks"]["last_items"], 8);
    }

    #[test]
    fn status_line_covers_every_category() {
        let metrics = FetchMetrics::new();
        metrics.record_attempt(Category::Stocks);
        metrics.record_success(Category::Stocks, 8);

        let line = metrics.status_line();
        assert!(line.contains("stocks 1/1 ok"));
        assert!(line.contains("news never fetched"));
    }
}
