use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::types::Category;

/// Default cache TTLs per category, in seconds. Market quotes go stale
/// quickly; box office turns over daily.
const DEFAULT_TTL_STOCKS_SECS: u64 = 900;
const DEFAULT_TTL_BOXOFFICE_SECS: u64 = 86_400;
const DEFAULT_TTL_NEWS_SECS: u64 = 1_800;
const DEFAULT_TTL_ALERTS_SECS: u64 = 1_800;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: String,
    pub fetch_timeout_secs: u64,
    pub cache_default_ttl_secs: u64,
    pub cache_ttl_overrides_secs: Option<HashMap<String, u64>>,
    pub scheduler_tick_ms: u64,
    pub status_log_interval_secs: u64,
    pub stocks_api_url: Option<String>,
    pub news_feed_url: Option<String>,
    pub http_user_agent: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            cache_default_ttl_secs: env::var("CACHE_DEFAULT_TTL_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .unwrap_or(1800),
            cache_ttl_overrides_secs: env::var("CACHE_TTL_OVERRIDES_SECS")
                .ok()
                .map(|s| parse_ttl_map(&s)),
            scheduler_tick_ms: env::var("SCHEDULER_TICK_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            status_log_interval_secs: env::var("STATUS_LOG_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            stocks_api_url: env::var("STOCKS_API_URL").ok(),
            news_feed_url: env::var("NEWS_FEED_URL").ok(),
            http_user_agent: env::var("HTTP_USER_AGENT").ok(),
            log_level: env::var("LOG_LEVEL").ok(),
        }
    }

    /// Cache TTL for a category: env override if present, built-in default
    /// otherwise.
    pub fn ttl_for(&self, category: Category) -> u64 {
        if let Some(overrides) = &self.cache_ttl_overrides_secs {
            if let Some(ttl) = overrides.get(category.as_str()) {
                return *ttl;
            }
        }
        match category {
            Category::Stocks => DEFAULT_TTL_STOCKS_SECS,
            Category::BoxOffice => DEFAULT_TTL_BOXOFFICE_SECS,
            Category::News => DEFAULT_TTL_NEWS_SECS,
            Category::Alerts => DEFAULT_TTL_ALERTS_SECS,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_millis(self.scheduler_tick_ms)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.data_dir.is_empty() {
            return Err(crate::error::WatchError::ConfigError(
                "DATA_DIR cannot be empty".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(crate::error::WatchError::ConfigError(
                "FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if self.scheduler_tick_ms == 0 {
            return Err(crate::error::WatchError::ConfigError(
                "SCHEDULER_TICK_MS must be greater than zero".to_string(),
            ));
        }
        for (name, value) in [
            ("STOCKS_API_URL", &self.stocks_api_url),
            ("NEWS_FEED_URL", &self.news_feed_url),
        ] {
            if let Some(raw) = value {
                url::Url::parse(raw).map_err(|e| {
                    crate::error::WatchError::ConfigError(format!(
                        "{} is not a valid URL ({}): {}",
                        name, raw, e
                    ))
                })?;
            }
        }
        Ok(())
    }

    pub fn validate_and_log(&self) {
        log::info!("Application Configuration Loaded: {:?}", self);
    }
}

/// Parses a comma-separated `category:seconds` list, e.g.
/// `stocks:600,news:300`. Malformed entries are skipped.
fn parse_ttl_map(raw: &str) -> HashMap<String, u64> {
    raw.split(',')
        .filter_map(|part| {
            let mut kv = part.split(':');
            let key = kv.next()?.trim().to_string();
            let value = kv.next()?.trim().parse::<u64>().ok()?;
            Some((key, value))
        })
        .collect()
}
