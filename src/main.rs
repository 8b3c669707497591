// src/main.rs
use clap::Parser;
use log::{info, warn};
use mediawatch::{
    cache::VolatileCache,
    config::Config,
    error::WatchError,
    fetch::{
        sources::{
            curated_boxoffice_payload, curated_stocks_payload, headline_alerts,
            sample_news_payload, DerivedFetcher, HttpJsonFetcher, StaticFetcher,
        },
        FetchTask, Fetcher,
    },
    metrics::FetchMetrics,
    reader::DataReader,
    scheduler::{Job, Scheduler, Trigger},
    snapshot::SnapshotStore,
    types::Category,
    utils::setup_logging,
};
use chrono::Weekday;
use std::collections::HashMap;
use std::sync::Arc;

/// Media intelligence watchdog: keeps stock, box office, news and alert
/// snapshots fresh on a schedule and serves them through a cached read
/// path.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory for persisted snapshots (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level: error, warn, info, debug or trace (overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    /// Run one fetch pass over every category, log a summary and exit
    #[arg(long)]
    once: bool,
}

fn market_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
}

/// One fetcher per category. Stocks and news prefer a configured live
/// endpoint and fall back to curated payloads; box office is curated;
/// alerts derive from whatever news data the read path serves.
fn build_fetchers(
    config: &Config,
    reader: Arc<DataReader>,
) -> Result<Vec<Arc<dyn Fetcher>>, WatchError> {
    let user_agent = config.http_user_agent.as_deref();

    let stocks: Arc<dyn Fetcher> = match &config.stocks_api_url {
        Some(url) => Arc::new(HttpJsonFetcher::new(
            "stocks-api",
            Category::Stocks,
            url,
            config.fetch_timeout(),
            user_agent,
        )?),
        None => {
            warn!("STOCKS_API_URL not set; serving curated stock quotes");
            Arc::new(StaticFetcher::new(
                "curated-stocks",
                Category::Stocks,
                curated_stocks_payload(),
            ))
        }
    };

    let boxoffice: Arc<dyn Fetcher> = Arc::new(StaticFetcher::new(
        "curated-boxoffice",
        Category::BoxOffice,
        curated_boxoffice_payload(),
    ));

    let news: Arc<dyn Fetcher> = match &config.news_feed_url {
        Some(url) => Arc::new(HttpJsonFetcher::new(
            "news-feed",
            Category::News,
            url,
            config.fetch_timeout(),
            user_agent,
        )?),
        None => {
            warn!("NEWS_FEED_URL not set; serving sample headlines");
            Arc::new(StaticFetcher::new(
                "sample-news",
                Category::News,
                sample_news_payload(),
            ))
        }
    };

    let alerts: Arc<dyn Fetcher> = Arc::new(DerivedFetcher::new(
        "headline-alerts",
        Category::Alerts,
        Category::News,
        reader,
        Arc::new(headline_alerts),
    ));

    Ok(vec![stocks, boxoffice, news, alerts])
}

#[tokio::main]
async fn main() -> Result<(), WatchError> {
    let cli = Cli::parse();
    dotenv::dotenv().ok();

    // --- Configuration & Initialization ---
    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = Some(level);
    }
    let level = config
        .log_level
        .as_deref()
        .unwrap_or("info")
        .parse()
        .unwrap_or(log::LevelFilter::Info);
    setup_logging(level).expect("Failed to initialize logging");
    info!("🚀 Mediawatch starting...");

    config.validate()?;
    config.validate_and_log();
    let config = Arc::new(config);

    let store = Arc::new(SnapshotStore::open(config.data_dir.as_str())?);
    let cache = Arc::new(VolatileCache::new(config.cache_default_ttl_secs));
    let metrics = Arc::new(FetchMetrics::new());
    let reader = Arc::new(DataReader::new(cache.clone(), store.clone()));

    // --- Fetch tasks, one per category ---
    let fetchers = build_fetchers(&config, reader.clone())?;
    let mut tasks: HashMap<Category, Arc<FetchTask>> = HashMap::new();
    for fetcher in fetchers {
        let category = fetcher.category();
        tasks.insert(
            category,
            Arc::new(FetchTask::new(
                fetcher,
                store.clone(),
                cache.clone(),
                metrics.clone(),
                config.fetch_timeout(),
                config.ttl_for(category),
            )),
        );
    }

    // --- Job registry ---
    // Alerts are registered last so the initial pass derives them from
    // news fetched moments earlier.
    let scheduler = Scheduler::new(tasks, config.scheduler_tick());
    scheduler
        .register(Job::new(
            "fetch_stocks",
            "Fetch Stock Prices",
            Category::Stocks,
            Trigger::cron(market_days(), 9, 18, 15),
        ))
        .await?;
    scheduler
        .register(Job::new(
            "fetch_stocks_hourly",
            "Fetch Stock Prices (Hourly)",
            Category::Stocks,
            Trigger::every_hours(1),
        ))
        .await?;
    scheduler
        .register(Job::new(
            "fetch_boxoffice",
            "Fetch Box Office",
            Category::BoxOffice,
            Trigger::daily_at(10, 0),
        ))
        .await?;
    scheduler
        .register(Job::new(
            "fetch_news",
            "Fetch News",
            Category::News,
            Trigger::every_minutes(30),
        ))
        .await?;
    scheduler
        .register(Job::new(
            "generate_alerts",
            "Generate Alerts",
            Category::Alerts,
            Trigger::every_minutes(30),
        ))
        .await?;

    // --- Initial data pass ---
    scheduler.run_initial_pass().await;
    metrics.log_summary();

    if cli.once {
        info!("✅ Single fetch pass complete; exiting (--once)");
        return Ok(());
    }

    scheduler.start().await?;
    info!("✅ Mediawatch ready; snapshots in {}", store.dir().display());
    for job in scheduler.list_jobs().await {
        info!("   📋 {} [{}] {}", job.id, job.trigger, job.name);
    }

    // --- Periodic status log ---
    let status_scheduler = scheduler.clone();
    let status_cache = cache.clone();
    let status_metrics = metrics.clone();
    let status_every = std::time::Duration::from_secs(config.status_log_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(status_every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let jobs = status_scheduler.list_jobs().await;
            let state = if status_scheduler.is_running().await {
                "running"
            } else {
                "stopped"
            };
            info!(
                "📊 Status: scheduler {}, {} jobs, {} cached entries | {}",
                state,
                jobs.len(),
                status_cache.len(),
                status_metrics.status_line()
            );
        }
    });

    // --- Shutdown ---
    tokio::signal::ctrl_c().await.expect("Failed to listen for ctrl-c");
    info!("🛑 Shutdown signal received...");
    scheduler.stop().await;
    metrics.log_summary();
    info!("Goodbye.");
    Ok(())
}
