pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod reader;
pub mod scheduler;
pub mod snapshot;
pub mod types;
pub mod utils;

// Re-export the core pipeline pieces
pub use cache::VolatileCache;
pub use error::{Result, WatchError};
pub use fetch::{FetchTask, Fetcher};
pub use reader::DataReader;
pub use snapshot::SnapshotStore;
pub use types::{Category, Freshness, Reading, Snapshot};

// Re-export scheduling and status components
pub use config::Config;
pub use metrics::FetchMetrics;
pub use scheduler::{Job, JobInfo, Scheduler, Trigger};
