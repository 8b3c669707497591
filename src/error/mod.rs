use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum WatchError {
    /// A fetcher returned an error; the prior snapshot stays authoritative.
    #[error("Fetch Error: {0}")]
    FetchError(String),

    /// A fetch exceeded its time budget.
    #[error("Timeout Error: {0}")]
    TimeoutError(String),

    /// Network/connectivity issues on the fetch path.
    #[error("Network Error: {0}")]
    NetworkError(String),

    /// Malformed payloads, config values or on-disk records.
    #[error("Parse Error: {0}")]
    ParseError(String),

    /// Durable snapshot could not be written; the previous record is intact.
    #[error("Snapshot Write Error: {0}")]
    SnapshotWriteError(String),

    /// Job id not present in the registry.
    #[error("Job Not Found: {0}")]
    JobNotFound(String),

    /// `start()` called on a scheduler that is already running.
    #[error("Scheduler already started")]
    SchedulerAlreadyStarted,

    /// `start()` called on a scheduler that has been stopped.
    #[error("Scheduler has been stopped")]
    SchedulerStopped,

    /// Configuration errors
    #[error("Config Error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for WatchError {
    fn from(err: serde_json::Error) -> Self {
        WatchError::ParseError(format!("JSON serialization/deserialization error: {}", err))
    }
}

impl From<std::io::Error> for WatchError {
    fn from(err: std::io::Error) -> Self {
        WatchError::SnapshotWriteError(format!("I/O error: {}", err))
    }
}

impl From<reqwest::Error> for WatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WatchError::TimeoutError(format!("HTTP request timed out: {}", err))
        } else {
            WatchError::NetworkError(format!("HTTP request failed: {}", err))
        }
    }
}

impl WatchError {
    /// Whether the failure is expected to clear on a later refresh cycle.
    ///
    /// Recoverable failures are logged at warn, everything else at error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            WatchError::FetchError(_) => true,
            WatchError::TimeoutError(_) => true,
            WatchError::NetworkError(_) => true,
            WatchError::ParseError(_) => false,
            WatchError::SnapshotWriteError(_) => false,
            WatchError::JobNotFound(_) => false,
            WatchError::SchedulerAlreadyStarted => false,
            WatchError::SchedulerStopped => false,
            WatchError::ConfigError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
