pub mod settings;

pub use settings::Config;

use crate::error::WatchError;
use std::sync::Arc;

/// Loads and returns the application configuration as an `Arc<Config>`.
/// It centralizes the configuration loading process.
pub fn load_config() -> Result<Arc<settings::Config>, WatchError> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors

    let config = settings::Config::from_env();
    config.validate()?;
    config.validate_and_log();

    Ok(Arc::new(config))
}
