//! Application configuration loaded from environment variables.
//!
//! Every variable is optional:
//! - `LOOKOUT_BROKER_URL` - broker WebSocket endpoint
//! - `LOOKOUT_REQUEST_TIMEOUT_MS` - classification timeout
//! - `LOOKOUT_THROTTLE_MS` - trailing throttle on request text
//! - `LOOKOUT_DEBOUNCE_MS` - typing indicator debounce
//! - `LOOKOUT_MAX_TRADES` - trades shown when the intent names no count
//! - `LOOKOUT_LOG_FILE` - where the TUI writes its log
//!
//! Empty values are treated as absent.

use std::time::Duration;

use crate::live::DEFAULT_MAX_TRADES;
use crate::search::SearchSettings;

/// Default broker WebSocket endpoint.
const DEFAULT_BROKER_URL: &str = "ws://localhost:8080/ws";

/// Default log file, relative to the working directory.
const DEFAULT_LOG_FILE: &str = "lookout.log";

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub broker_url: String,
    pub search: SearchSettings,
    pub max_trades: usize,
    pub log_file: String,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`LookoutError::Config`](crate::LookoutError::Config) if a
/// numeric variable is not a positive integer.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let broker_url =
        non_empty_var("LOOKOUT_BROKER_URL").unwrap_or_else(|| DEFAULT_BROKER_URL.to_string());
    let log_file = non_empty_var("LOOKOUT_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    let defaults = SearchSettings::default();
    let search = SearchSettings {
        throttle: millis_var("LOOKOUT_THROTTLE_MS")?.unwrap_or(defaults.throttle),
        debounce: millis_var("LOOKOUT_DEBOUNCE_MS")?.unwrap_or(defaults.debounce),
        request_timeout: millis_var("LOOKOUT_REQUEST_TIMEOUT_MS")?
            .unwrap_or(defaults.request_timeout),
    };

    let max_trades = match positive_var("LOOKOUT_MAX_TRADES")? {
        Some(n) => usize::try_from(n).map_err(|_| {
            crate::LookoutError::Config(format!("LOOKOUT_MAX_TRADES is too large: {n}"))
        })?,
        None => DEFAULT_MAX_TRADES,
    };

    Ok(AppConfig {
        broker_url,
        search,
        max_trades,
        log_file,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn millis_var(name: &str) -> crate::Result<Option<Duration>> {
    Ok(positive_var(name)?.map(Duration::from_millis))
}

fn positive_var(name: &str) -> crate::Result<Option<u64>> {
    let Some(raw) = non_empty_var(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(crate::LookoutError::Config(format!(
            "{name} must be greater than zero"
        ))),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(crate::LookoutError::Config(format!(
            "{name} is not a number: {raw:?}"
        ))),
    }
}
