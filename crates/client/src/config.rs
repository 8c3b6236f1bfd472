use std::str::FromStr;
use std::time::Duration;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local dubbing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the dubbing service (default: `http://localhost:5000`).
    pub api_url: String,
    /// Delay between status polls (default: 2000 ms).
    pub poll_interval: Duration,
    /// Upper bound on any single HTTP request (default: 30 s).
    pub request_timeout: Duration,
    /// Background roster refresh period (default: 10 s).
    pub roster_refresh_interval: Duration,
}

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ROSTER_REFRESH_SECS: u64 = 10;

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            roster_refresh_interval: Duration::from_secs(DEFAULT_ROSTER_REFRESH_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `AUTODUB_API_URL`              | `http://localhost:5000` |
    /// | `AUTODUB_POLL_INTERVAL_MS`     | `2000`                  |
    /// | `AUTODUB_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `AUTODUB_ROSTER_REFRESH_SECS`  | `10`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("AUTODUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());

        let poll_interval_ms = parse_var(
            "AUTODUB_POLL_INTERVAL_MS",
            std::env::var("AUTODUB_POLL_INTERVAL_MS").ok(),
            DEFAULT_POLL_INTERVAL_MS,
        )?;
        let request_timeout_secs = parse_var(
            "AUTODUB_REQUEST_TIMEOUT_SECS",
            std::env::var("AUTODUB_REQUEST_TIMEOUT_SECS").ok(),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let roster_refresh_secs = parse_var(
            "AUTODUB_ROSTER_REFRESH_SECS",
            std::env::var("AUTODUB_ROSTER_REFRESH_SECS").ok(),
            DEFAULT_ROSTER_REFRESH_SECS,
        )?;

        let config = Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            roster_refresh_interval: Duration::from_secs(roster_refresh_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero durations, which would spin the polling loops.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("AUTODUB_POLL_INTERVAL_MS"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("AUTODUB_REQUEST_TIMEOUT_SECS"));
        }
        if self.roster_refresh_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("AUTODUB_ROSTER_REFRESH_SECS"));
        }
        Ok(())
    }
}

/// Parse an optional raw env value, falling back to `default` when unset.
fn parse_var<T: FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}
