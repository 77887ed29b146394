//! Configuration for the page viewer.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unlike missing variables, variables that are set but unparsable are
//! reported as errors.

use keyed_request_core::{Deserialize, Serialize};
use keyed_request_runtime::StoreConfig;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value found
        value: String,
        /// Parser message
        reason: String,
    },

    /// The base URL is not an `http://` or `https://` URL
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// Offending URL
        url: String,
        /// What is wrong with it
        reason: String,
    },

    /// A value is out of range
    #[error("{0}")]
    Validation(String),

    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Page viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Fetch configuration
    pub fetch: FetchConfig,
    /// Store runtime configuration
    pub runtime: RuntimeConfig,
    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// How content is fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL; pages are fetched from `<base_url>/<key>`
    pub base_url: String,
    /// Per-fetch timeout in milliseconds
    pub timeout_ms: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Store runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Capacity of the settlement broadcast channel
    pub broadcast_capacity: usize,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

/// Prometheus metrics settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder
    pub enabled: bool,
    /// Host advertised for scraping
    pub host: String,
    /// Port advertised for scraping
    pub port: u16,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/pages".to_string(),
            timeout_ms: 10_000,
            user_agent: concat!("page-viewer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            shutdown_timeout_secs: 30,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "0.0.0.0".to_string(),
            port: 9090,
        }
    }
}

impl ManagerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PAGE_VIEWER_BASE_URL` | `http://localhost:8080/pages` |
    /// | `PAGE_VIEWER_FETCH_TIMEOUT_MS` | `10000` |
    /// | `PAGE_VIEWER_USER_AGENT` | `page-viewer/<version>` |
    /// | `PAGE_VIEWER_BROADCAST_CAPACITY` | `16` |
    /// | `PAGE_VIEWER_SHUTDOWN_TIMEOUT_SECS` | `30` |
    /// | `PAGE_VIEWER_METRICS` | `false` |
    /// | `PAGE_VIEWER_METRICS_HOST` | `0.0.0.0` |
    /// | `PAGE_VIEWER_METRICS_PORT` | `9090` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`ManagerConfig::from_env`].
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            fetch: FetchConfig {
                base_url: lookup("PAGE_VIEWER_BASE_URL").unwrap_or(defaults.fetch.base_url),
                timeout_ms: parse_var(
                    &lookup,
                    "PAGE_VIEWER_FETCH_TIMEOUT_MS",
                    defaults.fetch.timeout_ms,
                )?,
                user_agent: lookup("PAGE_VIEWER_USER_AGENT")
                    .unwrap_or(defaults.fetch.user_agent),
            },
            runtime: RuntimeConfig {
                broadcast_capacity: parse_var(
                    &lookup,
                    "PAGE_VIEWER_BROADCAST_CAPACITY",
                    defaults.runtime.broadcast_capacity,
                )?,
                shutdown_timeout_secs: parse_var(
                    &lookup,
                    "PAGE_VIEWER_SHUTDOWN_TIMEOUT_SECS",
                    defaults.runtime.shutdown_timeout_secs,
                )?,
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "PAGE_VIEWER_METRICS", defaults.metrics.enabled)?,
                host: lookup("PAGE_VIEWER_METRICS_HOST").unwrap_or(defaults.metrics.host),
                port: parse_var(&lookup, "PAGE_VIEWER_METRICS_PORT", defaults.metrics.port)?,
            },
        })
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for a non-HTTP base URL and
    /// [`ConfigError::Validation`] for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fetch.parse_base_url()?;

        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "fetch timeout must be greater than zero".to_string(),
            ));
        }
        if self.runtime.broadcast_capacity == 0 {
            return Err(ConfigError::Validation(
                "broadcast capacity must be greater than zero".to_string(),
            ));
        }
        if self.metrics.enabled {
            self.metrics.addr()?;
        }
        Ok(())
    }

    /// Per-fetch timeout
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch.timeout_ms)
    }

    /// Store runtime configuration
    #[must_use]
    pub const fn store_config(&self) -> StoreConfig {
        StoreConfig::new(
            self.runtime.broadcast_capacity,
            Duration::from_secs(self.runtime.shutdown_timeout_secs),
        )
    }
}

impl FetchConfig {
    /// Parse the base URL, which must be an absolute `http://` or `https://` URL
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] otherwise.
    pub fn parse_base_url(&self) -> Result<reqwest::Url, ConfigError> {
        parse_http_url(&self.base_url)
    }
}

/// Parse `raw` as an absolute `http://` or `https://` URL
pub(crate) fn parse_http_url(raw: &str) -> Result<reqwest::Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = reqwest::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

impl MetricsConfig {
    /// Socket address of the scrape endpoint
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if host and port do not form a socket address.
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            var: "PAGE_VIEWER_METRICS_HOST",
            value: raw.clone(),
            reason: e.to_string(),
        })
    }
}

fn parse_var<L, T>(lookup: &L, var: &'static str, default: T) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() -> Result<(), ConfigError> {
        let config = ManagerConfig::from_lookup(lookup_from(&[]))?;
        assert_eq!(config, ManagerConfig::default());
        config.validate()?;
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.store_config().broadcast_capacity, 16);
        Ok(())
    }

    #[test]
    fn test_reads_variables() -> Result<(), ConfigError> {
        let config = ManagerConfig::from_lookup(lookup_from(&[
            ("PAGE_VIEWER_BASE_URL", "https://docs.example.com"),
            ("PAGE_VIEWER_FETCH_TIMEOUT_MS", "250"),
            ("PAGE_VIEWER_BROADCAST_CAPACITY", "64"),
            ("PAGE_VIEWER_SHUTDOWN_TIMEOUT_SECS", "5"),
            ("PAGE_VIEWER_METRICS", "true"),
            ("PAGE_VIEWER_METRICS_PORT", "9191"),
        ]))?;

        assert_eq!(config.fetch.base_url, "https://docs.example.com");
        assert_eq!(config.fetch_timeout(), Duration::from_millis(250));
        let store = config.store_config();
        assert_eq!(store.broadcast_capacity, 64);
        assert_eq!(store.default_shutdown_timeout, Duration::from_secs(5));
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.addr()?.port(), 9191);
        config.validate()
    }

    #[test]
    fn test_unparsable_variable_is_an_error() {
        let result =
            ManagerConfig::from_lookup(lookup_from(&[("PAGE_VIEWER_FETCH_TIMEOUT_MS", "soon")]));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                var: "PAGE_VIEWER_FETCH_TIMEOUT_MS",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() -> Result<(), ConfigError> {
        let config = ManagerConfig::from_lookup(lookup_from(&[(
            "PAGE_VIEWER_BASE_URL",
            "file:///etc/passwd",
        )]))?;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));

        let config =
            ManagerConfig::from_lookup(lookup_from(&[("PAGE_VIEWER_FETCH_TIMEOUT_MS", "0")]))?;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config =
            ManagerConfig::from_lookup(lookup_from(&[("PAGE_VIEWER_BROADCAST_CAPACITY", "0")]))?;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = ManagerConfig::from_lookup(lookup_from(&[
            ("PAGE_VIEWER_METRICS", "true"),
            ("PAGE_VIEWER_METRICS_HOST", "not a host"),
        ]))?;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
        Ok(())
    }
}
