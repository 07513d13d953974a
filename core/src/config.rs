//! Client configuration.
//!
//! A `Config` is an immutable snapshot. `DevSecClient` swaps whole snapshots
//! when reconfigured, and every request works with the snapshot it loaded
//! when it started.

use std::time::Duration;

use crate::endpoint::{Endpoint, PRODUCTION};
use crate::error::{ApiError, Result};

/// Default network timeout per request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of batch items in flight at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

pub const ENV_ENDPOINT: &str = "DEVSEC_ENDPOINT";
pub const ENV_TIMEOUT_MS: &str = "DEVSEC_TIMEOUT_MS";
pub const ENV_MAX_CONCURRENCY: &str = "DEVSEC_MAX_CONCURRENCY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Endpoint,
    pub timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: PRODUCTION,
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl Config {
    pub fn with_endpoint(mut self, endpoint: &Endpoint) -> Self {
        self.endpoint = endpoint.clone();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoint = Endpoint::new(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Zero is clamped to one so a batch always makes progress.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Defaults overridden by `DEVSEC_ENDPOINT`, `DEVSEC_TIMEOUT_MS` and
    /// `DEVSEC_MAX_CONCURRENCY` when they are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_ENDPOINT) {
            let endpoint = Endpoint::from_name(&raw)
                .ok_or_else(|| ApiError::Config(format!("{ENV_ENDPOINT}: unknown endpoint {raw:?}")))?;
            config = config.with_endpoint(&endpoint);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|e| ApiError::Config(format!("{ENV_TIMEOUT_MS}: {e}")))?;
            config = config.with_timeout(Duration::from_millis(millis));
        }
        if let Some(raw) = lookup(ENV_MAX_CONCURRENCY) {
            let limit: usize = raw
                .trim()
                .parse()
                .map_err(|e| ApiError::Config(format!("{ENV_MAX_CONCURRENCY}: {e}")))?;
            config = config.with_max_concurrency(limit);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::endpoint::LOCAL_DEV;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn default_targets_production_with_five_second_timeout() {
        let config = Config::default();
        assert_eq!(config.endpoint, PRODUCTION);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn builders_replace_fields() {
        let config = Config::default()
            .with_endpoint(&LOCAL_DEV)
            .with_timeout(Duration::from_millis(250))
            .with_max_concurrency(0);
        assert_eq!(config.endpoint, LOCAL_DEV);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn from_lookup_without_vars_is_default() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn from_lookup_reads_all_vars() {
        let config = Config::from_lookup(lookup(&[
            (ENV_ENDPOINT, "http://127.0.0.1:3000"),
            (ENV_TIMEOUT_MS, "1500"),
            (ENV_MAX_CONCURRENCY, "4"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint.base_url(), "http://127.0.0.1:3000");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_concurrency, 4);
    }

    #[test]
    fn from_lookup_rejects_bad_timeout() {
        let err = Config::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "soon")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.starts_with(ENV_TIMEOUT_MS)));
    }

    #[test]
    fn from_lookup_rejects_unknown_endpoint_name() {
        let err = Config::from_lookup(lookup(&[(ENV_ENDPOINT, "staging")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
