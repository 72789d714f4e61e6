//! Client configuration from the environment.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::fanout::{FetchPolicy, DEFAULT_MAX_IN_FLIGHT};
use crate::remote::DEFAULT_BASE_URL;

pub const ENV_BASE_URL: &str = "PETCLINIC_BASE_URL";
pub const ENV_MAX_IN_FLIGHT: &str = "PETCLINIC_MAX_IN_FLIGHT";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "PETCLINIC_REQUEST_TIMEOUT_MS";
pub const ENV_STATE_DB: &str = "PETCLINIC_STATE_DB";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Origin of the record service
    pub base_url: String,
    pub max_in_flight: usize,
    pub request_timeout: Option<Duration>,
    /// Session file; `None` leaves the choice to the caller
    pub state_db: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            request_timeout: None,
            state_db: None,
        }
    }
}

impl ClientConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Invalid values are logged and
    /// replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup(ENV_BASE_URL)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                info!("{ENV_BASE_URL} not set, using default: {}", defaults.base_url);
                defaults.base_url.clone()
            });

        let max_in_flight = try_parse::<usize>(&lookup, ENV_MAX_IN_FLIGHT)
            .filter(|n| {
                if *n == 0 {
                    warn!("{ENV_MAX_IN_FLIGHT} must be at least 1, using default");
                }
                *n > 0
            })
            .unwrap_or(defaults.max_in_flight);

        let request_timeout =
            try_parse::<u64>(&lookup, ENV_REQUEST_TIMEOUT_MS).map(Duration::from_millis);

        let state_db = lookup(ENV_STATE_DB)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            base_url,
            max_in_flight,
            request_timeout,
            state_db,
        }
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy::new(self.max_in_flight, self.request_timeout)
    }
}

fn try_parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T::Err: Display,
{
    let raw = lookup(key)?;
    raw.trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default");
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://clinic.local:8080"),
            (ENV_MAX_IN_FLIGHT, "2"),
            (ENV_REQUEST_TIMEOUT_MS, "1500"),
            (ENV_STATE_DB, "/tmp/state.db"),
        ]));
        assert_eq!(config.base_url, "http://clinic.local:8080");
        assert_eq!(config.fetch_policy().max_in_flight, 2);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.state_db, Some(PathBuf::from("/tmp/state.db")));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_MAX_IN_FLIGHT, "0"),
            (ENV_REQUEST_TIMEOUT_MS, "soon"),
        ]));
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.request_timeout, None);
    }
}
