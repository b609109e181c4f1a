//! Environment lookups shared by the binaries.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn required(name: &'static str) -> Result<String, ConfigError> {
    non_empty(name).ok_or(ConfigError::Missing(name))
}

pub fn string_or(name: &str, default: &str) -> String {
    non_empty(name).unwrap_or_else(|| default.to_string())
}

/// Parses `name` when it is set, otherwise returns `default`.
pub fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

pub fn secs_or(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    parse_or(name, default).map(Duration::from_secs)
}

/// `RETRY_MAX_ATTEMPTS` and `RETRY_BASE_DELAY_MS`.
pub fn retry_policy() -> Result<RetryPolicy, ConfigError> {
    let defaults = RetryPolicy::default();
    Ok(RetryPolicy {
        max_attempts: parse_or("RETRY_MAX_ATTEMPTS", defaults.max_attempts)?,
        base_delay: Duration::from_millis(parse_or(
            "RETRY_BASE_DELAY_MS",
            defaults.base_delay.as_millis() as u64,
        )?),
        ..defaults
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_values_use_defaults() {
        assert_eq!(parse_or("INGEST_CONFIG_TEST_UNSET", 42u32).unwrap(), 42);
        assert_eq!(string_or("INGEST_CONFIG_TEST_UNSET", "x"), "x");
        assert!(matches!(
            required("INGEST_CONFIG_TEST_UNSET"),
            Err(ConfigError::Missing("INGEST_CONFIG_TEST_UNSET"))
        ));
    }

    #[test]
    fn set_values_are_parsed() {
        env::set_var("INGEST_CONFIG_TEST_PORT", " 8080 ");
        assert_eq!(parse_or("INGEST_CONFIG_TEST_PORT", 1u16).unwrap(), 8080);

        env::set_var("INGEST_CONFIG_TEST_BAD", "ten");
        assert!(matches!(
            parse_or("INGEST_CONFIG_TEST_BAD", 1u16),
            Err(ConfigError::Invalid { name: "INGEST_CONFIG_TEST_BAD", .. })
        ));
    }
}
