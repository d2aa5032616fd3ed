//! Environment configuration for talking to the clinic API.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::controller::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read `CLINIC_API_URL`, `CLINIC_MAX_RETRIES`, `CLINIC_RETRY_DELAY_MS`
    /// and `CLINIC_REQUEST_TIMEOUT_MS`, falling back to defaults for unset
    /// variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            base_url: lookup("CLINIC_API_URL").unwrap_or_else(|| {
                info!("CLINIC_API_URL not set, using default: {DEFAULT_BASE_URL}");
                defaults.base_url
            }),
            max_retries: try_load(&lookup, "CLINIC_MAX_RETRIES", defaults.max_retries)?,
            retry_delay: Duration::from_millis(try_load(
                &lookup,
                "CLINIC_RETRY_DELAY_MS",
                defaults.retry_delay.as_millis() as u64,
            )?),
            request_timeout: Duration::from_millis(try_load(
                &lookup,
                "CLINIC_REQUEST_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )?),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
