//! Runtime configuration, read from the environment (and `.env`) with CLI overrides on top.

use crate::error::{AppError, Result};
use reqwest::Url;
use std::env;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_BASE_URL: &str = "BACKEND_URL";
pub const ENV_TOKEN: &str = "BOOKS_API_TOKEN";
pub const ENV_TIMEOUT: &str = "BOOKS_PROBE_TIMEOUT_SECS";
pub const ENV_EMAIL: &str = "BOOKS_PROBE_EMAIL";
pub const ENV_PASSWORD: &str = "BOOKS_PROBE_PASSWORD";

/// Where the backend lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Builds a config for `base_url` with every other field at its default.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            email: None,
            password: None,
        })
    }

    /// Loads `.env`, then reads the environment, then applies `overrides`.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        dotenv::dotenv().ok();

        let base_url = match &overrides.base_url {
            Some(url) => url.clone(),
            None => env_opt(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => match env_opt(ENV_TIMEOUT) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                    AppError::Config(format!("{} must be a whole number, got {:?}", ENV_TIMEOUT, raw))
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };
        if timeout_secs == 0 {
            return Err(AppError::Config("timeout must be at least 1 second".to_string()));
        }

        let config = Self {
            token: overrides.token.clone().or_else(|| env_opt(ENV_TOKEN)),
            timeout: Duration::from_secs(timeout_secs),
            email: env_opt(ENV_EMAIL),
            password: env_opt(ENV_PASSWORD),
            ..Self::new(&base_url)?
        };

        debug!(
            base_url = %config.base_url,
            timeout_secs,
            has_token = config.token.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

/// Reads a variable, treating unset and blank the same way.
fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Validates the scheme and strips trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| AppError::Config(format!("invalid base URL {:?}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(AppError::Config(format!(
            "base URL must use http or https, got {:?}",
            other
        ))),
    }
}
