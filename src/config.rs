// src/config.rs
use std::env;
use std::time::Duration;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the pricing service, e.g. "https://pricing.example.com/api/".
    pub api_base_url: String,
    /// Bearer token sent with every request, if any.
    pub api_token: Option<String>,
    /// Owner whose properties the session may select.
    pub user_id: String,
    /// SQLite file backing the local cache.
    pub store_path: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api/".to_string(),
            api_token: None,
            user_id: "me".to_string(),
            store_path: "pricing_session.sqlite3".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Defaults overridden by `PRICING_*` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("PRICING_API_URL") {
            cfg.api_base_url = url;
        }
        cfg.api_token = lookup("PRICING_API_TOKEN").filter(|t| !t.trim().is_empty());
        if let Some(user) = lookup("PRICING_USER_ID") {
            cfg.user_id = user;
        }
        if let Some(path) = lookup("PRICING_STORE_PATH") {
            cfg.store_path = path;
        }
        if let Some(raw) = lookup("PRICING_TIMEOUT_SECS") {
            cfg.request_timeout_secs = raw.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "PRICING_TIMEOUT_SECS must be a whole number, got {raw:?}"
                ))
            })?;
        }

        Ok(cfg)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
