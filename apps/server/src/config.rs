//! Application configuration, read from environment variables.

use std::time::Duration;
use thiserror::Error;
use trending_engine::{CycleConfig, MonitorConfig};

const MS_PER_HOUR: u64 = 3_600_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Telegram bot token
    pub bot_token: String,
    /// Target chat: numeric id or @channel
    pub chat_id: String,
    pub poll_interval_ms: u64,
    pub max_age_hours: u64,
    pub ttl_hours: u64,
    pub purge_interval_ms: u64,
    pub message_delay_ms: u64,
    pub rate_limit_backoff_ms: u64,
    pub fetch_timeout_ms: u64,
    /// Port for the HTTP status endpoint, disabled when unset
    pub status_port: Option<u16>,
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => Err(ConfigError::Missing(name)),
            }
        };
        let number = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name,
                    value,
                }),
            }
        };

        let status_port = match lookup("STATUS_PORT") {
            None => None,
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "STATUS_PORT",
                value,
            })?),
        };

        let config = Self {
            bot_token: required("BOT_TOKEN")?,
            chat_id: required("CHAT_ID")?,
            poll_interval_ms: number("POLL_INTERVAL_MS", 15_000)?,
            max_age_hours: number("MAX_AGE_HOURS", 3)?,
            ttl_hours: number("TTL_HOURS", 6)?,
            purge_interval_ms: number("PURGE_INTERVAL_MS", 600_000)?,
            message_delay_ms: number("MESSAGE_DELAY_MS", 500)?,
            rate_limit_backoff_ms: number("RATE_LIMIT_BACKOFF_MS", 3_000)?,
            fetch_timeout_ms: number("FETCH_TIMEOUT_MS", 10_000)?,
            status_port,
        };

        // Hour windows must fit in i64 milliseconds
        for (name, value) in [
            ("MAX_AGE_HOURS", config.max_age_hours),
            ("TTL_HOURS", config.ttl_hours),
        ] {
            let fits = value
                .checked_mul(MS_PER_HOUR)
                .is_some_and(|ms| i64::try_from(ms).is_ok());
            if !fits {
                return Err(ConfigError::Invalid {
                    name,
                    value: value.to_string(),
                });
            }
        }

        // Zero periods would spin the timers
        for (name, value) in [
            ("POLL_INTERVAL_MS", config.poll_interval_ms),
            ("PURGE_INTERVAL_MS", config.purge_interval_ms),
            ("FETCH_TIMEOUT_MS", config.fetch_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    name,
                    value: value.to_string(),
                });
            }
        }

        Ok(config)
    }

    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            max_age: Duration::from_millis(self.max_age_hours * MS_PER_HOUR),
            message_delay: Duration::from_millis(self.message_delay_ms),
            rate_limit_backoff: Duration::from_millis(self.rate_limit_backoff_ms),
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            purge_interval: Duration::from_millis(self.purge_interval_ms),
        }
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_hours * MS_PER_HOUR)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
