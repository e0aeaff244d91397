use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::domain::models::IntegrationFormat;

/// Prefix for environment overrides, e.g. `FEEDRUNNER_POLLING__INTERVAL_SECS`.
pub const ENV_PREFIX: &str = "FEEDRUNNER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid abort_threshold: {0}. Must be at least 1")]
    InvalidAbortThreshold(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Client program cannot be empty")]
    EmptyClientProgram,

    #[error("Notification is enabled but no recipients are configured")]
    MissingRecipients,

    #[error("Feed #{0} has an empty path")]
    EmptyFeedPath(usize),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. The YAML file at `path` (skipped if it does not exist)
    /// 3. Environment variables (FEEDRUNNER_* prefix, `__` for nesting)
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// The integration format and per-feed record/operation values are left
    /// alone: a bad format fails the run, a bad feed entry fails only its job.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.polling.abort_threshold == 0 {
            return Err(ConfigError::InvalidAbortThreshold(
                config.polling.abort_threshold,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.client.program.trim().is_empty() {
            return Err(ConfigError::EmptyClientProgram);
        }

        if config.notification.enabled && config.notification.recipients.is_empty() {
            return Err(ConfigError::MissingRecipients);
        }

        if let Some(index) = config
            .feeds
            .iter()
            .position(|feed| feed.path.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyFeedPath(index + 1));
        }

        Ok(())
    }

    /// Problems a run would hit with this configuration.
    ///
    /// None of these stop the config from loading; they surface the same
    /// outcomes a run would report, ahead of time.
    pub fn preflight(config: &Config) -> Vec<String> {
        let mut issues = Vec::new();

        let format = match config.integration_format.parse::<IntegrationFormat>() {
            Ok(format) => Some(format),
            Err(e) => {
                issues.push(format!("{e}: the run would process no feeds"));
                None
            }
        };

        if config.feeds.is_empty() {
            issues.push("no feeds configured".to_string());
        }

        for (index, feed) in config.feeds.iter().enumerate() {
            let label = format!("feed #{} ({})", index + 1, feed.path.display());

            if !feed.path.exists() {
                issues.push(format!("{label}: file not found"));
            }
            if let Some(format) = format {
                if let Err(e) = format.validate(&feed.record_type, &feed.operation) {
                    issues.push(format!("{label}: {e}"));
                }
            }
            if config.feeds[..index].iter().any(|f| f.path == feed.path) {
                issues.push(format!("{label}: listed more than once"));
            }
        }

        if config.server.host.trim().is_empty() {
            issues.push("server.host is empty".to_string());
        }

        issues
    }
}
