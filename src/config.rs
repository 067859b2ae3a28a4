//! Process-wide configuration read from the environment
//!
//! The environment is read exactly once at startup into an immutable
//! [`Config`] which is then passed to every component that needs it.

use crate::archive_path::ArchivePattern;
use crate::error::{ArchiveError, Result};
use crate::selection::AccountFilter;

pub const ENV_API: &str = "WILDDUCK_API";
pub const ENV_ARCHIVE_BASE: &str = "ARCHIVE_BASE";
pub const ENV_ARCHIVE_MONTHS: &str = "ARCHIVE_MONTHS";
pub const ENV_DRY_RUN: &str = "DRY_RUN";
pub const ENV_ARCHIVE_PATTERN: &str = "ARCHIVE_PATTERN";
pub const ENV_ALL_FOLDERS: &str = "ARCHIVE_ALL_FOLDERS";
pub const ENV_INCLUDE_BASE: &str = "ARCHIVE_INCLUDE_BASE";
pub const ENV_USERS: &str = "ARCHIVE_USERS";
pub const ENV_PROGRESS: &str = "ARCHIVE_PROGRESS";
pub const ENV_HTTP_TIMEOUT: &str = "ARCHIVE_HTTP_TIMEOUT_SECS";
pub const ENV_LOG_FORMAT: &str = "ARCHIVE_LOG_FORMAT";

/// Upper bound for any retention setting (100 years)
pub const MAX_RETENTION_MONTHS: u32 = 1200;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the mail store API
    pub endpoint: String,
    pub dry_run: bool,
    pub progress: bool,
    pub account_filter: AccountFilter,
    pub http_timeout_secs: u64,
    pub log_format: LogFormat,
    pub defaults: ArchiveDefaults,
}

/// Defaults every account starts from before its own settings are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDefaults {
    pub retention_months: u32,
    pub archive_base: String,
    pub pattern: ArchivePattern,
    pub all_folders: bool,
    pub include_base: bool,
}

impl Default for ArchiveDefaults {
    fn default() -> Self {
        Self {
            retention_months: default_retention_months(),
            archive_base: default_archive_base(),
            pattern: ArchivePattern::default(),
            all_folders: false,
            include_base: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ArchiveError::Config(format!(
                "Invalid {}: '{}'. Must be 'text' or 'json'",
                ENV_LOG_FORMAT, other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            dry_run: false,
            progress: false,
            account_filter: AccountFilter::default(),
            http_timeout_secs: default_http_timeout_secs(),
            log_format: LogFormat::default(),
            defaults: ArchiveDefaults::default(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_archive_base() -> String {
    "Archives".to_string()
}

fn default_retention_months() -> u32 {
    3
}

fn default_http_timeout_secs() -> u64 {
    60
}

/// Environment flag semantics: `1`, `true` and `yes` switch a flag on,
/// anything else leaves it off
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Strict variant used for per-account settings, where an unrecognised
/// value must not be mistaken for `false`
pub fn parse_flag_strict(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Strips surrounding whitespace and slashes from a mailbox base path
pub fn normalize_base(value: &str) -> String {
    value.trim().trim_matches('/').to_string()
}

impl Config {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, treating blank values
    /// as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let flag = |key: &str| get(key).is_some_and(|value| parse_flag(&value));

        let mut config = Config::default();

        if let Some(endpoint) = get(ENV_API) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(base) = get(ENV_ARCHIVE_BASE) {
            config.defaults.archive_base = normalize_base(&base);
        }
        if let Some(months) = get(ENV_ARCHIVE_MONTHS) {
            config.defaults.retention_months = months.trim().parse().map_err(|_| {
                ArchiveError::Config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    ENV_ARCHIVE_MONTHS, months
                ))
            })?;
        }
        if let Some(pattern) = get(ENV_ARCHIVE_PATTERN) {
            config.defaults.pattern = ArchivePattern::parse(&pattern)?;
        }
        if let Some(timeout) = get(ENV_HTTP_TIMEOUT) {
            config.http_timeout_secs = timeout.trim().parse().map_err(|_| {
                ArchiveError::Config(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_HTTP_TIMEOUT, timeout
                ))
            })?;
        }
        if let Some(format) = get(ENV_LOG_FORMAT) {
            config.log_format = LogFormat::parse(&format)?;
        }
        if let Some(users) = get(ENV_USERS) {
            config.account_filter = AccountFilter::parse(&users);
        }

        config.dry_run = flag(ENV_DRY_RUN);
        config.progress = flag(ENV_PROGRESS);
        config.defaults.all_folders = flag(ENV_ALL_FOLDERS);
        config.defaults.include_base = flag(ENV_INCLUDE_BASE);

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            ArchiveError::Config(format!(
                "{} is not a valid URL ('{}'): {}",
                ENV_API, self.endpoint, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ArchiveError::Config(format!(
                "{} must use http or https, got '{}'",
                ENV_API,
                url.scheme()
            )));
        }

        if self.defaults.archive_base.is_empty() {
            return Err(ArchiveError::Config(format!(
                "{} cannot be empty",
                ENV_ARCHIVE_BASE
            )));
        }

        if self.defaults.retention_months > MAX_RETENTION_MONTHS {
            return Err(ArchiveError::Config(format!(
                "{} cannot exceed {}",
                ENV_ARCHIVE_MONTHS, MAX_RETENTION_MONTHS
            )));
        }

        if self.http_timeout_secs == 0 {
            return Err(ArchiveError::Config(format!(
                "{} must be at least 1",
                ENV_HTTP_TIMEOUT
            )));
        }
        if self.http_timeout_secs > 600 {
            return Err(ArchiveError::Config(format!(
                "{} cannot exceed 600",
                ENV_HTTP_TIMEOUT
            )));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
