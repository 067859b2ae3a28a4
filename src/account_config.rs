//! Per-account settings and their resolution against the global defaults
//!
//! Accounts carry a loosely-typed metadata map. [`AccountSettings`] picks the
//! keys this job understands out of it, rejecting values of the wrong shape,
//! and [`EffectiveConfig::resolve`] layers them over [`ArchiveDefaults`].

use serde_json::{Map, Value};
use tracing::warn;

use crate::archive_path::ArchivePattern;
use crate::config::{normalize_base, parse_flag_strict, ArchiveDefaults, MAX_RETENTION_MONTHS};
use crate::error::Result;

pub const KEY_ENABLED: &str = "autoArchiveEnabled";
pub const KEY_MONTHS: &str = "autoArchiveMonths";
pub const KEY_BASE: &str = "autoArchiveBase";
pub const KEY_PATTERN: &str = "autoArchivePattern";
pub const KEY_ALL_FOLDERS: &str = "autoArchiveAllFolders";
pub const KEY_INCLUDE_BASE: &str = "autoArchiveIncludeBase";

/// Overrides found in an account's metadata. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSettings {
    pub enabled: Option<bool>,
    pub retention_months: Option<u32>,
    pub archive_base: Option<String>,
    pub pattern: Option<String>,
    pub all_folders: Option<bool>,
    pub include_base: Option<bool>,
}

impl AccountSettings {
    /// Extracts the archive settings from an account metadata map.
    ///
    /// Absent and `null` keys stay unset. Malformed values are logged and
    /// ignored; retention above the global maximum is clamped.
    pub fn from_metadata(account_id: &str, metadata: &Map<String, Value>) -> Self {
        let present = |key: &str| metadata.get(key).filter(|value| !value.is_null());

        Self {
            enabled: present(KEY_ENABLED).and_then(|v| flag_value(account_id, KEY_ENABLED, v)),
            retention_months: present(KEY_MONTHS).and_then(|v| months_value(account_id, v)),
            archive_base: present(KEY_BASE).and_then(|v| base_value(account_id, v)),
            pattern: present(KEY_PATTERN).and_then(|v| string_value(account_id, KEY_PATTERN, v)),
            all_folders: present(KEY_ALL_FOLDERS)
                .and_then(|v| flag_value(account_id, KEY_ALL_FOLDERS, v)),
            include_base: present(KEY_INCLUDE_BASE)
                .and_then(|v| flag_value(account_id, KEY_INCLUDE_BASE, v)),
        }
    }
}

fn flag_value(account_id: &str, key: &str, value: &Value) -> Option<bool> {
    let parsed = match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) => parse_flag_strict(s),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        warn!(account = account_id, "Ignoring malformed {}: {}", key, value);
    }
    parsed
}

fn months_value(account_id: &str, value: &Value) -> Option<u32> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed {
        Some(months) if months > u64::from(MAX_RETENTION_MONTHS) => {
            warn!(
                account = account_id,
                "{} of {} clamped to {}", KEY_MONTHS, months, MAX_RETENTION_MONTHS
            );
            Some(MAX_RETENTION_MONTHS)
        }
        Some(months) => u32::try_from(months).ok(),
        None => {
            warn!(account = account_id, "Ignoring malformed {}: {}", KEY_MONTHS, value);
            None
        }
    }
}

fn string_value(account_id: &str, key: &str, value: &Value) -> Option<String> {
    match value.as_str().map(str::trim) {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => {
            warn!(account = account_id, "Ignoring malformed {}: {}", key, value);
            None
        }
    }
}

fn base_value(account_id: &str, value: &Value) -> Option<String> {
    string_value(account_id, KEY_BASE, value)
        .map(|base| normalize_base(&base))
        .filter(|base| {
            if base.is_empty() {
                warn!(account = account_id, "Ignoring empty {}", KEY_BASE);
            }
            !base.is_empty()
        })
}

/// The configuration one account is archived with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub enabled: bool,
    pub retention_months: u32,
    pub archive_base: String,
    pub pattern: ArchivePattern,
    pub all_folders: bool,
    pub include_base: bool,
}

impl EffectiveConfig {
    /// Layers account overrides over the global defaults.
    ///
    /// A disabled account resolves without looking at its other settings.
    /// An invalid per-account pattern is returned as a configuration error.
    pub fn resolve(defaults: &ArchiveDefaults, settings: &AccountSettings) -> Result<Self> {
        if settings.enabled == Some(false) {
            return Ok(Self {
                enabled: false,
                ..Self::from_defaults(defaults)
            });
        }

        let pattern = match &settings.pattern {
            Some(raw) => ArchivePattern::parse(raw)?,
            None => defaults.pattern.clone(),
        };

        Ok(Self {
            enabled: true,
            retention_months: settings.retention_months.unwrap_or(defaults.retention_months),
            archive_base: settings
                .archive_base
                .clone()
                .unwrap_or_else(|| defaults.archive_base.clone()),
            pattern,
            all_folders: settings.all_folders.unwrap_or(defaults.all_folders),
            include_base: settings.include_base.unwrap_or(defaults.include_base),
        })
    }

    fn from_defaults(defaults: &ArchiveDefaults) -> Self {
        Self {
            enabled: true,
            retention_months: defaults.retention_months,
            archive_base: defaults.archive_base.clone(),
            pattern: defaults.pattern.clone(),
            all_folders: defaults.all_folders,
            include_base: defaults.include_base,
        }
    }
}
