//! Archive mailbox path templates
//!
//! A pattern such as `{base}/{year}/{month}` is validated once when it is
//! configured and rendered for every bucket afterwards.

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;

use crate::buckets::Bucket;
use crate::error::{ArchiveError, Result};

/// Pattern used when nothing else is configured
pub const DEFAULT_PATTERN: &str = "{base}/{year}/{month}";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());

const KNOWN_PLACEHOLDERS: [&str; 4] = ["base", "year", "month", "day"];

/// A validated archive path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePattern {
    raw: String,
}

impl ArchivePattern {
    /// Parses and validates a pattern.
    ///
    /// Every `{name}` must be one of `base`, `year`, `month` or `day`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ArchiveError::Config(
                "archive pattern cannot be empty".to_string(),
            ));
        }

        for caps in PLACEHOLDER.captures_iter(trimmed) {
            let name = &caps[1];
            if !KNOWN_PLACEHOLDERS.contains(&name) {
                return Err(ArchiveError::Config(format!(
                    "Invalid archive pattern '{}': unknown placeholder '{{{}}}'. Must be one of {{base}}, {{year}}, {{month}}, {{day}}",
                    trimmed, name
                )));
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Renders the mailbox path for `bucket` under `base`
    pub fn render(&self, base: &str, bucket: &Bucket) -> String {
        let start = bucket.start;
        PLACEHOLDER
            .replace_all(&self.raw, |caps: &Captures| match &caps[1] {
                "base" => base.to_string(),
                "year" => format!("{:04}", start.year()),
                "month" => format!("{:02}", start.month()),
                "day" => format!("{:02}", start.day()),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }
}

impl Default for ArchivePattern {
    fn default() -> Self {
        Self {
            raw: DEFAULT_PATTERN.to_string(),
        }
    }
}

impl fmt::Display for ArchivePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
