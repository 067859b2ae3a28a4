//! Which accounts and which mailboxes take part in a run

use std::collections::HashSet;

use crate::account_config::EffectiveConfig;
use crate::models::{Account, Mailbox};

/// Case-insensitive allow-list of account ids and usernames.
///
/// An empty filter admits every account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    allowed: HashSet<String>,
}

impl AccountFilter {
    /// Parses a comma-separated list, ignoring blank entries
    pub fn parse(list: &str) -> Self {
        let allowed = list
            .split(',')
            .map(|entry| entry.trim().to_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    /// Whether the account should be archived
    pub fn should_archive_account(&self, account: &Account) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        self.allowed.contains(&account.id.to_lowercase())
            || self.allowed.contains(&account.username.to_lowercase())
    }
}

/// Whether `path` is the archive base itself or lies below it
pub fn is_under_base(path: &str, base: &str) -> bool {
    path == base
        || path
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Mailbox eligibility for one account.
///
/// `INBOX` always qualifies and special-use mailboxes never do. The archive
/// base subtree is left alone unless `include_base` is set. Every other
/// mailbox is only archived with `all_folders`.
pub fn should_archive_mailbox(mailbox: &Mailbox, config: &EffectiveConfig) -> bool {
    if mailbox.is_inbox() {
        return true;
    }
    if mailbox.is_special_use() {
        return false;
    }
    if !config.include_base && is_under_base(&mailbox.path, &config.archive_base) {
        return false;
    }
    config.all_folders
}
