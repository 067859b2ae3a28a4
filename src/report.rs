//! Run reporting: progress lines on stdout and the end-of-run report

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::buckets::Bucket;

/// Prefix of every progress line
pub const PROGRESS_PREFIX: &str = "[progress] ";

/// Prints `[progress]` lines when enabled.
///
/// A buffered reporter keeps the lines instead of printing them.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    enabled: bool,
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            buffer: None,
        }
    }

    /// An enabled reporter that collects its lines in memory
    pub fn buffered() -> Self {
        Self {
            enabled: true,
            buffer: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Lines collected so far by a buffered reporter
    pub fn lines(&self) -> Vec<String> {
        self.buffer
            .as_ref()
            .and_then(|buffer| buffer.lock().ok().map(|lines| lines.clone()))
            .unwrap_or_default()
    }

    pub fn moved(&self, account_id: &str, source: &str, target: &str, bucket: &Bucket) {
        self.emit(move_line(account_id, source, target, bucket));
    }

    pub fn account_scheduled(&self, account_id: &str, scheduled: usize) {
        self.emit(account_line(account_id, scheduled));
    }

    pub fn total_scheduled(&self, scheduled: usize) {
        self.emit(total_line(scheduled));
    }

    fn emit(&self, line: String) {
        if !self.enabled {
            return;
        }
        match &self.buffer {
            Some(buffer) => {
                if let Ok(mut lines) = buffer.lock() {
                    lines.push(line);
                }
            }
            None => println!("{}", line),
        }
    }
}

pub fn move_line(account_id: &str, source: &str, target: &str, bucket: &Bucket) -> String {
    format!(
        "{}user={} source={} target={} range={}",
        PROGRESS_PREFIX, account_id, source, target, bucket
    )
}

pub fn account_line(account_id: &str, scheduled: usize) -> String {
    format!("{}user={} scheduled={}", PROGRESS_PREFIX, account_id, scheduled)
}

pub fn total_line(scheduled: usize) -> String {
    format!("{}total_scheduled={}", PROGRESS_PREFIX, scheduled)
}

/// Why an account was left alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum AccountOutcome {
    Archived,
    Skipped(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountReport {
    pub account_id: String,
    pub username: String,
    pub outcome: AccountOutcome,
    pub mailboxes_scanned: usize,
    pub moves_dispatched: usize,
    /// Mailboxes created, or that would have been created in a dry run
    pub mailboxes_created: Vec<String>,
}

impl AccountReport {
    pub fn new(account_id: &str, username: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            username: username.to_string(),
            outcome: AccountOutcome::Archived,
            mailboxes_scanned: 0,
            moves_dispatched: 0,
            mailboxes_created: Vec::new(),
        }
    }

    pub fn skipped(account_id: &str, username: &str, reason: impl Into<String>) -> Self {
        Self {
            outcome: AccountOutcome::Skipped(reason.into()),
            ..Self::new(account_id, username)
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, AccountOutcome::Skipped(_))
    }
}

/// Outcome of one archiving run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    /// Accounts left out by the allow-list
    pub accounts_not_selected: usize,
    pub accounts: Vec<AccountReport>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            completed_at: None,
            dry_run,
            accounts_not_selected: 0,
            accounts: Vec::new(),
        }
    }

    pub fn finish(&mut self, completed_at: DateTime<Utc>) {
        self.completed_at = Some(completed_at);
    }

    pub fn total_moves(&self) -> usize {
        self.accounts.iter().map(|a| a.moves_dispatched).sum()
    }

    pub fn total_mailboxes_created(&self) -> usize {
        self.accounts.iter().map(|a| a.mailboxes_created.len()).sum()
    }

    pub fn archived_accounts(&self) -> usize {
        self.accounts.iter().filter(|a| !a.is_skipped()).count()
    }

    pub fn skipped_accounts(&self) -> usize {
        self.accounts.iter().filter(|a| a.is_skipped()).count()
    }

    pub fn account(&self, account_id: &str) -> Option<&AccountReport> {
        self.accounts.iter().find(|a| a.account_id == account_id)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "Auto-archive run {}{}", self.run_id, mode)?;
        writeln!(
            f,
            "  accounts: {} archived, {} skipped, {} not selected",
            self.archived_accounts(),
            self.skipped_accounts(),
            self.accounts_not_selected
        )?;
        if self.dry_run {
            writeln!(f, "  mailboxes to create: {}", self.total_mailboxes_created())?;
            write!(f, "  moves planned: {}", self.total_moves())?;
        } else {
            writeln!(f, "  mailboxes created: {}", self.total_mailboxes_created())?;
            write!(f, "  moves dispatched: {}", self.total_moves())?;
        }
        if let Some(completed_at) = self.completed_at {
            let elapsed = completed_at - self.started_at;
            write!(f, "\n  duration: {}s", elapsed.num_seconds())?;
        }
        Ok(())
    }
}
