//! The archiving run: accounts → mailboxes → monthly buckets → moves
//!
//! Everything runs sequentially. An account-level configuration problem
//! skips that account; any store failure aborts the whole run.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tracing::{debug, info, warn};

use crate::account_config::{AccountSettings, EffectiveConfig};
use crate::buckets::{subtract_months, tile};
use crate::client::MailStoreClient;
use crate::config::Config;
use crate::dispatcher::MoveDispatcher;
use crate::enumerator::{list_accounts, list_mailboxes, oldest_message_time};
use crate::error::Result;
use crate::mailbox_manager::MailboxProvisioner;
use crate::models::Account;
use crate::report::{AccountReport, ProgressReporter, RunReport};
use crate::selection::should_archive_mailbox;

pub struct Archiver {
    client: Box<dyn MailStoreClient>,
    config: Config,
    progress: ProgressReporter,
}

impl Archiver {
    pub fn new(client: Box<dyn MailStoreClient>, config: Config) -> Self {
        let progress = ProgressReporter::new(config.progress);
        Self {
            client,
            config,
            progress,
        }
    }

    /// Replaces the reporter built from `config.progress`
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Archives every selected account relative to `now`
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let mut report = RunReport::new(Utc::now(), self.config.dry_run);
        info!(
            run_id = %report.run_id,
            dry_run = self.config.dry_run,
            "Starting auto-archive run"
        );

        let mut accounts = list_accounts(self.client.as_ref());
        while let Some(account) = accounts.try_next().await? {
            if !self.config.account_filter.should_archive_account(&account) {
                debug!("Account {} ({}) not selected", account.id, account.username);
                report.accounts_not_selected += 1;
                continue;
            }

            let account_report = self.archive_account(&account, now).await?;
            if !account_report.is_skipped() {
                self.progress
                    .account_scheduled(&account.id, account_report.moves_dispatched);
            }
            report.accounts.push(account_report);
        }

        let total = report.total_moves();
        self.progress.total_scheduled(total);

        report.finish(Utc::now());
        info!(
            run_id = %report.run_id,
            accounts = report.archived_accounts(),
            skipped = report.skipped_accounts(),
            moves = total,
            "Auto-archive run complete"
        );
        Ok(report)
    }

    async fn archive_account(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<AccountReport> {
        let account_id = account.id.as_str();
        let skip = |reason: String| -> Result<AccountReport> {
            info!(account = account_id, "Skipping account: {}", reason);
            Ok(AccountReport::skipped(account_id, &account.username, reason))
        };

        let settings = AccountSettings::from_metadata(account_id, &account.settings);
        let effective = match EffectiveConfig::resolve(&self.config.defaults, &settings) {
            Ok(effective) => effective,
            Err(e) if !e.is_fatal() => return skip(e.to_string()),
            Err(e) => return Err(e),
        };
        if !effective.enabled {
            return skip("auto-archive disabled".to_string());
        }

        let cutoff = match subtract_months(now, effective.retention_months) {
            Ok(cutoff) => cutoff,
            Err(e) if !e.is_fatal() => return skip(e.to_string()),
            Err(e) => return Err(e),
        };

        let listing = list_mailboxes(self.client.as_ref(), account_id).await?;
        if listing.inbox_id.is_none() {
            warn!(account = account_id, "Account has no INBOX");
            return skip("no INBOX".to_string());
        }

        info!(
            account = account_id,
            "Archiving {} (retention {} months, cutoff {})",
            account.username,
            effective.retention_months,
            cutoff.format("%Y-%m-%d")
        );

        let mut provisioner =
            MailboxProvisioner::new(self.client.as_ref(), account_id, self.config.dry_run)
                .with_existing(&listing);
        let dispatcher =
            MoveDispatcher::new(self.client.as_ref(), self.config.dry_run, self.progress.clone());
        let mut account_report = AccountReport::new(account_id, &account.username);

        for source in listing
            .mailboxes
            .iter()
            .filter(|mailbox| should_archive_mailbox(mailbox, &effective))
        {
            account_report.mailboxes_scanned += 1;

            let oldest = oldest_message_time(self.client.as_ref(), account_id, &source.id).await?;
            let Some(oldest) = oldest else {
                debug!(account = account_id, "{} is empty", source.path);
                continue;
            };
            if oldest >= cutoff {
                debug!(
                    account = account_id,
                    "{} has nothing older than cutoff", source.path
                );
                continue;
            }

            for bucket in tile(oldest, cutoff) {
                let target_path = effective.pattern.render(&effective.archive_base, &bucket);
                if target_path == source.path {
                    debug!(
                        account = account_id,
                        "{} already is the archive for {}", source.path, bucket
                    );
                    continue;
                }

                let target = provisioner.ensure(&target_path).await?;
                account_report.moves_dispatched += dispatcher
                    .dispatch(account_id, source, &target, &target_path, &bucket)
                    .await?;
            }
        }

        account_report.mailboxes_created = provisioner.created().to_vec();
        Ok(account_report)
    }
}
