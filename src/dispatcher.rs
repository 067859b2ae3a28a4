//! Issues one search-and-move command per bucket
use tracing::{debug, info, warn};

use crate::buckets::Bucket;
use crate::client::MailStoreClient;
use crate::error::Result;
use crate::mailbox_manager::MailboxTarget;
use crate::models::{Mailbox, MoveRequest};
use crate::report::ProgressReporter;

pub struct MoveDispatcher<'a> {
    client: &'a dyn MailStoreClient,
    dry_run: bool,
    progress: ProgressReporter,
}

impl<'a> MoveDispatcher<'a> {
    pub fn new(client: &'a dyn MailStoreClient, dry_run: bool, progress: ProgressReporter) -> Self {
        Self {
            client,
            dry_run,
            progress,
        }
    }

    /// Moves everything ingested in `[bucket.start, bucket.end)` from
    /// `source` into the target mailbox.
    ///
    /// Returns the number of move operations issued (or planned, in a dry
    /// run). The count is not verified against the store.
    pub async fn dispatch(
        &self,
        account_id: &str,
        source: &Mailbox,
        target: &MailboxTarget,
        target_path: &str,
        bucket: &Bucket,
    ) -> Result<usize> {
        if self.dry_run {
            info!(
                account = account_id,
                dry_run = true,
                "Would move {} -> {} for {}",
                source.path,
                target_path,
                bucket
            );
            return Ok(1);
        }

        let Some(target_id) = target.id() else {
            warn!(
                account = account_id,
                "No mailbox id for {}, skipping {} for {}", target_path, source.path, bucket
            );
            return Ok(0);
        };

        let request = MoveRequest::new(&source.id, target_id, bucket);
        debug!(
            account = account_id,
            "Moving {} -> {} for {}", source.path, target_path, bucket
        );
        self.client.search_and_move(account_id, &request).await?;

        self.progress.moved(account_id, &source.path, target_path, bucket);
        Ok(1)
    }
}
