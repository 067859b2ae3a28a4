//! Archive mailbox provisioning with a per-account path cache
use crate::client::MailStoreClient;
use crate::enumerator::MailboxListing;
use crate::error::Result;
use std::collections::HashMap;
use tracing::{debug, info};

/// Where archived messages of one bucket go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxTarget {
    /// An existing (or just created) mailbox
    Mailbox(String),
    /// A mailbox a dry run would have created
    Planned,
}

impl MailboxTarget {
    pub fn id(&self) -> Option<&str> {
        match self {
            MailboxTarget::Mailbox(id) => Some(id),
            MailboxTarget::Planned => None,
        }
    }
}

/// Resolves archive paths to mailboxes for one account, creating them on
/// first use. Lives for a single account's iteration.
pub struct MailboxProvisioner<'a> {
    client: &'a dyn MailStoreClient,
    account_id: String,
    dry_run: bool,
    path_cache: HashMap<String, MailboxTarget>, // path -> target
    created: Vec<String>,
}

impl<'a> MailboxProvisioner<'a> {
    pub fn new(client: &'a dyn MailStoreClient, account_id: &str, dry_run: bool) -> Self {
        Self {
            client,
            account_id: account_id.to_string(),
            dry_run,
            path_cache: HashMap::new(),
            created: Vec::new(),
        }
    }

    /// Seeds the cache with the account's existing mailboxes so they are
    /// reused instead of recreated
    pub fn with_existing(mut self, listing: &MailboxListing) -> Self {
        for (path, id) in listing.path_map() {
            self.path_cache.insert(path, MailboxTarget::Mailbox(id));
        }
        debug!(
            account = %self.account_id,
            "Seeded mailbox cache with {} paths",
            self.path_cache.len()
        );
        self
    }

    /// Returns the mailbox for `path`, creating it if needed.
    ///
    /// Path comparison is exact. Each path is created at most once per
    /// provisioner; in a dry run nothing is created and the path resolves
    /// to [`MailboxTarget::Planned`].
    pub async fn ensure(&mut self, path: &str) -> Result<MailboxTarget> {
        if let Some(target) = self.path_cache.get(path) {
            debug!("Mailbox '{}' already known", path);
            return Ok(target.clone());
        }

        if self.dry_run {
            info!(
                account = %self.account_id,
                dry_run = true,
                "Would create mailbox {}",
                path
            );
            self.path_cache.insert(path.to_string(), MailboxTarget::Planned);
            self.created.push(path.to_string());
            return Ok(MailboxTarget::Planned);
        }

        info!(account = %self.account_id, "Creating mailbox {}", path);

        let id = self.client.create_mailbox(&self.account_id, path).await?;

        let target = MailboxTarget::Mailbox(id);
        self.path_cache.insert(path.to_string(), target.clone());
        self.created.push(path.to_string());
        Ok(target)
    }

    /// Paths created (or planned, in a dry run) so far
    pub fn created(&self) -> &[String] {
        &self.created
    }
}
