//! Account, mailbox and oldest-message lookups on top of [`MailStoreClient`]

use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde_json::Value;
use std::collections::HashMap;
use std::pin::Pin;
use tracing::{debug, warn};

use crate::client::{MailStoreClient, MessageSummary};
use crate::error::{ArchiveError, Result};
use crate::models::{Account, Mailbox};

/// Accounts requested per page
pub const ACCOUNT_PAGE_SIZE: usize = 100;

pub type AccountStream<'a> = Pin<Box<dyn Stream<Item = Result<Account>> + Send + 'a>>;

/// Lazily walks every account page by page.
///
/// The next page is only requested once the previous one has been consumed,
/// and the stream ends when the store stops returning a cursor.
pub fn list_accounts(client: &dyn MailStoreClient) -> AccountStream<'_> {
    Box::pin(try_stream! {
        let mut cursor: Option<String> = None;
        let mut page_number = 0usize;

        loop {
            let page = client.list_accounts(ACCOUNT_PAGE_SIZE, cursor.take()).await?;
            page_number += 1;
            debug!("Account page {} with {} accounts", page_number, page.accounts.len());

            for account in page.accounts {
                yield account;
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
    })
}

/// Mailboxes of one account
#[derive(Debug, Clone, Default)]
pub struct MailboxListing {
    pub mailboxes: Vec<Mailbox>,
    /// Identifier of the mailbox whose path is `INBOX` in any case
    pub inbox_id: Option<String>,
}

impl MailboxListing {
    pub fn new(mailboxes: Vec<Mailbox>) -> Self {
        let inbox_id = mailboxes
            .iter()
            .find(|mailbox| mailbox.is_inbox())
            .map(|mailbox| mailbox.id.clone());
        Self {
            mailboxes,
            inbox_id,
        }
    }

    /// Path → identifier map of the existing mailboxes
    pub fn path_map(&self) -> HashMap<String, String> {
        self.mailboxes
            .iter()
            .map(|mailbox| (mailbox.path.clone(), mailbox.id.clone()))
            .collect()
    }
}

/// Fetches the mailboxes of an account and locates its INBOX
pub async fn list_mailboxes(
    client: &dyn MailStoreClient,
    account_id: &str,
) -> Result<MailboxListing> {
    let mailboxes = client.list_mailboxes(account_id).await?;
    Ok(MailboxListing::new(mailboxes))
}

/// Ingestion time of the oldest message in a mailbox.
///
/// `None` when the mailbox is empty or the store's timestamp is missing or
/// malformed; the latter is logged since it hides archivable mail.
pub async fn oldest_message_time(
    client: &dyn MailStoreClient,
    account_id: &str,
    mailbox_id: &str,
) -> Result<Option<DateTime<Utc>>> {
    let Some(summary) = client.oldest_message(account_id, mailbox_id).await? else {
        return Ok(None);
    };

    match parse_idate(&summary) {
        Ok(idate) => Ok(Some(idate)),
        Err(e) => {
            warn!(
                account = account_id,
                mailbox = mailbox_id,
                "Skipping mailbox: {}",
                e
            );
            Ok(None)
        }
    }
}

fn parse_idate(summary: &MessageSummary) -> Result<DateTime<Utc>> {
    match &summary.idate {
        Some(Value::String(raw)) if !raw.trim().is_empty() => {
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| ArchiveError::Data(format!("malformed idate '{}': {}", raw, e)))
        }
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(ArchiveError::Data("oldest message has no idate".to_string()))
        }
        Some(other) => Err(ArchiveError::Data(format!("malformed idate {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AccountPage, MockMailStore};
    use chrono::TimeZone;
    use futures::TryStreamExt;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use serde_json::{json, Map};

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            username: format!("user-{}", id),
            settings: Map::new(),
        }
    }

    fn mailbox(id: &str, path: &str) -> Mailbox {
        Mailbox {
            id: id.to_string(),
            path: path.to_string(),
            special_use: None,
        }
    }

    fn summary(idate: Value) -> MessageSummary {
        MessageSummary { idate: Some(idate) }
    }

    #[tokio::test]
    async fn test_list_accounts_follows_cursor() {
        let mut client = MockMailStore::new();
        let mut seq = Sequence::new();

        client
            .expect_list_accounts()
            .with(eq(ACCOUNT_PAGE_SIZE), eq(None))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(AccountPage {
                    accounts: vec![account("a"), account("b")],
                    next_cursor: Some("page2".to_string()),
                })
            });
        client
            .expect_list_accounts()
            .with(eq(ACCOUNT_PAGE_SIZE), eq(Some("page2".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(AccountPage {
                    accounts: vec![account("c")],
                    next_cursor: None,
                })
            });

        let accounts: Vec<Account> = list_accounts(&client).try_collect().await.unwrap();
        let ids: Vec<&str> = accounts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_list_accounts_propagates_errors() {
        let mut client = MockMailStore::new();
        client.expect_list_accounts().times(1).returning(|_, _| {
            Err(ArchiveError::Transport {
                method: "GET".to_string(),
                url: "http://localhost/users".to_string(),
                status: 500,
                body: "boom".to_string(),
            })
        });

        let result: Result<Vec<Account>> = list_accounts(&client).try_collect().await;
        assert!(result.is_err());
    }

    #[test]
    fn test_listing_finds_inbox_case_insensitively() {
        let listing = MailboxListing::new(vec![
            mailbox("m1", "Sent Mail"),
            mailbox("m2", "Inbox"),
            mailbox("m3", "Archives"),
        ]);
        assert_eq!(listing.inbox_id.as_deref(), Some("m2"));
        assert_eq!(listing.path_map().get("Archives").map(String::as_str), Some("m3"));
    }

    #[test]
    fn test_listing_without_inbox() {
        let listing = MailboxListing::new(vec![mailbox("m1", "Projects")]);
        assert!(listing.inbox_id.is_none());
    }

    #[tokio::test]
    async fn test_oldest_message_time_parses_idate() {
        let mut client = MockMailStore::new();
        client
            .expect_oldest_message()
            .returning(|_, _| Ok(Some(summary(json!("2024-01-10T08:30:00.000Z")))));

        let oldest = oldest_message_time(&client, "u1", "m1").await.unwrap();
        assert_eq!(oldest, Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 30, 0).unwrap()));
    }

    #[tokio::test]
    async fn test_oldest_message_time_converts_offsets() {
        let mut client = MockMailStore::new();
        client
            .expect_oldest_message()
            .returning(|_, _| Ok(Some(summary(json!("2024-01-10T02:00:00+02:00")))));

        let oldest = oldest_message_time(&client, "u1", "m1").await.unwrap();
        assert_eq!(oldest, Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()));
    }

    #[tokio::test]
    async fn test_empty_mailbox() {
        let mut client = MockMailStore::new();
        client.expect_oldest_message().returning(|_, _| Ok(None));

        assert_eq!(oldest_message_time(&client, "u1", "m1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bad_idate_is_absorbed() {
        for bad in [json!("yesterday"), json!(""), json!(null), json!(1704873600)] {
            let mut client = MockMailStore::new();
            let value = bad.clone();
            client
                .expect_oldest_message()
                .returning(move |_, _| Ok(Some(summary(value.clone()))));

            assert_eq!(oldest_message_time(&client, "u1", "m1").await.unwrap(), None);
        }

        let mut client = MockMailStore::new();
        client
            .expect_oldest_message()
            .returning(|_, _| Ok(Some(MessageSummary { idate: None })));
        assert_eq!(oldest_message_time(&client, "u1", "m1").await.unwrap(), None);
    }
}
