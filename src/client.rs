//! Mail store API client
//!
//! [`MailStoreClient`] is the seam between the archiving logic and the
//! WildDuck HTTP API; [`HttpMailStoreClient`] is the production
//! implementation. Calls are plain request/response with a per-request
//! timeout and no retries.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::models::{Account, Mailbox, MoveRequest};

/// One page of the account listing
#[derive(Debug, Clone, Default)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    /// Cursor for the following page, `None` on the last page
    pub next_cursor: Option<String>,
}

/// The oldest message of a mailbox as reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageSummary {
    /// Ingestion timestamp exactly as the store sent it
    #[serde(default)]
    pub idate: Option<Value>,
}

/// Trait defining the mail store operations the archiver relies on
#[async_trait]
pub trait MailStoreClient: Send + Sync {
    /// Fetch one page of accounts including their metadata
    async fn list_accounts(&self, limit: usize, cursor: Option<String>) -> Result<AccountPage>;

    /// List every mailbox of an account
    async fn list_mailboxes(&self, account_id: &str) -> Result<Vec<Mailbox>>;

    /// Fetch the oldest message of a mailbox, if any
    async fn oldest_message(
        &self,
        account_id: &str,
        mailbox_id: &str,
    ) -> Result<Option<MessageSummary>>;

    /// Create a mailbox and return its identifier
    async fn create_mailbox(&self, account_id: &str, path: &str) -> Result<String>;

    /// Move every message matching the request's mailbox and date range
    async fn search_and_move(&self, account_id: &str, request: &MoveRequest) -> Result<()>;
}

#[cfg(test)]
mockall::mock! {
    pub MailStore {}

    #[async_trait]
    impl MailStoreClient for MailStore {
        async fn list_accounts(&self, limit: usize, cursor: Option<String>) -> Result<AccountPage>;
        async fn list_mailboxes(&self, account_id: &str) -> Result<Vec<Mailbox>>;
        async fn oldest_message(
            &self,
            account_id: &str,
            mailbox_id: &str,
        ) -> Result<Option<MessageSummary>>;
        async fn create_mailbox(&self, account_id: &str, path: &str) -> Result<String>;
        async fn search_and_move(&self, account_id: &str, request: &MoveRequest) -> Result<()>;
    }
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default, rename = "metaData")]
    meta_data: Value,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    results: Vec<UserRecord>,
    /// A string while more pages exist; `false` or absent afterwards
    #[serde(default, rename = "nextCursor")]
    next_cursor: Value,
}

#[derive(Debug, Deserialize)]
struct MailboxRecord {
    id: String,
    path: String,
    #[serde(default, rename = "specialUse")]
    special_use: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultsResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateMailboxBody<'a> {
    path: &'a str,
}

impl From<UserRecord> for Account {
    fn from(record: UserRecord) -> Self {
        let settings = match record.meta_data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Account {
            id: record.id,
            username: record.username,
            settings,
        }
    }
}

impl From<MailboxRecord> for Mailbox {
    fn from(record: MailboxRecord) -> Self {
        Mailbox {
            id: record.id,
            path: record.path,
            special_use: record.special_use,
        }
    }
}

/// Production client talking JSON over HTTP to a WildDuck API endpoint
pub struct HttpMailStoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpMailStoreClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Root of the mail store API, e.g. `http://127.0.0.1:8080`
    /// * `timeout` - Applied to every request
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and decodes the JSON body of a 2xx response.
    ///
    /// Any other status becomes [`ArchiveError::Transport`] carrying the
    /// response body as returned by the store.
    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut builder = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ArchiveError::Transport {
                method: method.to_string(),
                url,
                status: status.as_u16(),
                body: text,
            });
        }

        let payload = if text.trim().is_empty() { "{}" } else { text.as_str() };
        Ok(serde_json::from_str(payload)?)
    }
}

#[async_trait]
impl MailStoreClient for HttpMailStoreClient {
    async fn list_accounts(&self, limit: usize, cursor: Option<String>) -> Result<AccountPage> {
        let mut query = vec![("limit", limit.to_string()), ("metaData", "true".to_string())];
        if let Some(cursor) = cursor {
            query.push(("next", cursor));
        }

        let response: UsersResponse = self
            .request(Method::GET, "/users", &query, None::<&()>)
            .await?;

        let next_cursor = match response.next_cursor {
            Value::String(cursor) if !cursor.is_empty() => Some(cursor),
            _ => None,
        };

        Ok(AccountPage {
            accounts: response.results.into_iter().map(Account::from).collect(),
            next_cursor,
        })
    }

    async fn list_mailboxes(&self, account_id: &str) -> Result<Vec<Mailbox>> {
        let response: ResultsResponse<MailboxRecord> = self
            .request(
                Method::GET,
                &format!("/users/{}/mailboxes", account_id),
                &[],
                None::<&()>,
            )
            .await?;
        Ok(response.results.into_iter().map(Mailbox::from).collect())
    }

    async fn oldest_message(
        &self,
        account_id: &str,
        mailbox_id: &str,
    ) -> Result<Option<MessageSummary>> {
        let response: ResultsResponse<MessageSummary> = self
            .request(
                Method::GET,
                &format!("/users/{}/mailboxes/{}/messages", account_id, mailbox_id),
                &[("limit", "1".to_string()), ("order", "asc".to_string())],
                None::<&()>,
            )
            .await?;
        Ok(response.results.into_iter().next())
    }

    async fn create_mailbox(&self, account_id: &str, path: &str) -> Result<String> {
        let response: StatusResponse = self
            .request(
                Method::POST,
                &format!("/users/{}/mailboxes", account_id),
                &[],
                Some(&CreateMailboxBody { path }),
            )
            .await?;

        match response {
            StatusResponse {
                success: true,
                id: Some(id),
            } if !id.is_empty() => Ok(id),
            other => Err(ArchiveError::Rejected {
                operation: format!("create mailbox '{}'", path),
                details: format!("success={} id={:?}", other.success, other.id),
            }),
        }
    }

    async fn search_and_move(&self, account_id: &str, request: &MoveRequest) -> Result<()> {
        let response: StatusResponse = self
            .request(
                Method::POST,
                &format!("/users/{}/search", account_id),
                &[],
                Some(request),
            )
            .await?;

        if !response.success {
            return Err(ArchiveError::Rejected {
                operation: format!("move from mailbox {}", request.mailbox),
                details: format!(
                    "range {}..{} to {}",
                    request.datestart, request.dateend, request.action.move_to
                ),
            });
        }
        Ok(())
    }
}
