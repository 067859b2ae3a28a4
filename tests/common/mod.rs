//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mail_auto_archive::client::{AccountPage, MailStoreClient, MessageSummary};
use mail_auto_archive::config::Config;
use mail_auto_archive::error::{ArchiveError, Result};
use mail_auto_archive::models::{Account, Mailbox, MoveRequest};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 2024-06-15T00:00:00Z, the reference "now" of the scenarios
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
}

/// Create a test account with the given metadata object
pub fn create_test_account(id: &str, username: &str, metadata: Value) -> Account {
    Account {
        id: id.to_string(),
        username: username.to_string(),
        settings: metadata.as_object().cloned().unwrap_or_else(Map::new),
    }
}

pub fn create_test_mailbox(id: &str, path: &str) -> Mailbox {
    Mailbox {
        id: id.to_string(),
        path: path.to_string(),
        special_use: None,
    }
}

pub fn create_special_mailbox(id: &str, path: &str, role: &str) -> Mailbox {
    Mailbox {
        special_use: Some(role.to_string()),
        ..create_test_mailbox(id, path)
    }
}

/// Default configuration as if no environment variable were set
pub fn test_config() -> Config {
    Config::default()
}

pub fn dry_run_config() -> Config {
    Config {
        dry_run: true,
        ..Config::default()
    }
}

/// Mock WildDuck `/users` page (JSON)
pub fn mock_users_page(users: &[(&str, &str)], next_cursor: Option<&str>) -> Value {
    let results: Vec<Value> = users
        .iter()
        .map(|(id, username)| {
            json!({
                "id": id,
                "username": username,
                "metaData": {}
            })
        })
        .collect();

    json!({
        "success": true,
        "results": results,
        "nextCursor": next_cursor.map(Value::from).unwrap_or(Value::Bool(false))
    })
}

/// A store operation recorded by [`FakeMailStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListAccounts { cursor: Option<String> },
    ListMailboxes { account_id: String },
    OldestMessage { account_id: String, mailbox_id: String },
    CreateMailbox { account_id: String, path: String },
    SearchAndMove { account_id: String, request: MoveRequest },
}

#[derive(Default)]
struct StoreState {
    /// Account pages in order; each page but the last carries a cursor
    pages: Vec<Vec<Account>>,
    mailboxes: HashMap<String, Vec<Mailbox>>,
    /// (account, mailbox) -> idate as the store would send it
    oldest: HashMap<(String, String), Value>,
    calls: Vec<StoreCall>,
    next_id: usize,
    reject_creates: bool,
    fail_moves_with_status: Option<u16>,
}

/// In-memory mail store that records every call made against it
#[derive(Clone, Default)]
pub struct FakeMailStore {
    state: Arc<Mutex<StoreState>>,
}

impl FakeMailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account on a page of its own
    pub fn with_account_page(self, accounts: Vec<Account>) -> Self {
        self.state.lock().unwrap().pages.push(accounts);
        self
    }

    pub fn with_mailboxes(self, account_id: &str, mailboxes: Vec<Mailbox>) -> Self {
        self.state
            .lock()
            .unwrap()
            .mailboxes
            .insert(account_id.to_string(), mailboxes);
        self
    }

    pub fn with_oldest(self, account_id: &str, mailbox_id: &str, idate: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .oldest
            .insert((account_id.to_string(), mailbox_id.to_string()), idate);
        self
    }

    pub fn rejecting_creates(self) -> Self {
        self.state.lock().unwrap().reject_creates = true;
        self
    }

    pub fn failing_moves(self, status: u16) -> Self {
        self.state.lock().unwrap().fail_moves_with_status = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn created_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::CreateMailbox { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn moves(&self) -> Vec<MoveRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::SearchAndMove { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn listed_mailboxes_of(&self, account_id: &str) -> bool {
        self.calls().iter().any(|call| {
            matches!(call, StoreCall::ListMailboxes { account_id: id } if id == account_id)
        })
    }

    /// Path of a mailbox by id, including mailboxes created during the run
    pub fn path_of(&self, account_id: &str, mailbox_id: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .mailboxes
            .get(account_id)?
            .iter()
            .find(|mailbox| mailbox.id == mailbox_id)
            .map(|mailbox| mailbox.path.clone())
    }

    fn record(&self, call: StoreCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl MailStoreClient for FakeMailStore {
    async fn list_accounts(&self, _limit: usize, cursor: Option<String>) -> Result<AccountPage> {
        self.record(StoreCall::ListAccounts {
            cursor: cursor.clone(),
        });

        let state = self.state.lock().unwrap();
        let index = match &cursor {
            Some(cursor) => cursor
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| ArchiveError::Data(format!("bad cursor {}", cursor)))?,
            None => 0,
        };

        let accounts = state.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < state.pages.len()).then(|| format!("page-{}", index + 1));
        Ok(AccountPage {
            accounts,
            next_cursor,
        })
    }

    async fn list_mailboxes(&self, account_id: &str) -> Result<Vec<Mailbox>> {
        self.record(StoreCall::ListMailboxes {
            account_id: account_id.to_string(),
        });
        Ok(self
            .state
            .lock()
            .unwrap()
            .mailboxes
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn oldest_message(
        &self,
        account_id: &str,
        mailbox_id: &str,
    ) -> Result<Option<MessageSummary>> {
        self.record(StoreCall::OldestMessage {
            account_id: account_id.to_string(),
            mailbox_id: mailbox_id.to_string(),
        });
        let state = self.state.lock().unwrap();
        Ok(state
            .oldest
            .get(&(account_id.to_string(), mailbox_id.to_string()))
            .map(|idate| MessageSummary {
                idate: Some(idate.clone()),
            }))
    }

    async fn create_mailbox(&self, account_id: &str, path: &str) -> Result<String> {
        self.record(StoreCall::CreateMailbox {
            account_id: account_id.to_string(),
            path: path.to_string(),
        });

        let mut state = self.state.lock().unwrap();
        if state.reject_creates {
            return Err(ArchiveError::Rejected {
                operation: format!("create mailbox '{}'", path),
                details: "success=false id=None".to_string(),
            });
        }

        state.next_id += 1;
        let id = format!("created-{}", state.next_id);
        state
            .mailboxes
            .entry(account_id.to_string())
            .or_default()
            .push(create_test_mailbox(&id, path));
        Ok(id)
    }

    async fn search_and_move(&self, account_id: &str, request: &MoveRequest) -> Result<()> {
        self.record(StoreCall::SearchAndMove {
            account_id: account_id.to_string(),
            request: request.clone(),
        });

        if let Some(status) = self.state.lock().unwrap().fail_moves_with_status {
            return Err(ArchiveError::Transport {
                method: "POST".to_string(),
                url: format!("http://fake/users/{}/search", account_id),
                status,
                body: r#"{"error":"boom"}"#.to_string(),
            });
        }
        Ok(())
    }
}
