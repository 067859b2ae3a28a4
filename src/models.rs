use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::buckets::Bucket;

/// A mail store account with its opaque settings map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mailbox {
    pub id: String,
    pub path: String,
    /// Reserved role such as `\Sent` or `\Trash`
    pub special_use: Option<String>,
}

impl Mailbox {
    /// `INBOX` is the only path compared case-insensitively
    pub fn is_inbox(&self) -> bool {
        is_inbox_path(&self.path)
    }

    pub fn is_special_use(&self) -> bool {
        self.special_use
            .as_deref()
            .is_some_and(|role| !role.trim().is_empty())
    }
}

pub fn is_inbox_path(path: &str) -> bool {
    path.eq_ignore_ascii_case("INBOX")
}

/// Body of the search-and-move call for one bucket
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MoveRequest {
    pub mailbox: String,
    pub datestart: String,
    pub dateend: String,
    pub action: MoveAction,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MoveAction {
    #[serde(rename = "moveTo")]
    pub move_to: String,
}

impl MoveRequest {
    pub fn new(source_id: &str, target_id: &str, bucket: &Bucket) -> Self {
        Self {
            mailbox: source_id.to_string(),
            datestart: bucket.start_iso(),
            dateend: bucket.end_iso(),
            action: MoveAction {
                move_to: target_id.to_string(),
            },
        }
    }
}
