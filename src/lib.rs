//! Mail Auto-Archive
//!
//! A batch job that moves old messages out of live mailboxes on a WildDuck
//! mail store into dated archive mailboxes such as `Archives/2024/01`.
//!
//! # Overview
//!
//! For every selected account the job resolves the account's archive
//! settings, computes a retention cutoff and splits the time between the
//! oldest eligible message and the cutoff into calendar-month buckets. Each
//! bucket is moved server-side with a single search-and-move command into a
//! mailbox named after the bucket, which is created on first use.
//!
//! Runs are safe to repeat: a bucket already archived matches nothing the
//! next time around.
//!
//! # Example Usage
//!
//! ```no_run
//! use mail_auto_archive::{Archiver, Config, HttpMailStoreClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = HttpMailStoreClient::new(
//!         &config.endpoint,
//!         Duration::from_secs(config.http_timeout_secs),
//!     )?;
//!
//!     let report = Archiver::new(Box::new(client), config)
//!         .run(chrono::Utc::now())
//!         .await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`account_config`] - Per-account settings and their resolution
//! - [`archive_path`] - Archive mailbox path patterns
//! - [`archiver`] - The per-account archiving loop
//! - [`buckets`] - Calendar arithmetic and monthly bucketing
//! - [`client`] - Mail store API client
//! - [`config`] - Environment configuration
//! - [`dispatcher`] - Search-and-move dispatch
//! - [`enumerator`] - Account and mailbox enumeration
//! - [`error`] - Error types and result aliases
//! - [`mailbox_manager`] - Archive mailbox provisioning
//! - [`models`] - Core data structures
//! - [`report`] - Progress lines and the run report
//! - [`selection`] - Account and mailbox eligibility

pub mod account_config;
pub mod archive_path;
pub mod archiver;
pub mod buckets;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod enumerator;
pub mod error;
pub mod mailbox_manager;
pub mod models;
pub mod report;
pub mod selection;

// Re-export commonly used types for convenience
pub use error::{ArchiveError, Result};

// Core data models
pub use models::{Account, Mailbox, MoveRequest};

// Configuration
pub use account_config::{AccountSettings, EffectiveConfig};
pub use archive_path::ArchivePattern;
pub use config::{ArchiveDefaults, Config, LogFormat};

// Client traits
pub use client::{HttpMailStoreClient, MailStoreClient};

// Archiving
pub use archiver::Archiver;
pub use buckets::Bucket;
pub use mailbox_manager::{MailboxProvisioner, MailboxTarget};
pub use report::{AccountOutcome, AccountReport, ProgressReporter, RunReport};
