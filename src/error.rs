use thiserror::Error;

/// Type alias for Result with ArchiveError
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Error types for the archiving job
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Invalid global or per-account configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mail store answered with a non-success HTTP status
    #[error("{method} {url} failed: HTTP {status}: {body}")]
    Transport {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Mail store answered 2xx but reported `success: false`
    #[error("{operation} rejected by mail store: {details}")]
    Rejected { operation: String, details: String },

    /// Connection problems, timeouts, undecodable responses
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Missing or malformed data returned by the mail store
    #[error("Data error: {0}")]
    Data(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ArchiveError {
    /// Whether the error must abort the whole run.
    ///
    /// Configuration and data problems only affect the account or mailbox
    /// they were found in; everything coming from the transport is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ArchiveError::Config(_) | ArchiveError::Data(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        let transport = ArchiveError::Transport {
            method: "POST".to_string(),
            url: "http://localhost/users/u1/search".to_string(),
            status: 500,
            body: "{\"error\":\"boom\"}".to_string(),
        };
        assert!(transport.is_fatal());

        let rejected = ArchiveError::Rejected {
            operation: "create mailbox".to_string(),
            details: "{}".to_string(),
        };
        assert!(rejected.is_fatal());
    }

    #[test]
    fn test_local_errors() {
        assert!(!ArchiveError::Config("no INBOX".to_string()).is_fatal());
        assert!(!ArchiveError::Data("bad idate".to_string()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let error = ArchiveError::Transport {
            method: "GET".to_string(),
            url: "http://localhost/users".to_string(),
            status: 403,
            body: "denied".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("GET http://localhost/users failed"));
        assert!(display.contains("HTTP 403"));
        assert!(display.contains("denied"));

        let config_error = ArchiveError::Config("ARCHIVE_BASE cannot be empty".to_string());
        assert!(config_error.to_string().contains("Configuration error"));
    }
}
