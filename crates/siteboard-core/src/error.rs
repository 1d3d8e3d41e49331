//! Error types for siteboard-core
//!
//! Every error here ends at a human decision point (retry, try again later,
//! contact support). Nothing is retried automatically.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for siteboard operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Snapshot fetch
    // ===================
    #[error("Website not found: {website_id}")]
    NotFound { website_id: String },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request for {website_id} rejected: HTTP {status}")]
    Rejected { website_id: String, status: u16 },

    #[error("Malformed website data for {website_id}: {message}")]
    Decode {
        website_id: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    // ===================
    // Gatekeeping
    // ===================
    #[error("Unsupported integration kind: {kind}")]
    Unsupported { kind: String },

    #[error("Another action is already in progress for {website_id}")]
    Busy { website_id: String },

    #[error("Invalid quota ceiling {query_limit} for {website_id}")]
    InvalidQuota { website_id: String, query_limit: i64 },

    // ===================
    // Billing collaborators
    // ===================
    #[error("{message}")]
    Billing { message: String },

    // ===================
    // Config
    // ===================
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    pub fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Busy { .. } => ErrorSeverity::Notice,
            CoreError::InvalidConfig { .. } | CoreError::ConfigRead { .. } => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Error,
        }
    }

    /// Whether re-invoking the same operation by hand may succeed
    pub fn allows_manual_retry(&self) -> bool {
        matches!(self, CoreError::Transport { .. })
    }
}

/// How an error should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Shown as a no-op, never as an error banner
    Notice,
    /// Surfaced to the user
    Error,
    /// Cannot continue
    Fatal,
}

/// Error rendered for a person, with what they can do about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub severity: ErrorSeverity,
    /// Actionable suggestion for user (optional)
    pub suggestion: Option<String>,
}

impl UserFacingError {
    /// Create user-friendly error from CoreError with context-aware suggestions
    pub fn from_core_error(error: &CoreError) -> Self {
        let (message, suggestion) = match error {
            CoreError::NotFound { website_id } => (
                format!("Could not load website {}", website_id),
                Some("Check the website ID in your dashboard".to_string()),
            ),
            CoreError::Transport { message, .. } => (
                format!("Could not reach the server: {}", message),
                Some("Retry".to_string()),
            ),
            CoreError::Rejected { website_id, status } => (
                format!(
                    "The server refused the request for website {} (HTTP {})",
                    website_id, status
                ),
                Some("Check the website ID and your access, or contact support".to_string()),
            ),
            CoreError::Decode { website_id, .. } => (
                format!("Website data for {} could not be read", website_id),
                Some("Try again later or contact support".to_string()),
            ),
            CoreError::Unsupported { kind } => (
                format!("Sync is not available for '{}' websites", kind),
                Some("Contact support".to_string()),
            ),
            CoreError::Busy { website_id } => (
                format!("An action for {} is already in progress", website_id),
                None,
            ),
            CoreError::InvalidQuota { .. } => (
                "Usage is unavailable for this website".to_string(),
                Some("Contact support".to_string()),
            ),
            CoreError::Billing { message } => {
                (message.clone(), Some("Try again later".to_string()))
            }
            CoreError::ConfigRead { path, .. } => (
                format!("Cannot read config file: {}", path.display()),
                Some(format!("Check permissions: chmod +r {}", path.display())),
            ),
            CoreError::InvalidConfig { message } => (
                format!("Invalid configuration: {}", message),
                Some("Fix the config file or remove it to use defaults".to_string()),
            ),
        };

        Self {
            message,
            severity: error.severity(),
            suggestion,
        }
    }
}
