//! Custom error types for pubmeta.
//!
//! All library functions return `Result<T, PubmetaError>` instead of using `unwrap()`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pubmeta operations.
#[derive(Debug, Error)]
pub enum PubmetaError {
    /// The profile source has no subject matching the query
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML/XML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message from API
        message: String,
    },

    /// CAPTCHA or traffic block detected
    #[error("CAPTCHA detected, please refresh cookies")]
    Captcha,

    /// A persisted dataset is not a JSON array of records
    #[error("Malformed snapshot {path}: {source}")]
    MalformedSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PubmetaError {
    /// Whether the failure concerns a single external call and the batch
    /// may continue with the next record.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Api { .. } | Self::RateLimited(_) | Self::Parse(_)
        )
    }
}

/// Result type alias using `PubmetaError`
pub type Result<T> = std::result::Result<T, PubmetaError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| PubmetaError::Parse(msg.to_string()))
    }
}
