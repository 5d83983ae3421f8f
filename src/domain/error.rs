//! Error types for table state synchronization.
//!
//! This module defines the centralized error type [`TableSyncError`], the
//! [`FetchError`] surfaced through query results, and a [`Result`] alias used
//! throughout the crate. All errors are implemented with `thiserror`.
//!
//! Decode and validation problems in URL values are deliberately *not*
//! represented here as hard failures on the hot path: the codec layer returns
//! `Option` and callers degrade to defaults. The variants below exist for the
//! places where a caller asked for strict parsing (configuration files, theme
//! files, data files) or where an external failure must reach the user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for table synchronization operations.
///
/// # Examples
///
/// ```
/// use tablesync::TableSyncError;
///
/// fn validate_page_size(size: usize) -> Result<(), TableSyncError> {
///     if size == 0 {
///         return Err(TableSyncError::Config("page_size must be positive".to_string()));
///     }
///     Ok(())
/// }
/// assert!(validate_page_size(0).is_err());
/// ```
#[derive(Debug, Error)]
pub enum TableSyncError {
    /// A URL or message value could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A decoded value referenced an unknown column or a disallowed operator.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The fetch function failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Theme parsing or application failed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A URL could not be parsed.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure reported by a fetch function.
///
/// Stored in the query cache and handed back to the table consumer, so it is
/// cheap to clone and comparable in tests. The manager never retries on any of
/// these; retry policy belongs to whoever supplies the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchError {
    /// The request never produced a response.
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a failure status.
    #[error("server responded {status}: {message}")]
    Server {
        /// Status code reported by the server.
        status: u16,
        /// Message body or reason phrase.
        message: String,
    },

    /// The response could not be parsed into a page.
    #[error("malformed response: {0}")]
    Parse(String),
}

impl From<TableSyncError> for FetchError {
    /// Maps a source-side failure to what a client would observe: bad
    /// request parameters are a 400, unreadable data a parse failure,
    /// anything else a 500.
    fn from(error: TableSyncError) -> Self {
        match error {
            TableSyncError::Fetch(inner) => inner,
            TableSyncError::Validation(message) | TableSyncError::Decode(message) => {
                Self::Server { status: 400, message }
            }
            TableSyncError::Json(e) => Self::Parse(e.to_string()),
            other => Self::Server {
                status: 500,
                message: other.to_string(),
            },
        }
    }
}

/// A specialized `Result` type for table synchronization operations.
pub type Result<T> = std::result::Result<T, TableSyncError>;
