//! Error types.
//!
//! Run-level errors abort a run before anything is dispatched. Remote
//! failures are recorded against a single insight kind and never abort.

use std::time::Duration;
use thiserror::Error;

/// Errors that abort a whole run before dispatch.
#[derive(Error, Debug)]
pub enum InsightError {
    /// The document has no content to analyze.
    #[error("Document is empty")]
    EmptyDocument,

    /// The detected language is not the supported one.
    #[error("Unsupported language '{detected}' (only '{supported}' is supported; pass --translate to translate first)")]
    UnsupportedLanguage { detected: String, supported: String },

    /// Translating an unsupported document failed.
    #[error("Translation failed: {0}")]
    TranslationFailed(#[source] CompletionError),
}

/// Failure of a remote completion call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cannot connect to {0}")]
    Connect(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key (set the {0} environment variable)")]
    MissingApiKey(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl CompletionError {
    /// Classifies a reqwest error the way the CLI reports it.
    ///
    /// The request URL is dropped from the message; it may carry credentials.
    pub fn from_reqwest(err: reqwest::Error, endpoint: &str, timeout: Duration) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            CompletionError::Timeout(timeout)
        } else if err.is_connect() {
            CompletionError::Connect(endpoint.to_string())
        } else {
            CompletionError::Http(err.to_string())
        }
    }
}

/// Failure to serialize or write an exported report.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
