//! Error type shared by the search, parsing and notification layers.

use thiserror::Error;

/// Failures that can end a single window, a whole date, or startup.
///
/// Window-level variants (`TokenNotFound`, `Network`, `Status`) are caught by
/// the date scan and never abort a pass. A row that matches both or neither
/// classification is not an error at all: the parser resolves it.
#[derive(Error, Debug)]
pub enum CheckError {
    /// The search page came back without the `queryForm` element.
    #[error("search form not found on {url}")]
    TokenNotFound { url: String },

    /// Transport failure, timeout or redirect loop.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The site answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Every configured window failed for one date.
    #[error("all {windows} window(s) failed for {date}: {last}")]
    AllWindowsFailed {
        date: String,
        windows: usize,
        last: Box<CheckError>,
    },

    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A notification channel could not deliver.
    #[error("notification failed: {0}")]
    Notify(String),
}

impl CheckError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a notification error.
    pub fn notify(message: impl Into<String>) -> Self {
        Self::Notify(message.into())
    }
}
