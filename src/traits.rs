//! Seams between the scan logic and its collaborators

use async_trait::async_trait;

use crate::error::CheckError;
use crate::models::{AvailabilityReport, SearchRequest};

/// Runs one search window end to end: tokens, submission, parsing.
#[async_trait]
pub trait WindowSearch: Send + Sync {
    /// Search one date/window pair on the live site
    ///
    /// # Returns
    /// * `Result<AvailabilityReport, CheckError>` - The parsed report or the window's failure
    async fn search_window(&self, request: &SearchRequest)
    -> Result<AvailabilityReport, CheckError>;
}

/// Opens a fresh session (and cookie jar) for each pass.
pub trait SessionFactory: Send + Sync {
    type Session: WindowSearch;

    fn open(&self) -> Result<Self::Session, CheckError>;
}

/// A channel that can put a title and message in front of the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<(), CheckError>;
}
