//! Data models for search inputs, parsed train rows and Discord webhook payloads

use serde::Serialize;

/// Anti-forgery token pair scraped from the search page.
///
/// Bound to the cookie state of the session that fetched it, so it is
/// fetched again before every submission and never shared across windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTokens {
    pub csrf: String,
    pub complete_token: String,
}

/// One search submission: route, date, window and passenger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub origin_code: String,
    pub origin_name: String,
    pub destination_code: String,
    pub destination_name: String,
    pub ride_date: String,
    pub start_time: String,
    pub end_time: String,
    pub seat_qty: u32,
    pub passenger_id: String,
    pub train_types: Vec<String>,
}

/// A results-table row recognised as a real train listing.
///
/// Fields the row does not yield stay as `"?"` (`train_type` stays empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainEntry {
    pub no: String,
    pub train_type: String,
    pub departure: String,
    pub arrival: String,
    pub price: String,
    pub raw_row_text: String,
}

/// What one results page says about seat availability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub available: Vec<TrainEntry>,
    pub sold_out: Vec<TrainEntry>,
    pub no_seats_advisory: bool,
    pub advisory_messages: Vec<String>,
}

/// Merged findings for one ride date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateResult {
    pub date: String,
    pub available: Vec<TrainEntry>,
    pub sold_out: Vec<TrainEntry>,
}

impl DateResult {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn has_availability(&self) -> bool {
        !self.available.is_empty()
    }
}

/// Discord embed structure for rich notifications
#[derive(Debug, Serialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub timestamp: String,
}

/// Discord webhook message payload
#[derive(Debug, Serialize)]
pub struct DiscordMessage {
    pub embeds: Vec<DiscordEmbed>,
}
