//! Immutable run configuration, validated once at startup.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};

use crate::error::CheckError;
use crate::models::SearchRequest;

/// Production site root.
pub const DEFAULT_BASE_URL: &str = "https://www.railway.gov.tw";

const QUERY_PATH: &str = "/tra-tip-web/tip/tip001/tip123/query";
const QUERY_TRAIN_PATH: &str = "/tra-tip-web/tip/tip001/tip123/queryTrain";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Train-type codes submitted with every search.
pub const DEFAULT_TRAIN_TYPES: [&str; 6] = ["11", "1", "2", "3", "4", "5"];

const MAX_SEAT_QTY: u32 = 9;

/// Where and how the HTTP session talks to the site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Timeout for the token page GET
    pub token_timeout: Duration,
    /// Timeout for the search POST
    pub search_timeout: Duration,
}

impl SiteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            token_timeout: Duration::from_secs(15),
            search_timeout: Duration::from_secs(20),
        }
    }

    /// Page holding the search form and its tokens.
    pub fn query_page_url(&self) -> String {
        format!("{}{QUERY_PATH}", self.base_url)
    }

    /// Endpoint receiving the search submission.
    pub fn query_train_url(&self) -> String {
        format!("{}{QUERY_TRAIN_PATH}", self.base_url)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// A station as the site encodes it: `2220-清水`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub code: String,
    pub name: String,
}

impl FromStr for Station {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (code, name) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| CheckError::config(format!("station `{s}` is not CODE-NAME")))?;
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) || name.is_empty() {
            return Err(CheckError::config(format!(
                "station `{s}` is not CODE-NAME"
            )));
        }
        Ok(Self {
            code: code.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Departure-time range scoping one search submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, CheckError> {
        if start >= end {
            return Err(CheckError::config(format!(
                "window start {} is not before end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start_str(&self) -> String {
        self.start.format("%H:%M").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%H:%M").to_string()
    }

    /// Morning and evening halves of the service day.
    pub fn defaults() -> Vec<Self> {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default();
        vec![
            Self { start: at(6), end: at(14) },
            Self { start: at(14), end: at(22) },
        ]
    }
}

impl FromStr for TimeWindow {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| CheckError::config(format!("window `{s}` is not HH:MM-HH:MM")))?;
        let parse = |t: &str| {
            NaiveTime::parse_from_str(t.trim(), "%H:%M")
                .map_err(|e| CheckError::config(format!("window `{s}`: {e}")))
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_str(), self.end_str())
    }
}

/// Normalise a `YYYY/MM/DD` ride date, rejecting impossible dates.
pub fn parse_ride_date(s: &str) -> Result<String, CheckError> {
    NaiveDate::parse_from_str(s.trim(), "%Y/%m/%d")
        .map(|d| d.format("%Y/%m/%d").to_string())
        .map_err(|e| CheckError::config(format!("date `{s}` is not YYYY/MM/DD: {e}")))
}

/// Everything a run needs. Built once, then only borrowed.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub site: SiteConfig,
    pub origin: Station,
    pub destination: Station,
    pub passenger_id: String,
    pub seat_qty: u32,
    pub dates: Vec<String>,
    pub windows: Vec<TimeWindow>,
    pub train_types: Vec<String>,
    /// Pause after every window, successful or not
    pub window_pacing: Duration,
}

impl CheckerConfig {
    /// Create a config for a route with the stock windows and pacing.
    pub fn new(origin: Station, destination: Station, passenger_id: impl Into<String>) -> Self {
        Self {
            site: SiteConfig::default(),
            origin,
            destination,
            passenger_id: passenger_id.into(),
            seat_qty: 1,
            dates: Vec::new(),
            windows: TimeWindow::defaults(),
            train_types: DEFAULT_TRAIN_TYPES.iter().map(ToString::to_string).collect(),
            window_pacing: Duration::from_millis(1500),
        }
    }

    pub fn with_site(mut self, site: SiteConfig) -> Self {
        self.site = site;
        self
    }

    pub fn with_seat_qty(mut self, qty: u32) -> Self {
        self.seat_qty = qty;
        self
    }

    pub fn with_dates(mut self, dates: Vec<String>) -> Self {
        self.dates = dates;
        self
    }

    pub fn with_windows(mut self, windows: Vec<TimeWindow>) -> Self {
        self.windows = windows;
        self
    }

    /// Check the invariants the scan relies on and normalise the dates.
    pub fn validated(mut self) -> Result<Self, CheckError> {
        if self.passenger_id.trim().is_empty() {
            return Err(CheckError::config("passenger id is empty"));
        }
        if !(1..=MAX_SEAT_QTY).contains(&self.seat_qty) {
            return Err(CheckError::config(format!(
                "seat quantity {} is outside 1..={MAX_SEAT_QTY}",
                self.seat_qty
            )));
        }
        if self.dates.is_empty() {
            return Err(CheckError::config("no target dates"));
        }
        if self.windows.is_empty() {
            return Err(CheckError::config("no time windows"));
        }
        self.dates = self
            .dates
            .iter()
            .map(|d| parse_ride_date(d))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Fresh request value for one date and window.
    pub fn search_request(&self, date: &str, window: &TimeWindow) -> SearchRequest {
        SearchRequest {
            origin_code: self.origin.code.clone(),
            origin_name: self.origin.name.clone(),
            destination_code: self.destination.code.clone(),
            destination_name: self.destination.name.clone(),
            ride_date: date.to_string(),
            start_time: window.start_str(),
            end_time: window.end_str(),
            seat_qty: self.seat_qty,
            passenger_id: self.passenger_id.clone(),
            train_types: self.train_types.clone(),
        }
    }
}
