use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::models::{AvailabilityReport, DateResult, TrainEntry};
use crate::report;
use crate::traits::{Notifier, WindowSearch};

/// Outcome of one sweep over every configured date.
#[derive(Debug, Default)]
pub struct PassSummary {
    pub results: Vec<DateResult>,
    pub any_available: bool,
}

/// Merge per-window reports in window order.
///
/// Available trains are deduplicated by train number, first one wins;
/// sold-out rows are concatenated as they come.
pub fn merge_reports(
    reports: impl IntoIterator<Item = AvailabilityReport>,
) -> (Vec<TrainEntry>, Vec<TrainEntry>) {
    let mut seen = HashSet::new();
    let mut available = Vec::new();
    let mut sold_out = Vec::new();

    for report in reports {
        for train in report.available {
            if seen.insert(train.no.clone()) {
                available.push(train);
            }
        }
        sold_out.extend(report.sold_out);
    }

    (available, sold_out)
}

/// Scans dates and windows strictly one at a time over a single session.
pub struct AvailabilityChecker<'a, S, N> {
    config: &'a CheckerConfig,
    search: &'a S,
    notifier: &'a N,
}

impl<'a, S: WindowSearch, N: Notifier> AvailabilityChecker<'a, S, N> {
    pub fn new(config: &'a CheckerConfig, search: &'a S, notifier: &'a N) -> Self {
        Self {
            config,
            search,
            notifier,
        }
    }

    /// Run every window for one date and merge what they found.
    ///
    /// A failing window is logged and skipped; only when every window fails
    /// does the date itself fail.
    pub async fn check_date(&self, date: &str) -> Result<DateResult, CheckError> {
        let mut reports = Vec::with_capacity(self.config.windows.len());
        let mut last_error = None;

        for window in &self.config.windows {
            let request = self.config.search_request(date, window);
            match self.search.search_window(&request).await {
                Ok(report) => {
                    debug!(
                        "{} {}: {} available, {} sold out",
                        date,
                        window,
                        report.available.len(),
                        report.sold_out.len()
                    );
                    for train in &report.available {
                        debug!("Open seats row: {}", train.raw_row_text);
                    }
                    if report.no_seats_advisory {
                        info!("{} {}: site reports no seats", date, window);
                    }
                    for message in &report.advisory_messages {
                        info!("{} {}: site notice: {}", date, window, message);
                    }
                    reports.push(report);
                }
                Err(e) => {
                    warn!("[ERR {}] {}: {}", window, date, e);
                    last_error = Some(e);
                }
            }
            tokio::time::sleep(self.config.window_pacing).await;
        }

        if reports.is_empty()
            && let Some(last) = last_error
        {
            return Err(CheckError::AllWindowsFailed {
                date: date.to_string(),
                windows: self.config.windows.len(),
                last: Box::new(last),
            });
        }

        let (available, sold_out) = merge_reports(reports);
        Ok(DateResult {
            date: date.to_string(),
            available,
            sold_out,
        })
    }

    /// Check every configured date in order, printing one block per date and
    /// alerting for each date with seats.
    pub async fn scan_dates(&self) -> PassSummary {
        let mut summary = PassSummary::default();

        for date in &self.config.dates {
            let result = match self.check_date(date).await {
                Ok(result) => {
                    println!("{}", report::date_block(&result));
                    result
                }
                Err(e) => {
                    error!("Date {} failed: {}", date, e);
                    println!("{}", report::date_error(date, &e));
                    DateResult::empty(date.as_str())
                }
            };

            if result.has_availability() {
                summary.any_available = true;
                info!(
                    "Found {} train(s) with seats on {}",
                    result.available.len(),
                    date
                );
                let (title, message) = report::alert_text(self.config, &result);
                if let Err(e) = self.notifier.notify(&title, &message).await {
                    warn!("Alert for {} not delivered: {}", date, e);
                }
            }

            summary.results.push(result);
        }

        summary
    }
}
