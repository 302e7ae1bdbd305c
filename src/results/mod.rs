//! Parsing of the `queryTrain` results page into an availability report.

pub mod rules;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{AvailabilityReport, TrainEntry};

/// Page-level phrases meaning nothing can be booked.
const NO_SEAT_PHRASES: [&str; 4] = ["均沒有空位", "查無可售座位", "無座位", "候補"];

/// Site notices that show up on every page and carry no availability signal.
const BOILERPLATE_PHRASES: [&str; 5] = ["官方網站", "護照號碼", "未享法定", "切勿使用", "v3 驗證"];

const CELL_SEPARATOR: &str = "|";
const MIN_CELLS: usize = 4;
const RAW_ROW_LIMIT: usize = 120;

static ADVISORY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="mag-error"], [class*="mag-info"], [class*="alert-info"]"#).unwrap()
});
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Row classification. A selectable seat wins over any sold-out marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Available,
    SoldOut,
}

/// Text of an element with every text node trimmed, empty ones dropped.
fn element_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Decide whether a joined row is a train listing and which kind.
pub fn classify_row(row_text: &str) -> Option<RowStatus> {
    if !rules::has_time(row_text) {
        return None;
    }
    if rules::is_selectable(row_text) {
        Some(RowStatus::Available)
    } else if rules::is_sold_out(row_text) {
        Some(RowStatus::SoldOut)
    } else {
        None
    }
}

/// Pull the train fields out of a joined row.
pub fn parse_entry(row_text: &str) -> TrainEntry {
    let (departure, arrival) = rules::departure_arrival(row_text);
    TrainEntry {
        no: rules::train_no(row_text),
        train_type: rules::train_type(row_text),
        departure,
        arrival,
        price: rules::price(row_text),
        raw_row_text: rules::truncate_chars(row_text, RAW_ROW_LIMIT),
    }
}

/// Turn results markup into an availability report.
///
/// Never fails: markup without a usable table yields an empty report.
pub fn parse_results(html: &str) -> AvailabilityReport {
    let document = Html::parse_document(html);
    let mut report = AvailabilityReport::default();

    let page_text = element_text(document.root_element(), " ");
    report.no_seats_advisory = NO_SEAT_PHRASES.iter().any(|p| page_text.contains(p));

    for element in document.select(&ADVISORY) {
        let text = element_text(element, "");
        if !text.is_empty() && !BOILERPLATE_PHRASES.iter().any(|p| text.contains(p)) {
            report.advisory_messages.push(text);
        }
    }

    for row in document.select(&ROW) {
        let cells: Vec<String> = row.select(&CELL).map(|c| element_text(c, "")).collect();
        if cells.len() < MIN_CELLS {
            continue;
        }
        let row_text = cells.join(CELL_SEPARATOR);

        match classify_row(&row_text) {
            Some(RowStatus::Available) => report.available.push(parse_entry(&row_text)),
            Some(RowStatus::SoldOut) => report.sold_out.push(parse_entry(&row_text)),
            None => debug!("Skipping non-train row: {}", rules::truncate_chars(&row_text, 40)),
        }
    }

    report
}
