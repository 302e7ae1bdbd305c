//! Console text for a pass: banner, per-date blocks, closing line, alert text.

use chrono::{DateTime, Local};

use crate::config::CheckerConfig;
use crate::models::DateResult;

const RULE_WIDTH: usize = 62;

pub fn banner(config: &CheckerConfig, now: DateTime<Local>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{rule}\n  台鐵 Availability Checker | {}\n  Route : {} → {}  (x{} 座位)\n  Dates : {}\n{rule}",
        now.format("%Y-%m-%d %H:%M:%S"),
        config.origin,
        config.destination,
        config.seat_qty,
        config.dates.join(", "),
    )
}

/// Block for one date: the trains with seats, the sold-out count, or a
/// "nothing found" line.
pub fn date_block(result: &DateResult) -> String {
    let mut out = format!("\n  [{}]  ", result.date);
    if result.has_availability() {
        out.push_str(&format!("✓ {} train(s) available:", result.available.len()));
        for train in &result.available {
            out.push_str(&format!(
                "\n    車次 {:>5}  {:<4}  {} → {}  ${}",
                train.no, train.train_type, train.departure, train.arrival, train.price
            ));
        }
    } else if !result.sold_out.is_empty() {
        out.push_str(&format!("✗ All {} train(s) sold out", result.sold_out.len()));
    } else {
        out.push_str("✗ No trains / no seats found");
    }
    out
}

/// Block for a date whose every window failed: the error, then the
/// empty outcome recorded for it.
pub fn date_error(date: &str, error: &impl std::fmt::Display) -> String {
    format!(
        "\n  [{date}]  ERROR: {error}{}",
        date_block(&DateResult::empty(date))
    )
}

pub fn closing_line(any_available: bool) -> &'static str {
    if any_available {
        "\n  *** TICKETS AVAILABLE — book now! ***"
    } else {
        "\n  No availability found on any target date."
    }
}

/// Title and message of the alert for a date with seats.
pub fn alert_text(config: &CheckerConfig, result: &DateResult) -> (String, String) {
    let trains = result
        .available
        .iter()
        .map(|t| format!("車次{} {}出發", t.no, t.departure))
        .collect::<Vec<_>>()
        .join("、");
    (
        format!("台鐵有票！{}", result.date),
        format!(
            "{}→{} {}｜{trains}",
            config.origin, config.destination, result.date
        ),
    )
}
