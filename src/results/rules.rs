//! Extraction rules applied to one joined results row.
//!
//! Each rule is independent and total: a row that does not match yields the
//! placeholder instead of an error.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder for a field the row did not yield.
pub const UNKNOWN: &str = "?";

/// Marker shown on rows with a selectable seat.
pub const SELECT_MARKER: &str = "選擇";

/// Markers shown on rows without seats.
pub const SOLD_OUT_MARKERS: [&str; 4] = ["售完", "額滿", "無座", "候補"];

/// Service classes the site lists, in match priority order.
pub const TRAIN_TYPES: [&str; 8] = ["自強", "莒光", "復興", "區間", "普快", "太魯閣", "普悠瑪", "城際"];

static TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2}:\d{2}").unwrap());
static TRAIN_NO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{3,5})\b").unwrap());
static PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{3,4})\s*元").unwrap());
static TRAIN_TYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(&TRAIN_TYPES.join("|")).unwrap());

/// Whether the row carries any `HH:MM` time.
pub fn has_time(row: &str) -> bool {
    TIME.is_match(row)
}

pub fn is_selectable(row: &str) -> bool {
    row.contains(SELECT_MARKER)
}

pub fn is_sold_out(row: &str) -> bool {
    SOLD_OUT_MARKERS.iter().any(|m| row.contains(m))
}

/// First standalone run of 3 to 5 digits.
pub fn train_no(row: &str) -> String {
    TRAIN_NO
        .captures(row)
        .map_or_else(|| UNKNOWN.to_string(), |c| c[1].to_string())
}

/// First and second `HH:MM` in row order.
pub fn departure_arrival(row: &str) -> (String, String) {
    let mut times = TIME.find_iter(row).map(|m| m.as_str().to_string());
    let departure = times.next().unwrap_or_else(|| UNKNOWN.to_string());
    let arrival = times.next().unwrap_or_else(|| UNKNOWN.to_string());
    (departure, arrival)
}

/// First 3 or 4 digit amount followed by the currency unit.
pub fn price(row: &str) -> String {
    PRICE
        .captures(row)
        .map_or_else(|| UNKNOWN.to_string(), |c| c[1].to_string())
}

/// First service-class name in the row, or empty.
pub fn train_type(row: &str) -> String {
    TRAIN_TYPE
        .find(row)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Prefix of at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn train_no_takes_first_standalone_run() {
        assert_eq!(train_no("152|自強|08:00|10:00|選擇|450元"), "152");
        assert_eq!(train_no("1234|區間|09:10|11:40|售完"), "1234");
        assert_eq!(train_no("車次|08:00"), "?");
        // six digits are not a train number
        assert_eq!(train_no("123456|08:00"), "?");
    }

    #[test]
    fn times_in_row_order() {
        assert_eq!(
            departure_arrival("152|08:00|10:00"),
            ("08:00".to_string(), "10:00".to_string())
        );
        assert_eq!(
            departure_arrival("152|08:00"),
            ("08:00".to_string(), "?".to_string())
        );
        assert_eq!(departure_arrival("152"), ("?".to_string(), "?".to_string()));
    }

    #[test]
    fn price_needs_currency_unit() {
        assert_eq!(price("選擇|450元"), "450");
        assert_eq!(price("選擇|1,080|1080 元"), "1080");
        assert_eq!(price("選擇|450"), "?");
        assert_eq!(price("選擇|45元"), "?");
    }

    #[test]
    fn train_type_is_first_known_class() {
        assert_eq!(train_type("152|自強|08:00"), "自強");
        assert_eq!(train_type("408|普悠瑪|08:00"), "普悠瑪");
        assert_eq!(train_type("152|特快|08:00"), "");
    }

    #[test]
    fn markers() {
        assert!(is_selectable("152|選擇"));
        assert!(!is_selectable("152|售完"));
        for marker in SOLD_OUT_MARKERS {
            assert!(is_sold_out(&format!("152|08:00|{marker}")));
        }
        assert!(!is_sold_out("152|08:00|選擇"));
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("自強號", 2), "自強");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    proptest! {
        #[test]
        fn rules_never_panic(row in "\\PC{0,200}") {
            let _ = train_no(&row);
            let _ = departure_arrival(&row);
            let _ = price(&row);
            let _ = train_type(&row);
        }

        #[test]
        fn extracted_times_are_hh_mm_or_unknown(row in "[0-9:|a-z 元]{0,60}") {
            let (dep, arr) = departure_arrival(&row);
            for t in [dep, arr] {
                prop_assert!(t == UNKNOWN || (t.len() == 5 && &t[2..3] == ":"));
            }
        }

        #[test]
        fn extracted_train_no_is_short_digit_run(row in "[0-9|: ]{0,40}") {
            let no = train_no(&row);
            prop_assert!(no == UNKNOWN || ((3..=5).contains(&no.len()) && no.chars().all(|c| c.is_ascii_digit())));
        }

        #[test]
        fn truncation_is_bounded(text in "\\PC{0,300}", max in 0usize..150) {
            prop_assert!(truncate_chars(&text, max).chars().count() <= max);
        }
    }
}
