use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// `2024-10-11 08:00`, optionally followed by seconds or a zone annotation
/// such as `CDT (UTC-0500)`.
static ISO_DATE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})[ T](\d{2}:\d{2})(?::(\d{2}))?").unwrap());

/// `10/11/2024 08:00`
static US_DATE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})\s+(\d{1,2}:\d{2})").unwrap());

/// Format used in queue messages and logs.
pub const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses the first timestamp of a date or date range.
///
/// A range like `10/11/2024 08:00 - 10/11/2024 15:00` yields its lower
/// bound. Unparsable input yields `None` rather than an error.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let first = text.split(" - ").next().unwrap_or(text).trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(first) {
        return Some(parsed.naive_utc());
    }

    if let Some(caps) = ISO_DATE_TIME.captures(first) {
        let seconds = caps.get(3).map_or("00", |m| m.as_str());
        let combined = format!("{} {}:{}", &caps[1], &caps[2], seconds);
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&combined, WIRE_FORMAT) {
            return Some(parsed);
        }
    }

    if let Some(caps) = US_DATE_TIME.captures(first) {
        let combined = format!("{} {}", &caps[1], &caps[2]);
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&combined, "%m/%d/%Y %H:%M") {
            return Some(parsed);
        }
    }

    None
}

pub fn format_wire(value: Option<NaiveDateTime>) -> String {
    value
        .map(|v| v.format(WIRE_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_us_range_lower_bound() {
        assert_eq!(
            parse_date_time("10/11/2024 08:00 - 10/11/2024 15:00"),
            Some(at(2024, 10, 11, 8, 0))
        );
    }

    #[test]
    fn parses_iso_with_zone_annotation() {
        assert_eq!(
            parse_date_time("2024-10-14 13:30 CDT (UTC-0500)"),
            Some(at(2024, 10, 14, 13, 30))
        );
        assert_eq!(
            parse_date_time("2024-10-14 13:30 - 2024-10-14 17:00"),
            Some(at(2024, 10, 14, 13, 30))
        );
    }

    #[test]
    fn parses_wire_format_and_rfc3339() {
        assert_eq!(
            parse_date_time("2024-01-02 03:04:00"),
            Some(at(2024, 1, 2, 3, 4))
        );
        assert_eq!(
            parse_date_time("2024-01-02T03:04:00Z"),
            Some(at(2024, 1, 2, 3, 4))
        );
    }

    #[test]
    fn unparsable_dates_are_none() {
        assert_eq!(parse_date_time(""), None);
        assert_eq!(parse_date_time("ASAP"), None);
        assert_eq!(parse_date_time("2024-13-45 99:99"), None);
    }

    #[test]
    fn wire_format_round_trips_through_parser() {
        let value = at(2025, 3, 9, 23, 15);
        assert_eq!(parse_date_time(&format_wire(Some(value))), Some(value));
        assert_eq!(format_wire(None), "");
    }
}
