use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses the date formats the remote API emits: RFC 3339, a naive
/// date-time, or a bare `YYYY-MM-DD`. Naive values are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc())
}

pub fn parse_timestamp(raw: &str) -> Option<i64> {
    parse_datetime(raw).map(|parsed| parsed.timestamp_millis())
}

/// `dd/mm/yyyy`, or the raw text when it is not a date.
pub fn format_date(raw: &str) -> String {
    parse_datetime(raw)
        .map(|parsed| parsed.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_owned())
}

/// `dd/mm/yyyy, HH:MM`, or the raw text when it is not a date.
pub fn format_date_time(raw: &str) -> String {
    parse_datetime(raw)
        .map(|parsed| parsed.format("%d/%m/%Y, %H:%M").to_string())
        .unwrap_or_else(|| raw.to_owned())
}

/// Value for an `<input type="date">`.
pub fn date_input_value(raw: &str) -> String {
    parse_datetime(raw)
        .map(|parsed| parsed.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_owned())
}

pub fn today_input_value() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

pub fn now_display() -> String {
    Utc::now().format("%d/%m/%Y, %H:%M:%S").to_string()
}
