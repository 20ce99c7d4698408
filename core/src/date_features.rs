//! Calendar features derived from the application timestamp.
//!
//! Malformed dates are not errors: they coerce to "no date" and every
//! derived field is absent for that row.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse ISO-8601-like text into a wall-clock timestamp. Date-only
/// values land on midnight. Offsets are dropped, keeping the local time
/// as written; calendar features are read from this.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    parse_with(raw, |dt| dt.naive_local())
}

/// Parse into a comparable instant. Offset-bearing values are converted
/// to UTC; values without an offset are taken as UTC already.
///
/// RULE: ordering between records (the aggregation cutoff and window
/// bounds) always uses this, never `parse_timestamp`.
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    parse_with(raw, |dt| dt.naive_utc())
}

fn parse_with(raw: &str, on_offset: fn(DateTime<FixedOffset>) -> NaiveDateTime) -> Option<NaiveDateTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(on_offset(dt));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Year, month and weekday of an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFeatures {
    pub application_year: Option<i32>,
    /// 1–12.
    pub application_month: Option<u32>,
    /// Monday = 0 … Sunday = 6.
    pub application_day_of_week: Option<u32>,
}

impl DateFeatures {
    pub fn extract(date: Option<NaiveDateTime>) -> Self {
        match date {
            Some(d) => Self {
                application_year: Some(d.year()),
                application_month: Some(d.month()),
                application_day_of_week: Some(d.weekday().num_days_from_monday()),
            },
            None => Self::default(),
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        Self::extract(parse_timestamp(raw))
    }
}
