//! Publication-date range filtering.
//!
//! Sources disagree on timestamp formats (`2024-03-15T10:00:00.000Z`,
//! `2024-03-15T10:00:00.123456`, `2024-03-15`, ...), so record dates go
//! through an explicit ordered list of parse strategies where the first
//! success wins. Range bounds are stricter and only accept two plain date
//! layouts.
//!
//! Policy:
//! - neither bound given: every record passes, whatever its date
//! - an unparsable bound counts as absent
//! - a record without a usable date fails every active bound

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::RunOptions;
use crate::models::CanonicalRecord;

/// Layouts accepted for range bounds.
const BOUND_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Record dates are cut to this many characters before the positional
/// formats are tried.
const POSITIONAL_PREFIX_LEN: usize = 26;

/// A named strategy that turns a normalized date string into a calendar day.
pub type DateStrategy = (&'static str, fn(&str) -> Option<NaiveDate>);

/// Record-date strategies, in the order they are attempted.
pub const RECORD_DATE_STRATEGIES: &[DateStrategy] = &[
    ("iso8601-offset", parse_iso_with_offset),
    ("iso8601-compact-offset", parse_iso_with_compact_offset),
    ("iso8601-naive", parse_iso_naive),
    ("iso8601-date", parse_iso_date),
    ("positional-fraction", |s| {
        positional(s, "%Y-%m-%dT%H:%M:%S%.f")
    }),
    ("positional-seconds", |s| positional(s, "%Y-%m-%dT%H:%M:%S")),
    ("positional-date", |s| {
        NaiveDate::parse_from_str(prefix(s), "%Y-%m-%d").ok()
    }),
];

fn parse_iso_with_offset(s: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn parse_iso_with_compact_offset(s: &str) -> Option<NaiveDate> {
    ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date_naive())
}

fn parse_iso_naive(s: &str) -> Option<NaiveDate> {
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|dt| dt.date())
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn positional(s: &str, fmt: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(prefix(s), fmt)
        .ok()
        .map(|dt| dt.date())
}

fn prefix(s: &str) -> &str {
    match s.char_indices().nth(POSITIONAL_PREFIX_LEN) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Parses a record's raw `publication_date`.
///
/// A trailing `Z` is rewritten to `+00:00` before the strategies run. The
/// calendar day is taken in the timestamp's own offset.
///
/// ```
/// use catalogo_core::filter::parse_record_date;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(parse_record_date("2024-03-15T00:00:00Z"), Some(day));
/// assert_eq!(parse_record_date("2024-03-15T08:30:00.1234567"), Some(day));
/// assert_eq!(parse_record_date("15/03/2024"), None);
/// ```
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = match trimmed.strip_suffix('Z') {
        Some(head) => format!("{}+00:00", head),
        None => trimmed.to_string(),
    };
    RECORD_DATE_STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(&normalized))
}

/// Parses a range bound (`YYYY-MM-DD` or `YYYY/MM/DD`).
pub fn parse_bound(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    BOUND_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Inclusive publication-date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Builds a range from raw bound strings; unparsable bounds are dropped
    /// with a warning.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Self {
        let bound = |name: &str, raw: Option<&str>| {
            let raw = raw.filter(|s| !s.trim().is_empty())?;
            let parsed = parse_bound(raw);
            if parsed.is_none() {
                tracing::warn!(bound = name, value = raw, "Ignoring unparsable date bound");
            }
            parsed
        };
        Self {
            from: bound("published_from", from),
            to: bound("published_to", to),
        }
    }

    pub fn from_options(options: &RunOptions) -> Self {
        Self::parse(
            options.published_from.as_deref(),
            options.published_to.as_deref(),
        )
    }

    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Returns true if a record with this raw date falls within the range.
    pub fn contains(&self, raw_date: &str) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(date) = parse_record_date(raw_date) else {
            return false;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Keeps the records whose publication date falls within `range`,
/// preserving order.
pub fn filter_by_publication_date(
    records: Vec<CanonicalRecord>,
    range: &DateRange,
) -> Vec<CanonicalRecord> {
    if !range.is_active() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| range.contains(&r.publication_date))
        .collect()
}
