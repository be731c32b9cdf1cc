//! `wct` timestamp parsing.
//!
//! The passive profile sends `wct` as an XML Schema `dateTime` with an
//! explicit zone: either `Z` or a numeric offset, with zero through seven
//! fractional-second digits. That is sixteen concrete shapes, covered
//! here by two fixed patterns (fractions are optional in both) plus an
//! explicit cap on fraction length.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// Accepted `wct` patterns: UTC designator form and numeric offset form.
/// `%.f` absorbs an optional dot plus fraction in both.
pub const WCT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%S%.f%:z"];

/// Longest fractional-second run the profile allows.
pub const MAX_FRACTION_DIGITS: usize = 7;

/// Parses a `wct` value, returning `None` for any shape outside the
/// profile.
#[must_use]
pub fn parse_wct(value: &str) -> Option<DateTime<FixedOffset>> {
    if fraction_digits(value) > MAX_FRACTION_DIGITS {
        return None;
    }
    if let Ok(utc) = NaiveDateTime::parse_from_str(value, WCT_FORMATS[0]) {
        return Some(utc.and_utc().fixed_offset());
    }
    DateTime::parse_from_str(value, WCT_FORMATS[1]).ok()
}

/// True when `instant` lies within `tolerance_secs` of `now`, either
/// direction. Senders ahead of our clock are as common as stale requests.
#[must_use]
pub fn within_tolerance(
    instant: DateTime<FixedOffset>,
    now: DateTime<Utc>,
    tolerance_secs: i64,
) -> bool {
    (now - instant.with_timezone(&Utc)).num_seconds().abs() <= tolerance_secs
}

fn fraction_digits(value: &str) -> usize {
    let Some(dot) = value.find('.') else { return 0 };
    value[dot + 1..]
        .chars()
        .take_while(char::is_ascii_digit)
        .count()
}
