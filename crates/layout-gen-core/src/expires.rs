//! Layout expiration resolution.
//!
//! Relative expressions (`<digits><unit>`, unit one of `s m h d w`) resolve
//! against the caller's clock and render as UTC with a `Z` suffix, truncated
//! to seconds. Absolute timestamps keep their own offset and precision.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{LayoutError, LayoutResult};

static RELATIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(s|m|h|d|w)$").expect("valid expiration regex"));

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Resolve an optional expiration expression into a canonical timestamp.
pub fn resolve_expiration(expr: Option<&str>, now: DateTime<Utc>) -> LayoutResult<Option<String>> {
    let Some(expr) = expr else {
        return Ok(None);
    };

    let format_err = || LayoutError::ExpirationFormat {
        value: expr.to_string(),
    };

    if let Some(caps) = RELATIVE.captures(expr) {
        let amount: i64 = caps[1].parse().map_err(|_| format_err())?;
        let delta = match &caps[2] {
            "s" => TimeDelta::try_seconds(amount),
            "m" => TimeDelta::try_minutes(amount),
            "h" => TimeDelta::try_hours(amount),
            "d" => TimeDelta::try_days(amount),
            "w" => TimeDelta::try_weeks(amount),
            _ => None,
        }
        .ok_or_else(format_err)?;

        let expires = now.checked_add_signed(delta).ok_or_else(format_err)?;
        return Ok(Some(expires.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
    }

    parse_absolute(expr).map(Some).ok_or_else(format_err)
}

/// Re-render an absolute date or datetime in ISO-8601.
fn parse_absolute(expr: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(expr) {
        return Some(render_offset(&dt));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(expr, fmt) {
            let fraction = fraction(dt.nanosecond());
            return Some(format!("{}{fraction}", dt.format("%Y-%m-%dT%H:%M:%S")));
        }
    }
    NaiveDate::parse_from_str(expr, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn render_offset(dt: &DateTime<FixedOffset>) -> String {
    format!(
        "{}{}{}",
        dt.format("%Y-%m-%dT%H:%M:%S"),
        fraction(dt.nanosecond()),
        dt.format("%:z")
    )
}

/// Microsecond fraction, omitted when zero.
fn fraction(nanos: u32) -> String {
    let micros = nanos / 1_000;
    if micros == 0 {
        String::new()
    } else {
        format!(".{micros:06}")
    }
}
