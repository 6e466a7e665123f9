//! ISO 8601 conversions between strings and naive UTC datetimes.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static COMPACT_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([+-])(\d{2})(\d{2})$").expect("offset pattern is valid"));

/// Parse an ISO 8601 string and convert it to a naive UTC datetime.
///
/// Accepts `Z`, `+HH:MM` and `+HHMM` offsets, a `T` or a space between date and
/// time, and fractional seconds. Strings without an offset are taken as UTC; a bare
/// date is midnight UTC.
///
/// ```rust
/// use useful::time::string_to_datetime;
///
/// let dt = string_to_datetime("2020-06-02T02:31:57+0200").unwrap();
/// assert_eq!(dt.to_string(), "2020-06-02 00:31:57");
/// ```
pub fn string_to_datetime(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    let normalized = if text.ends_with(['Z', 'z']) {
        format!("{}+00:00", &text[..text.len() - 1])
    } else {
        COMPACT_OFFSET.replace(text, "$1$2:$3").into_owned()
    };
    debug!("Read date from iso format: {normalized}");

    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Ok(dt.naive_utc());
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    bail!("'{text}' is not an ISO 8601 datetime")
}

/// Format a naive datetime, taken as UTC, with seconds precision.
///
/// With `z` the offset is written as `Z`, otherwise as `+00:00`.
///
/// ```rust
/// use useful::time::{datetime_to_string, string_to_datetime};
///
/// let dt = string_to_datetime("2020-06-02T00:31:57.250Z").unwrap();
/// assert_eq!(datetime_to_string(&dt, true), "2020-06-02T00:31:57Z");
/// assert_eq!(datetime_to_string(&dt, false), "2020-06-02T00:31:57+00:00");
/// ```
pub fn datetime_to_string(datetime: &NaiveDateTime, z: bool) -> String {
    datetime.and_utc().to_rfc3339_opts(SecondsFormat::Secs, z)
}
