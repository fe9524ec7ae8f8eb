//! Canonical timestamps.
//!
//! Every timestamp in Nook is an `i64` count of Unix epoch milliseconds.
//! Remote peers have been observed sending `updatedAt` either as a number or
//! as an ISO-8601 string, so anything crossing a store or transport boundary
//! goes through [`normalize_timestamp`] before it is compared.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// Latest accepted timestamp, 9999-12-31T23:59:59.999Z.
pub const MAX_TIMESTAMP_MILLIS: i64 = 253_402_300_799_999;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp for a mutation of a record last stamped at `previous`.
///
/// Always strictly greater than `previous`, even when the wall clock is
/// behind it or has not advanced since the last edit.
pub fn next_updated_at(previous: i64) -> i64 {
    now_millis().max(previous.saturating_add(1))
}

/// Normalize a JSON timestamp value to epoch milliseconds.
///
/// Accepts integers, integral floats, decimal strings, and RFC 3339 /
/// ISO-8601 strings. Numbers are always read as milliseconds. Returns `None`
/// for anything else, including fractional numbers and values outside
/// `0..=MAX_TIMESTAMP_MILLIS`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn normalize_timestamp(value: &Value) -> Option<i64> {
    let millis = match value {
        Value::Number(number) => match number.as_i64() {
            Some(millis) => millis,
            None => {
                let float = number.as_f64()?;
                if !float.is_finite() || float.fract() != 0.0 || float.abs() > MAX_TIMESTAMP_MILLIS as f64 {
                    return None;
                }
                float as i64
            }
        },
        Value::String(text) => parse_timestamp_str(text)?,
        _ => return None,
    };
    in_range(millis)
}

fn in_range(millis: i64) -> Option<i64> {
    (0..=MAX_TIMESTAMP_MILLIS).contains(&millis).then_some(millis)
}

/// Parse a textual timestamp (decimal millis or ISO-8601) to epoch milliseconds.
pub fn parse_timestamp_str(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let millis = if text.bytes().all(|byte| byte.is_ascii_digit()) {
        text.parse::<i64>().ok()?
    } else if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        parsed.timestamp_millis()
    } else {
        // Zone-less ISO-8601 is read as UTC.
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()?
            .and_utc()
            .timestamp_millis()
    };
    in_range(millis)
}
