//! Boundary normalization for loosely typed record fields.
//!
//! Grow records carry dates in several shapes: RFC 3339 strings, bare
//! `YYYY-MM-DD` dates, epoch-millisecond numbers, and `{seconds, nanoseconds}`
//! objects exported from document stores. Everything is folded into
//! `DateTime<Utc>` here, at deserialization time, so the rest of the crate
//! only ever sees one representation. Values that cannot be parsed are
//! treated as absent.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse any supported JSON representation into a UTC timestamp.
pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Number(n) => n.as_f64().and_then(from_epoch_millis),
        Value::Object(obj) => {
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_f64)?;
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            from_epoch_millis(seconds * 1000.0 + nanos / 1_000_000.0)
        }
        _ => None,
    }
}

/// Parse a date string. Naive values (no offset) are read as UTC.
pub fn parse_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    None
}

fn from_epoch_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.round() as i64)
}

/// Parse a number that may arrive as a JSON number or a numeric string.
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Comparison key for catalogue names: trimmed and lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ── serde adapters ─────────────────────────────────────────────────────────

/// `deserialize_with` adapter for `Option<DateTime<Utc>>` fields.
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_value))
}

/// `deserialize_with` adapter for stage-date maps. Unparsable entries are dropped.
pub fn lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let mut out = BTreeMap::new();
    let Some(Value::Object(entries)) = raw else {
        return Ok(out);
    };
    for (key, value) in entries {
        match parse_value(&value) {
            Some(dt) => {
                out.insert(key, dt);
            }
            None if value.is_null() => {}
            None => tracing::warn!(stage = %key, "dropping unparsable stage date"),
        }
    }
    Ok(out)
}

/// `deserialize_with` adapter for optional numeric fields.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_number))
}

/// `deserialize_with` adapter for marker flags. Only a JSON `true`/`false`
/// counts; strings and numbers are ignored.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.as_bool()))
}

/// Like [`lenient_number`], but missing or bad values become zero.
pub fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339() {
        let dt = parse_value(&json!("2024-03-05T10:00:00.000Z")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_offset_into_utc() {
        let dt = parse_value(&json!("2024-03-05T10:00:00+02:00")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap());
    }

    #[test]
    fn parses_date_only_as_utc_midnight() {
        assert_eq!(parse_value(&json!("2024-03-05")), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn parses_epoch_seconds_object() {
        let v = json!({"seconds": 1_709_596_800, "nanoseconds": 0});
        assert_eq!(parse_value(&v), Some(ymd(2024, 3, 5)));

        let v = json!({"_seconds": 1_709_596_800, "_nanoseconds": 500_000_000});
        let dt = parse_value(&v).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_709_596_800_500);
    }

    #[test]
    fn parses_epoch_millis_number() {
        assert_eq!(
            parse_value(&json!(1_709_596_800_000_i64)),
            Some(ymd(2024, 3, 5))
        );
    }

    #[test]
    fn unparsable_values_are_absent() {
        assert_eq!(parse_value(&json!("soon")), None);
        assert_eq!(parse_value(&json!("")), None);
        assert_eq!(parse_value(&json!(true)), None);
        assert_eq!(parse_value(&json!({"when": 1})), None);
        assert_eq!(parse_value(&Value::Null), None);
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        assert_eq!(parse_number(&json!("12.5")), Some(12.5));
        assert_eq!(parse_number(&json!(3)), Some(3.0));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!(null)), None);
    }

    #[test]
    fn iso_output_uses_millis() {
        assert_eq!(to_iso(&ymd(2024, 1, 2)), "2024-01-02T00:00:00.000Z");
    }
}
