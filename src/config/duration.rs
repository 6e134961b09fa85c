//! Duration parsing utilities.
//!
//! Config values such as `health.interval` or `lifecycle.settle.delay` are
//! written as human-readable strings like "1s", "500ms" or "2m".

use crate::error::{Error, Result};
use std::time::Duration;

/// Parse a duration string like "10s", "30s", "1m", "500ms", "1h".
///
/// Supported formats:
/// - `"Nms"` - N milliseconds (e.g., "500ms")
/// - `"Ns"` - N seconds (e.g., "30s")
/// - `"Nm"` - N minutes (e.g., "5m")
/// - `"Nh"` - N hours (e.g., "1h")
/// - `"N"` - N seconds (no suffix, assumes seconds)
///
/// Returns `None` if the string cannot be parsed.
///
/// # Examples
///
/// ```
/// use idp_supervisor::config::parse_duration_string;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration_string("1s"), Some(Duration::from_secs(1)));
/// assert_eq!(parse_duration_string("250ms"), Some(Duration::from_millis(250)));
/// assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
/// ```
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();

    if s.is_empty() {
        return None;
    }

    let (digits, unit_ms) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000)
    } else {
        (s, 1_000)
    };

    let value = digits.trim().parse::<u64>().ok()?;
    value.checked_mul(unit_ms).map(Duration::from_millis)
}

/// Parse an optional duration config field, naming the field on failure.
pub fn parse_duration_field(field: &str, value: Option<&str>) -> Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(raw) => parse_duration_string(raw).map(Some).ok_or_else(|| {
            Error::Config(format!(
                "Invalid duration '{}' for '{}' (expected e.g. \"500ms\", \"1s\", \"2m\")",
                raw, field
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration_string("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration_string("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration_string("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration_string("1h"), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_duration_no_suffix() {
        // Defaults to seconds when no suffix
        assert_eq!(parse_duration_string("10"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_parse_duration_with_whitespace() {
        assert_eq!(parse_duration_string("  5s  "), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration_string(""), None);
        assert_eq!(parse_duration_string("abc"), None);
        assert_eq!(parse_duration_string("5x"), None);
        assert_eq!(parse_duration_string("-5s"), None);
    }

    #[test]
    fn test_parse_duration_field_reports_field_name() {
        assert_eq!(parse_duration_field("health.interval", None).unwrap(), None);
        assert_eq!(
            parse_duration_field("health.interval", Some("2s")).unwrap(),
            Some(Duration::from_secs(2))
        );

        let err = parse_duration_field("health.interval", Some("soon")).unwrap_err();
        assert!(err.to_string().contains("health.interval"));
    }
}
