//! Human-readable formatting of sizes, durations, dates and authors.

use chrono::{DateTime, Utc};

const BYTE_UNITS: [&str; 6] = ["Bytes", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count using 1024-based units and at most two decimals.
///
/// ```
/// use pkglens_core::format_utils::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 Bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, BYTE_UNITS[unit])
}

/// Formats a byte count as megabytes with two decimals, e.g. `"1.50MB"`.
#[must_use]
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}MB", bytes_to_mib(bytes))
}

#[must_use]
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Formats a duration given in milliseconds.
///
/// Below one second the raw milliseconds are shown, below one minute the
/// seconds with two decimals, otherwise minutes and seconds.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }

    let seconds = format!("{:.2}", ms as f64 / 1000.0);
    if seconds.parse::<f64>().is_ok_and(|s| s < 60.0) {
        return format!("{}s", seconds);
    }

    let minutes = ms / 60_000;
    let remaining = (ms % 60_000) as f64 / 1000.0;
    format!("{}m {:.1}s", minutes, remaining)
}

/// Describes how long before `now` the instant `then` was, e.g. `"3 days ago"`.
///
/// Months are 30 days and years 12 such months.
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let years = months / 12;

    let (amount, unit) = if years > 0 {
        (years, "year")
    } else if months > 0 {
        (months, "month")
    } else if days > 0 {
        (days, "day")
    } else if hours > 0 {
        (hours, "hour")
    } else if minutes > 0 {
        (minutes, "minute")
    } else {
        return "Just now".to_string();
    };

    format!("{} {}{} ago", amount, unit, if amount == 1 { "" } else { "s" })
}

/// Formats the `author` field of a manifest.
///
/// Strings are returned as is; objects are rendered as `name <email> (url)`.
#[must_use]
pub fn format_author(author: &serde_json::Value) -> String {
    match author {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(fields) => {
            let field = |key: &str| fields.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty());
            let mut rendered = field("name").unwrap_or_default().to_string();
            if let Some(email) = field("email") {
                rendered.push_str(&format!(" <{}>", email));
            }
            if let Some(url) = field("url") {
                rendered.push_str(&format!(" ({})", url));
            }
            rendered
        }
        _ => "Not specified".to_string(),
    }
}

/// Formats a date the way reports display it.
#[must_use]
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    #[test]
    fn test_format_bytes_whole_units() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(500), "500 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1_048_576), "1 MB");
        assert_eq!(format_bytes(1_073_741_824), "1 GB");
    }

    #[test]
    fn test_format_bytes_rounds_to_two_decimals() {
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_300_000), "1.24 MB");
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(120 * 1024 * 1024), "120.00MB");
        assert_eq!(format_megabytes(1_572_864), "1.50MB");
    }

    #[test]
    fn test_format_duration_ranges() {
        assert_eq!(format_duration(500), "500ms");
        assert_eq!(format_duration(999), "999ms");
        assert_eq!(format_duration(1000), "1.00s");
        assert_eq!(format_duration(4250), "4.25s");
        assert_eq!(format_duration(65_000), "1m 5.0s");
        assert_eq!(format_duration(125_400), "2m 5.4s");
    }

    #[test]
    fn test_relative_time_units() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(relative_time(now, now), "Just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(relative_time(now - Duration::days(3), now), "3 days ago");
        assert_eq!(relative_time(now - Duration::days(65), now), "2 months ago");
        assert_eq!(relative_time(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn test_relative_time_in_the_future_is_just_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(relative_time(now + Duration::days(2), now), "Just now");
    }

    #[test]
    fn test_format_author_variants() {
        assert_eq!(format_author(&json!("Ada Lovelace")), "Ada Lovelace");
        assert_eq!(
            format_author(&json!({
                "name": "Ada",
                "email": "ada@example.com",
                "url": "https://example.com"
            })),
            "Ada <ada@example.com> (https://example.com)"
        );
        assert_eq!(format_author(&json!({"name": "Ada"})), "Ada");
        assert_eq!(format_author(&json!(null)), "Not specified");
        assert_eq!(format_author(&json!(42)), "Not specified");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_date(date), "2024-01-02 03:04 UTC");
    }
}
