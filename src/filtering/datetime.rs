//! Shared date-time parser for temporal filter values
//!
//! Each function tries a cascade of accepted layouts and returns `None`
//! when none applies. Callers turn `None` into an invalid filter value.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Calendar date; a full timestamp contributes its date part
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    parse_local_datetime(s)
        .map(|dt| dt.date())
        .or_else(|| parse_offset_datetime(s).map(|dt| dt.date_naive()))
}

/// Wall-clock time of day
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
}

/// Local date-time; a bare date means midnight
pub fn parse_local_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Date-time with an explicit offset (RFC 3339)
pub fn parse_offset_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s.trim()).ok()
}

/// Point in time, normalized to UTC
///
/// Accepts RFC 3339, a naive date-time read as UTC, or epoch milliseconds.
pub fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Some(dt) = parse_offset_datetime(s) {
        return Some(dt.with_timezone(&Utc).fixed_offset());
    }
    if let Some(dt) = parse_local_datetime(s) {
        return Some(dt.and_utc().fixed_offset());
    }
    s.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.fixed_offset())
}

/// Time of day with offset (`10:15:30+01:00`), normalized to UTC wall time
pub fn parse_offset_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    let split = s.rfind(|c| c == '+' || c == '-').or_else(|| s.rfind('Z'))?;
    let (time, offset) = s.split_at(split);
    let time = parse_time(time)?;

    let offset_seconds = if offset == "Z" {
        0
    } else {
        parse_offset_seconds(offset)?
    };

    Some(time - chrono::Duration::seconds(offset_seconds))
}

/// `+HH:MM`, `-HH:MM` or `+HHMM` as seconds east of UTC
fn parse_offset_seconds(s: &str) -> Option<i64> {
    let (sign, digits) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours: i64 = digits[..2].parse().ok()?;
    let minutes: i64 = digits[2..].parse().ok()?;
    if hours > 18 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Zoned date-time; a trailing `[Region/Zone]` identifier is ignored
pub fn parse_zoned_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    let s = match s.find('[') {
        Some(i) if s.ends_with(']') => &s[..i],
        _ => s,
    };
    parse_offset_datetime(s)
}

/// Legacy calendar value; a bare date means UTC midnight
pub fn parse_calendar(s: &str) -> Option<DateTime<FixedOffset>> {
    parse_offset_datetime(s).or_else(|| {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(s.trim(), format).ok())
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().fixed_offset())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15"), expected);
        assert_eq!(parse_date("2024/01/15"), expected);
        assert_eq!(parse_date("15.01.2024"), expected);
        assert_eq!(parse_date("2024-01-15T14:35:42"), expected);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("14:35"), NaiveTime::from_hms_opt(14, 35, 0));
        assert_eq!(parse_time("14:35:42"), NaiveTime::from_hms_opt(14, 35, 42));
        assert_eq!(
            parse_time("14:35:42.250"),
            NaiveTime::from_hms_milli_opt(14, 35, 42, 250)
        );
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_parse_local_datetime() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(14, 35, 42);
        assert_eq!(parse_local_datetime("2024-01-15T14:35:42"), expected);
        assert_eq!(parse_local_datetime("2024-01-15 14:35:42"), expected);

        let midnight = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0);
        assert_eq!(parse_local_datetime("2024-01-15"), midnight);
        assert_eq!(parse_local_datetime("yesterday"), None);
    }

    #[test]
    fn test_parse_instant_normalizes_to_utc() {
        let a = parse_instant("2024-01-15T14:35:42+02:00").unwrap();
        assert_eq!(a.offset().local_minus_utc(), 0);
        assert_eq!(a.to_rfc3339(), "2024-01-15T12:35:42+00:00");

        let b = parse_instant("1705329342123").unwrap();
        assert_eq!(b.timestamp_millis(), 1705329342123);

        let c = parse_instant("2024-01-15T12:35:42").unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_parse_offset_time() {
        assert_eq!(
            parse_offset_time("10:15:30+01:00"),
            NaiveTime::from_hms_opt(9, 15, 30)
        );
        assert_eq!(
            parse_offset_time("10:15:30-02:00"),
            NaiveTime::from_hms_opt(12, 15, 30)
        );
        assert_eq!(parse_offset_time("10:15:30Z"), NaiveTime::from_hms_opt(10, 15, 30));
        assert_eq!(parse_offset_time("10:15:30"), None);
    }

    #[test]
    fn test_parse_zoned_and_calendar() {
        let zoned = parse_zoned_datetime("2024-01-15T10:00:00+01:00[Europe/Paris]").unwrap();
        assert_eq!(zoned.offset().local_minus_utc(), 3600);

        let cal = parse_calendar("2024-01-15").unwrap();
        assert_eq!(cal.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        assert!(parse_calendar("tomorrow").is_none());
    }
}
