//! Shared date helpers.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

/// Formats a timestamp for display.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Midnight UTC at the start of `date`.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Midnight UTC on January 1st of the year containing `instant`.
pub fn year_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    let date = instant.date_naive();
    day_start(date.with_ordinal(1).unwrap_or(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let formatted = format_timestamp(timestamp);
        assert_eq!(formatted, "2024-01-01 12:00:00 UTC");
    }

    #[test]
    fn test_year_start() {
        let instant = Utc.with_ymd_and_hms(2024, 7, 14, 18, 30, 0).unwrap();
        assert_eq!(year_start(instant), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_day_start() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 5).unwrap();
        assert_eq!(day_start(date), Utc.with_ymd_and_hms(2023, 3, 5, 0, 0, 0).unwrap());
    }
}
