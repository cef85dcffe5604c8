//! Core domain types: events, calendar bucket granularity and time windows.

use crate::error::{Result, ScrobbleError};
use crate::utils::day_start;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key used for events whose optional `category` is absent.
pub const UNCATEGORIZED: &str = "(uncategorized)";

/// A single listening event. Created once at load time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Instant of the play, normalized to UTC.
    pub timestamp: DateTime<Utc>,
    /// Track title.
    pub track: String,
    /// Artist name.
    pub artist: String,
    /// Album title.
    pub album: String,
    /// Opaque, externally supplied classification (genre or similar).
    pub category: Option<String>,
}

impl Event {
    /// The UTC calendar day of the event, used for bucketing.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Which event field a bucketed count or ranking is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKey {
    /// Group by artist.
    #[default]
    Artist,
    /// Group by track title.
    Track,
    /// Group by album title.
    Album,
    /// Group by the opaque `category` metadata.
    Category,
}

impl CategoryKey {
    /// Extract this key from an event.
    pub fn key<'a>(&self, event: &'a Event) -> &'a str {
        match self {
            Self::Artist => &event.artist,
            Self::Track => &event.track,
            Self::Album => &event.album,
            Self::Category => event.category.as_deref().unwrap_or(UNCATEGORIZED),
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Artist => "artist",
            Self::Track => "track",
            Self::Album => "album",
            Self::Category => "category",
        };
        f.write_str(name)
    }
}

/// Calendar-aligned bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One bucket per UTC day.
    Day,
    /// One bucket per week, starting on the given weekday.
    Week(Weekday),
    /// One bucket per calendar month.
    Month,
}

impl Default for Granularity {
    fn default() -> Self {
        Self::Week(Weekday::Mon)
    }
}

impl Granularity {
    /// Start of the bucket containing `date`.
    pub fn floor(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week(week_start) => {
                let back = (7 + date.weekday().num_days_from_monday()
                    - week_start.num_days_from_monday())
                    % 7;
                date - Days::new(u64::from(back))
            }
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Start of the bucket following the one starting at `bucket`.
    ///
    /// `bucket` must already be a bucket start (see [`Granularity::floor`]).
    pub fn succ(&self, bucket: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => bucket.succ_opt(),
            Self::Week(_) => bucket.checked_add_days(Days::new(7)),
            Self::Month => bucket.checked_add_months(Months::new(1)),
        }
    }

    /// Every bucket start from the bucket of `first` to the bucket of `last`,
    /// inclusive, including buckets that would hold no events.
    pub fn buckets_between(&self, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
        if first > last {
            return Vec::new();
        }

        let last_bucket = self.floor(last);
        let mut buckets = Vec::new();
        let mut current = Some(self.floor(first));

        while let Some(bucket) = current {
            if bucket > last_bucket {
                break;
            }
            buckets.push(bucket);
            current = self.succ(bucket);
        }

        buckets
    }

    /// Number of bucket boundaries `t` with `start < t <= end`.
    pub fn count_boundaries(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
        let mut count = 0;
        let mut current = self.succ(self.floor(start.date_naive()));

        while let Some(bucket) = current {
            let instant = day_start(bucket);
            if instant > end {
                break;
            }
            if instant > start {
                count += 1;
            }
            current = self.succ(bucket);
        }

        count
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => f.write_str("day"),
            Self::Week(week_start) => write!(f, "week({week_start})"),
            Self::Month => f.write_str("month"),
        }
    }
}

/// Vertical ordering policy for stacked layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StackOrder {
    /// Keep the given layer order.
    None,
    /// Smallest window total at the bottom.
    Ascending,
    /// Largest window total at the bottom.
    Descending,
    /// Largest totals in the middle, alternating outward.
    #[default]
    InsideOut,
}

/// Baseline placement policy for stacked layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StackOffset {
    /// Baseline pinned at zero.
    Zero,
    /// Stack centred on zero at every bucket.
    Silhouette,
    /// Minimum-wiggle streamgraph baseline.
    #[default]
    Wiggle,
}

/// A non-empty `[start, end]` time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(ScrobbleError::invalid_selection(format!(
                "window start {start} is not before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Inclusive start instant.
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Inclusive end instant.
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `instant` lies inside the window (both ends inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// UTC calendar day of the start.
    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// UTC calendar day of the end.
    pub fn last_day(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// Clamp an arbitrary `[start, end]` into this window.
    ///
    /// Returns `None` when the clamped range is empty or inverted.
    pub fn clamp(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        let start = start.clamp(self.start, self.end);
        let end = end.clamp(self.start, self.end);
        Self::new(start, end).ok()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_floor_respects_week_start() {
        // 2023-01-04 is a Wednesday
        assert_eq!(Granularity::Week(Weekday::Mon).floor(date(2023, 1, 4)), date(2023, 1, 2));
        assert_eq!(Granularity::Week(Weekday::Sun).floor(date(2023, 1, 4)), date(2023, 1, 1));
        assert_eq!(Granularity::Week(Weekday::Wed).floor(date(2023, 1, 4)), date(2023, 1, 4));
    }

    #[test]
    fn test_month_floor_and_succ() {
        let g = Granularity::Month;
        assert_eq!(g.floor(date(2024, 2, 29)), date(2024, 2, 1));
        assert_eq!(g.succ(date(2024, 1, 1)), Some(date(2024, 2, 1)));
        assert_eq!(g.succ(date(2024, 12, 1)), Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_buckets_between_every_monday() {
        let buckets = Granularity::Week(Weekday::Mon).buckets_between(date(2023, 1, 3), date(2023, 1, 23));
        assert_eq!(
            buckets,
            vec![date(2023, 1, 2), date(2023, 1, 9), date(2023, 1, 16), date(2023, 1, 23)]
        );
    }

    #[test]
    fn test_buckets_between_inverted_is_empty() {
        assert!(Granularity::Day.buckets_between(date(2023, 2, 1), date(2023, 1, 1)).is_empty());
    }

    #[test]
    fn test_count_boundaries_excludes_start() {
        let g = Granularity::Week(Weekday::Mon);
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 1, 16, 0, 0, 0).unwrap();
        // Mondays after start up to and including end: Jan 9, Jan 16
        assert_eq!(g.count_boundaries(start, end), 2);
    }

    #[test]
    fn test_time_window_rejects_degenerate() {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert!(TimeWindow::new(t, t).is_err());
        assert!(TimeWindow::new(t, t - chrono::Duration::days(1)).is_err());
    }

    #[test]
    fn test_time_window_clamp() {
        let outer = TimeWindow::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let clamped = outer
            .clamp(
                Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
            )
            .unwrap();
        assert_eq!(clamped.start(), outer.start());

        // Entirely outside collapses to a point
        assert!(outer
            .clamp(
                Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            )
            .is_none());
    }

    #[test]
    fn test_category_key_uncategorized() {
        let event = Event {
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            track: "t".into(),
            artist: "a".into(),
            album: "b".into(),
            category: None,
        };
        assert_eq!(CategoryKey::Category.key(&event), UNCATEGORIZED);
        assert_eq!(CategoryKey::Album.key(&event), "b");
    }
}
