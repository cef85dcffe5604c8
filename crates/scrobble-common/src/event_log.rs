//! The normalized, read-only collection of listening events.

use crate::error::{Result, ScrobbleError};
use crate::types::{Event, TimeWindow};
use crate::utils::day_start;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

/// One row as delivered by a record source, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Date or date-time of the play. Absent or `null` reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ts: String,
    /// Track title.
    #[serde(default)]
    pub track: String,
    /// Artist name.
    #[serde(default)]
    pub artist: String,
    /// Album title.
    #[serde(default)]
    pub album: String,
    /// Optional opaque classification.
    #[serde(default)]
    pub category: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawRecord {
    /// Convenience constructor without category.
    pub fn new(
        ts: impl Into<String>,
        track: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            ts: ts.into(),
            track: track.into(),
            artist: artist.into(),
            album: album.into(),
            category: None,
        }
    }

    /// Attach a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Validate the row into an [`Event`]. `row` is the 1-based position of
    /// the record in its source, blank lines excluded, and is only used for
    /// error reporting.
    pub fn into_event(self, row: usize) -> Result<Event> {
        let timestamp = parse_timestamp(&self.ts).ok_or_else(|| {
            if self.ts.trim().is_empty() {
                ScrobbleError::malformed(row, "missing timestamp")
            } else {
                ScrobbleError::malformed(row, format!("unparseable timestamp '{}'", self.ts))
            }
        })?;

        Ok(Event {
            timestamp,
            track: self.track,
            artist: self.artist,
            album: self.album,
            category: self.category.filter(|c| !c.is_empty()),
        })
    }
}

/// Parse a date or date-time into a UTC instant.
///
/// Offsets are honoured; naive values are taken as UTC and a bare date is
/// midnight UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok().map(day_start)
}

/// Read-only event log. Loaded once; source order is preserved because
/// first-seen order is the tie-break for every ranking.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    first: DateTime<Utc>,
    last: DateTime<Utc>,
    extent: TimeWindow,
}

impl EventLog {
    /// Build a log from already-validated events.
    pub fn new(events: Vec<Event>) -> Result<Self> {
        let (Some(first), Some(last)) = (
            events.iter().map(|e| e.timestamp).min(),
            events.iter().map(|e| e.timestamp).max(),
        ) else {
            return Err(ScrobbleError::empty_input("event log has no events"));
        };

        let extent = match TimeWindow::new(first, last) {
            Ok(window) => window,
            // Every event shares one instant: widen to that instant's day
            Err(_) => {
                let day = first.date_naive();
                let next = day.checked_add_days(Days::new(1)).unwrap_or(day);
                TimeWindow::new(day_start(day), day_start(next))
                    .map_err(|_| ScrobbleError::empty_input("event log has no usable extent"))?
            }
        };

        debug!(events = events.len(), %extent, "Built event log");
        Ok(Self {
            events,
            first,
            last,
            extent,
        })
    }

    /// Validate raw rows into a log. The first bad row aborts the load.
    pub fn from_records(records: Vec<RawRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ScrobbleError::empty_input("record source yielded no rows"));
        }

        let events = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| record.into_event(idx + 1))
            .collect::<Result<Vec<_>>>()?;

        let log = Self::new(events)?;
        info!(events = log.len(), extent = %log.extent, "Loaded event log");
        Ok(log)
    }

    /// All events in source order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events (never zero).
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always `false`; an empty log cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest observed instant.
    pub const fn first_instant(&self) -> DateTime<Utc> {
        self.first
    }

    /// Latest observed instant.
    pub const fn last_instant(&self) -> DateTime<Utc> {
        self.last
    }

    /// Observed time extent, widened to a full day if every event shares
    /// one instant.
    pub const fn extent(&self) -> TimeWindow {
        self.extent
    }

    /// Events inside `window`, in source order.
    pub fn in_window<'a>(&'a self, window: &'a TimeWindow) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| window.contains(e.timestamp))
    }
}
