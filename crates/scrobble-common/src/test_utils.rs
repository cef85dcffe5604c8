//! Test utilities and shared fixtures.
//!
//! Available to other crates through the `testing` feature.

use crate::event_log::{EventLog, RawRecord};
use crate::types::Event;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use std::sync::Once;

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call multiple times.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Test fixture for creating a UTC timestamp.
pub fn mock_timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .unwrap()
}

/// Calendar date shorthand.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// An event at midnight UTC on the given date, keyed by `artist`.
pub fn event(date: NaiveDate, artist: &str) -> Event {
    Event {
        timestamp: crate::utils::day_start(date),
        track: format!("{artist} track"),
        artist: artist.to_string(),
        album: format!("{artist} album"),
        category: None,
    }
}

/// The three-event scenario used throughout the engine tests: A and B on
/// Monday 2023-01-02, A again on Monday 2023-01-09.
pub fn scenario_events() -> Vec<Event> {
    vec![
        event(date(2023, 1, 2), "A"),
        event(date(2023, 1, 2), "B"),
        event(date(2023, 1, 9), "A"),
    ]
}

/// A deterministic multi-year log: one play per day from 2022-01-01 to
/// 2023-06-30 across four artists, with a daily extra play of "Heavy".
pub fn sample_log() -> EventLog {
    let artists = ["Heavy", "Medium", "Light", "Rare"];
    let start = date(2022, 1, 1);
    let end = date(2023, 6, 30);

    let mut records = Vec::new();
    let mut day = start;
    let mut i = 0usize;
    while day <= end {
        let artist = artists[i % artists.len()];
        records.push(RawRecord::new(
            format!("{day} 12:00:00"),
            format!("song {i}"),
            artist,
            format!("{artist} album"),
        ));
        if i % 5 != 4 {
            records.push(RawRecord::new(format!("{day} 20:00:00"), "hit", "Heavy", "Heavy album"));
        }
        i += 1;
        day = day.checked_add_days(Days::new(1)).unwrap();
    }

    EventLog::from_records(records).unwrap()
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Property-based testing strategies.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use super::*;
    use proptest::prelude::*;

    /// Events spread over roughly two years with a small artist alphabet.
    pub fn events_strategy(max_len: usize) -> impl Strategy<Value = Vec<Event>> {
        prop::collection::vec((0u64..730, 0u32..86_400, 0usize..6), 1..max_len).prop_map(|rows| {
            rows.into_iter()
                .map(|(day_offset, secs, artist)| {
                    let day = date(2022, 1, 1).checked_add_days(Days::new(day_offset)).unwrap();
                    let mut ev = event(day, &format!("artist-{artist}"));
                    ev.timestamp += chrono::Duration::seconds(i64::from(secs));
                    ev
                })
                .collect()
        })
    }

    /// `(key, count)` pairs with unique keys.
    pub fn counts_strategy(max_len: usize) -> impl Strategy<Value = Vec<(String, u64)>> {
        prop::collection::vec(0u64..50, 0..max_len).prop_map(|counts| {
            counts
                .into_iter()
                .enumerate()
                .map(|(i, c)| (format!("key-{i}"), c))
                .collect()
        })
    }
}
