//! Calendar bucketing of events into dense, zero-filled count tables.

use chrono::NaiveDate;
use scrobble_common::{CategoryKey, Event, Granularity, Result, ScrobbleError};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Dense per-bucket counts, optionally split by category.
///
/// `buckets` holds every bucket start between the first and last bucket
/// with no gaps. `series[c][b]` is the number of events of category `c`
/// in bucket `b`; categories appear in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketedCount {
    granularity: Granularity,
    category_key: Option<CategoryKey>,
    buckets: Vec<NaiveDate>,
    categories: Vec<String>,
    series: Vec<Vec<u64>>,
    totals: Vec<u64>,
}

/// One row of a totals table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TotalPoint {
    /// Bucket start.
    pub bucket: NaiveDate,
    /// Events in the bucket.
    pub count: u64,
    /// Events in this and every earlier bucket.
    pub cumulative: u64,
}

impl BucketedCount {
    /// Assemble a table from pre-computed parts.
    ///
    /// The category key is left unset. No shape checks are done here;
    /// [`StreamLayout`](crate::StreamLayout) verifies alignment before
    /// stacking.
    pub fn from_parts(
        granularity: Granularity,
        buckets: Vec<NaiveDate>,
        categories: Vec<String>,
        series: Vec<Vec<u64>>,
    ) -> Self {
        let mut totals = vec![0; buckets.len()];
        for counts in &series {
            for (total, count) in totals.iter_mut().zip(counts) {
                *total += count;
            }
        }
        Self {
            granularity,
            category_key: None,
            buckets,
            categories,
            series,
            totals,
        }
    }

    /// Bucket width.
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Field the categories were keyed by, if split.
    pub const fn category_key(&self) -> Option<CategoryKey> {
        self.category_key
    }

    /// Bucket starts, ascending and gap-free.
    pub fn buckets(&self) -> &[NaiveDate] {
        &self.buckets
    }

    /// Categories in first-seen order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Per-bucket counts of one category, or `None` if it never occurs.
    pub fn series(&self, category: &str) -> Option<&[u64]> {
        self.categories
            .iter()
            .position(|c| c == category)
            .map(|index| self.series[index].as_slice())
    }

    /// Per-bucket totals over all categories.
    pub fn totals(&self) -> &[u64] {
        &self.totals
    }

    /// Count for one `(bucket, category)` cell; absent cells are zero.
    pub fn get(&self, bucket: NaiveDate, category: &str) -> u64 {
        let Ok(b) = self.buckets.binary_search(&bucket) else {
            return 0;
        };
        self.series(category)
            .and_then(|counts| counts.get(b).copied())
            .unwrap_or(0)
    }

    /// Whole-table count per category, in first-seen order.
    pub fn category_totals(&self) -> Vec<(String, u64)> {
        self.categories
            .iter()
            .zip(&self.series)
            .map(|(category, counts)| (category.clone(), counts.iter().sum()))
            .collect()
    }

    /// Number of events counted.
    pub fn event_count(&self) -> u64 {
        self.totals.iter().sum()
    }

    /// Totals with a running cumulative sum.
    pub fn totals_table(&self) -> Vec<TotalPoint> {
        let mut cumulative = 0;
        self.buckets
            .iter()
            .zip(&self.totals)
            .map(|(&bucket, &count)| {
                cumulative += count;
                TotalPoint {
                    bucket,
                    count,
                    cumulative,
                }
            })
            .collect()
    }

    /// Whether the table has no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Groups events into calendar-aligned buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucketer {
    granularity: Granularity,
}

impl TimeBucketer {
    /// Bucketer for the given width.
    pub const fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    /// Bucket width.
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Bucket events over their own extent.
    ///
    /// The bucket range runs from the bucket of the earliest event to the
    /// bucket of the latest. With `key` set, counts are split by category;
    /// otherwise only totals are kept.
    pub fn bucket<'a, I>(&self, events: I, key: Option<CategoryKey>) -> Result<BucketedCount>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let events: Vec<&Event> = events.into_iter().collect();
        let (Some(first), Some(last)) = (
            events.iter().map(|e| e.day()).min(),
            events.iter().map(|e| e.day()).max(),
        ) else {
            return Err(ScrobbleError::empty_input("no events to bucket"));
        };

        Ok(self.bucket_range(events, first, last, key))
    }

    /// Bucket events over the fixed day range `first..=last`.
    ///
    /// Every bucket in the range is present even when empty. Events whose
    /// day lies outside the range are ignored.
    #[instrument(level = "debug", skip(self, events), fields(granularity = %self.granularity))]
    pub fn bucket_range<'a, I>(
        &self,
        events: I,
        first: NaiveDate,
        last: NaiveDate,
        key: Option<CategoryKey>,
    ) -> BucketedCount
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let buckets = self.granularity.buckets_between(first, last);
        let width = buckets.len();

        let mut totals = vec![0u64; width];
        let mut categories: Vec<String> = Vec::new();
        let mut series: Vec<Vec<u64>> = Vec::new();
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut skipped = 0usize;

        for event in events {
            let day = event.day();
            if day < first || day > last {
                skipped += 1;
                continue;
            }
            let Ok(b) = buckets.binary_search(&self.granularity.floor(day)) else {
                skipped += 1;
                continue;
            };

            totals[b] += 1;

            if let Some(key) = key {
                let name = key.key(event);
                let c = *index.entry(name).or_insert_with(|| {
                    categories.push(name.to_string());
                    series.push(vec![0; width]);
                    series.len() - 1
                });
                series[c][b] += 1;
            }
        }

        if skipped > 0 {
            debug!(skipped, "Ignored events outside the bucket range");
        }

        BucketedCount {
            granularity: self.granularity,
            category_key: key,
            buckets,
            categories,
            series,
            totals,
        }
    }
}
