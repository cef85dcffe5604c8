//! Window summary statistics.

use serde::Serialize;

/// Headline numbers for the selected window.
///
/// Per-day figures run over every calendar day the window touches,
/// including days without plays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Events in the window.
    pub event_count: u64,
    /// Calendar days touched by the window.
    pub days: usize,
    /// Week boundaries crossed by the window.
    pub weeks: usize,
    /// Mean plays per day.
    pub mean_per_day: f64,
    /// Median plays per day.
    pub median_per_day: f64,
}

impl SummaryStats {
    /// Compute from dense daily totals and a week boundary count.
    pub fn from_daily_totals(daily: &[u64], weeks: usize) -> Self {
        let event_count: u64 = daily.iter().sum();
        let days = daily.len();
        let mean_per_day = if days == 0 {
            0.0
        } else {
            event_count as f64 / days as f64
        };

        Self {
            event_count,
            days,
            weeks,
            mean_per_day,
            median_per_day: median(daily),
        }
    }
}

fn median(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}
