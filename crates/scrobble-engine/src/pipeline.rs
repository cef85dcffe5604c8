//! Recomputation of every window-dependent aggregate on selection change.

use crate::bucketer::{BucketedCount, TimeBucketer, TotalPoint};
use crate::stream_layout::{ensure_aligned, StackedSeries, StreamLayout};
use crate::summary::SummaryStats;
use crate::top_k::{select_top_k, RankedCategory};
use chrono::Weekday;
use scrobble_common::{CategoryKey, Event, EventLog, Granularity, Result, StackOffset, StackOrder, TimeWindow};
use scrobble_config::{Config, LayerSelection};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Aggregation parameters resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Bucket width of the streamgraph.
    pub stream_granularity: Granularity,
    /// Bucket width of the overview table.
    pub overview_granularity: Granularity,
    /// Weekday starting a week, for the summary week count.
    pub week_start: Weekday,
    /// Field categories are keyed by.
    pub category: CategoryKey,
    /// Number of ranked categories.
    pub top_k: usize,
    /// Layer ordering.
    pub order: StackOrder,
    /// Baseline offset.
    pub offset: StackOffset,
    /// Which categories become layers.
    pub layers: LayerSelection,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            stream_granularity: config.bucketing.stream(),
            overview_granularity: config.bucketing.overview(),
            week_start: config.bucketing.week_start,
            category: config.ranking.category,
            top_k: config.ranking.top_k,
            order: config.layout.order,
            offset: config.layout.offset,
            layers: config.layout.layers,
        }
    }
}

/// Whole-log totals with a running cumulative sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewTable {
    /// Bucket width.
    pub granularity: Granularity,
    /// One row per bucket over the full extent.
    pub points: Vec<TotalPoint>,
}

/// Everything a renderer needs for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Window the result was computed for.
    pub window: TimeWindow,
    /// Top categories in the window, count descending.
    pub ranked_categories: Vec<RankedCategory>,
    /// Laid-out stream layers.
    pub stacked_series: StackedSeries,
    /// Window statistics.
    pub summary_stats: SummaryStats,
}

/// Runs filter, bucket, rank and layout for a selection.
///
/// Holds no state that changes between calls, so the same window always
/// yields an equal result.
#[derive(Debug, Clone)]
pub struct AggregationPipeline {
    log: Arc<EventLog>,
    settings: PipelineSettings,
    overview: OverviewTable,
}

impl AggregationPipeline {
    /// Build a pipeline over a loaded log and compute the overview.
    pub fn new(log: Arc<EventLog>, settings: PipelineSettings) -> Result<Self> {
        let overview = TimeBucketer::new(settings.overview_granularity).bucket(log.events(), None)?;
        let overview = OverviewTable {
            granularity: settings.overview_granularity,
            points: overview.totals_table(),
        };
        info!(
            events = log.len(),
            overview_buckets = overview.points.len(),
            granularity = %settings.overview_granularity,
            "Aggregation pipeline ready"
        );

        Ok(Self {
            log,
            settings,
            overview,
        })
    }

    /// The loaded log.
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Active settings.
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Whole-log overview, computed once.
    pub const fn overview(&self) -> &OverviewTable {
        &self.overview
    }

    /// Dense stream-granularity counts for `window`, split by category.
    pub fn window_counts(&self, window: &TimeWindow) -> BucketedCount {
        let events: Vec<&Event> = self.log.in_window(window).collect();
        TimeBucketer::new(self.settings.stream_granularity).bucket_range(
            events,
            window.first_day(),
            window.last_day(),
            Some(self.settings.category),
        )
    }

    /// Recompute every aggregate for `window`.
    #[instrument(skip(self), fields(window = %window))]
    pub fn on_selection_changed(&self, window: &TimeWindow) -> Result<PipelineResult> {
        let settings = &self.settings;
        let events: Vec<&Event> = self.log.in_window(window).collect();
        let (first, last) = (window.first_day(), window.last_day());

        let stream = TimeBucketer::new(settings.stream_granularity).bucket_range(
            events.iter().copied(),
            first,
            last,
            Some(settings.category),
        );
        let daily = TimeBucketer::new(Granularity::Day).bucket_range(events.iter().copied(), first, last, None);

        let ranked_categories = select_top_k(&stream.category_totals(), settings.top_k);

        let layer_keys: Vec<String> = match settings.layers {
            LayerSelection::All => stream.categories().to_vec(),
            LayerSelection::TopK => ranked_categories.iter().map(|r| r.key.clone()).collect(),
        };
        let stacked_series = StreamLayout::new(settings.order, settings.offset).layout(&stream, &layer_keys)?;
        ensure_aligned(
            &stacked_series.buckets,
            &settings.stream_granularity.buckets_between(first, last),
        )?;

        let weeks = Granularity::Week(settings.week_start).count_boundaries(window.start(), window.end());
        let summary_stats = SummaryStats::from_daily_totals(daily.totals(), weeks);

        debug!(
            events = events.len(),
            categories = stream.categories().len(),
            layers = stacked_series.layers.len(),
            "Selection recomputed"
        );

        Ok(PipelineResult {
            window: *window,
            ranked_categories,
            stacked_series,
            summary_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrobble_common::test_utils::{mock_timestamp, sample_log, scenario_events};

    fn scenario_pipeline(settings: PipelineSettings) -> AggregationPipeline {
        let log = EventLog::new(scenario_events()).unwrap();
        AggregationPipeline::new(Arc::new(log), settings).unwrap()
    }

    #[test]
    fn test_scenario_result() {
        let pipeline = scenario_pipeline(PipelineSettings {
            top_k: 1,
            ..PipelineSettings::default()
        });
        let window = pipeline.log().extent();
        let result = pipeline.on_selection_changed(&window).unwrap();

        assert_eq!(result.ranked_categories.len(), 1);
        assert_eq!(result.ranked_categories[0].key, "A");
        assert_eq!(result.ranked_categories[0].count, 2);

        assert_eq!(result.stacked_series.buckets.len(), 2);
        let b = result.stacked_series.layer("B").unwrap();
        assert_eq!(b.points[1].count, 0);
        assert_eq!(result.summary_stats.event_count, 3);
        assert_eq!(result.summary_stats.days, 8);
        assert_eq!(result.summary_stats.weeks, 1);
    }

    #[test]
    fn test_top_k_layers_only() {
        let pipeline = scenario_pipeline(PipelineSettings {
            top_k: 1,
            layers: LayerSelection::TopK,
            ..PipelineSettings::default()
        });
        let result = pipeline.on_selection_changed(&pipeline.log().extent()).unwrap();
        assert_eq!(result.stacked_series.layers.len(), 1);
        assert_eq!(result.stacked_series.layers[0].key, "A");
    }

    #[test]
    fn test_idempotent() {
        let pipeline = AggregationPipeline::new(Arc::new(sample_log()), PipelineSettings::default()).unwrap();
        let window = TimeWindow::new(mock_timestamp(2022, 3, 5, 0, 0, 0), mock_timestamp(2022, 11, 20, 0, 0, 0)).unwrap();
        let first = pipeline.on_selection_changed(&window).unwrap();
        let second = pipeline.on_selection_changed(&window).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_overview_is_cumulative_over_whole_log() {
        let log = sample_log();
        let total = log.len() as u64;
        let pipeline = AggregationPipeline::new(Arc::new(log), PipelineSettings::default()).unwrap();
        let overview = pipeline.overview();
        assert_eq!(overview.points.last().unwrap().cumulative, total);
        assert_eq!(overview.granularity, Granularity::Week(Weekday::Mon));
    }

    #[test]
    fn test_window_without_events_has_zero_layers_but_full_buckets() {
        let pipeline = scenario_pipeline(PipelineSettings::default());
        let window = TimeWindow::new(mock_timestamp(2023, 1, 3, 0, 0, 0), mock_timestamp(2023, 1, 8, 0, 0, 0)).unwrap();
        let result = pipeline.on_selection_changed(&window).unwrap();
        assert!(result.ranked_categories.is_empty());
        assert!(result.stacked_series.is_empty());
        assert_eq!(result.stacked_series.buckets.len(), 1);
        assert_eq!(result.summary_stats.days, 6);
        assert_eq!(result.summary_stats.median_per_day, 0.0);
    }

    #[test]
    fn test_window_counts_match_ranking() {
        let pipeline = scenario_pipeline(PipelineSettings::default());
        let window = pipeline.log().extent();
        let counts = pipeline.window_counts(&window);
        let result = pipeline.on_selection_changed(&window).unwrap();
        assert_eq!(counts.event_count(), result.summary_stats.event_count);
    }
}
