//! Configuration schema definitions using serde with validation attributes.

use chrono::Weekday;
use scrobble_common::{CategoryKey, Granularity, LoggingConfig, StackOffset, StackOrder};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Where the listening history comes from.
    #[validate]
    pub data: DataConfig,
    /// Bucket widths.
    pub bucketing: BucketingConfig,
    /// Top-K ranking.
    #[validate]
    pub ranking: RankingConfig,
    /// Stream layout policies.
    pub layout: LayoutConfig,
    /// Selection handling.
    #[validate]
    pub selection: SelectionConfig,
    /// Logging output.
    #[validate]
    pub logging: LoggingSettings,
}

/// Input file configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DataConfig {
    /// Path of the record file.
    #[validate(custom(function = "crate::validation::validate_file_path", message = "Invalid data file path"))]
    pub path: String,
    /// Encoding of the record file.
    pub format: RecordFormat,
}

/// Supported record file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordFormat {
    /// A single JSON array of records.
    Json,
    /// One JSON record per line.
    #[default]
    JsonLines,
}

/// Bucket width names as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GranularityKind {
    /// Daily buckets.
    Day,
    /// Weekly buckets starting on `week_start`.
    Week,
    /// Calendar-month buckets.
    Month,
}

impl GranularityKind {
    /// Resolve into a concrete granularity using the configured week start.
    pub const fn resolve(self, week_start: Weekday) -> Granularity {
        match self {
            Self::Day => Granularity::Day,
            Self::Week => Granularity::Week(week_start),
            Self::Month => Granularity::Month,
        }
    }
}

/// Bucketing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketingConfig {
    /// Bucket width of the streamgraph.
    pub stream_granularity: GranularityKind,
    /// Bucket width of the whole-log overview histogram.
    pub overview_granularity: GranularityKind,
    /// First day of a week bucket.
    pub week_start: Weekday,
}

impl BucketingConfig {
    /// Resolved streamgraph granularity.
    pub const fn stream(&self) -> Granularity {
        self.stream_granularity.resolve(self.week_start)
    }

    /// Resolved overview granularity.
    pub const fn overview(&self) -> Granularity {
        self.overview_granularity.resolve(self.week_start)
    }
}

/// Ranking configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RankingConfig {
    /// Event field categories are keyed by.
    pub category: CategoryKey,
    /// Number of top categories to report.
    #[validate(range(min = 1, max = 1000, message = "top_k must be between 1 and 1000"))]
    pub top_k: usize,
}

/// Which categories become stream layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayerSelection {
    /// Every category seen in the window.
    #[default]
    All,
    /// Only the top-K ranked categories.
    TopK,
}

/// Stream layout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LayoutConfig {
    /// Layer ordering policy.
    pub order: StackOrder,
    /// Baseline offset policy.
    pub offset: StackOffset,
    /// Layer membership.
    pub layers: LayerSelection,
}

/// Selection handling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SelectionConfig {
    /// Quiet period used to coalesce bursts of selection changes.
    #[validate(range(max = 10000, message = "debounce_ms cannot exceed 10000"))]
    pub debounce_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    #[validate(custom(function = "crate::validation::validate_log_level", message = "Log level must be one of: trace, debug, info, warn, error"))]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json_format: bool,
    /// Optional log file (appended).
    pub file_path: Option<String>,
}

impl LoggingSettings {
    /// Convert into the subscriber configuration.
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.level.clone(),
            json_format: self.json_format,
            file_path: self.file_path.clone(),
            ..LoggingConfig::default()
        }
    }
}

impl Config {
    /// Full validation, including checks the derive cannot express.
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;

        let mut errors = validator::ValidationErrors::new();
        if let Some(ref file) = self.logging.file_path {
            if let Err(err) = crate::validation::validate_file_path(file) {
                errors.add("logging.file_path", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
