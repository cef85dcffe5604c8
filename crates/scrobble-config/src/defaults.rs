//! Default values. The defaults reproduce the weekly artist streamgraph.

use crate::schema::*;
use chrono::Weekday;
use scrobble_common::CategoryKey;

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            bucketing: BucketingConfig::default(),
            ranking: RankingConfig::default(),
            layout: LayoutConfig::default(),
            selection: SelectionConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: "data/scrobbles.jsonl".to_string(),
            format: RecordFormat::JsonLines,
        }
    }
}

impl Default for BucketingConfig {
    fn default() -> Self {
        Self {
            stream_granularity: GranularityKind::Week,
            overview_granularity: GranularityKind::Week,
            week_start: Weekday::Mon,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            category: CategoryKey::Artist,
            top_k: 10,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { debounce_ms: 150 }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrobble_common::{Granularity, StackOffset, StackOrder};

    #[test]
    fn test_defaults_match_weekly_artist_stream() {
        let config = Config::default();
        assert_eq!(config.bucketing.stream(), Granularity::Week(Weekday::Mon));
        assert_eq!(config.ranking.category, CategoryKey::Artist);
        assert_eq!(config.layout.order, StackOrder::InsideOut);
        assert_eq!(config.layout.offset, StackOffset::Wiggle);
        assert_eq!(config.layout.layers, LayerSelection::All);
    }
}
