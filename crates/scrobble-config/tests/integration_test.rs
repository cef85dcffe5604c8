//! Integration tests for scrobble-config.

use chrono::Weekday;
use scrobble_common::{CategoryKey, Granularity, StackOrder};
use scrobble_config::{Config, ConfigError, ConfigLoader, LayerSelection, RecordFormat};
use std::io::Write;

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r"
data:
  path: history.json
  format: json
bucketing:
  stream_granularity: day
  week_start: sunday
ranking:
  category: album
  top_k: 20
layout:
  order: descending
  layers: top_k
selection:
  debounce_ms: 50
logging:
  level: debug
"
    )
    .unwrap();

    let config = ConfigLoader::load_config(file.path()).unwrap();
    assert_eq!(config.data.format, RecordFormat::Json);
    assert_eq!(config.bucketing.stream(), Granularity::Day);
    assert_eq!(config.bucketing.overview(), Granularity::Week(Weekday::Sun));
    assert_eq!(config.ranking.category, CategoryKey::Album);
    assert_eq!(config.layout.order, StackOrder::Descending);
    assert_eq!(config.layout.layers, LayerSelection::TopK);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_load_config_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ranking:\n  top_k: 0\n").unwrap();

    let err = ConfigLoader::load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn test_load_config_rejects_bad_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "layout:\n  offset: sideways\n").unwrap();

    let err = ConfigLoader::load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = ConfigLoader::load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_config_yaml_roundtrip_preserves_settings() {
    let mut config = Config::default();
    config.ranking.top_k = 7;
    config.bucketing.week_start = Weekday::Wed;

    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed = ConfigLoader::parse_yaml(&yaml).unwrap();
    assert_eq!(parsed, config);
}
