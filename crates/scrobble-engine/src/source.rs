//! Record sources the event log is loaded from.

use async_trait::async_trait;
use scrobble_common::{EventLog, RawRecord, Result, ScrobbleError};
use scrobble_config::RecordFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Anything that can hand over the full set of raw records at load time.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Read every record. Called once per load.
    async fn records(&self) -> Result<Vec<RawRecord>>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

/// Records already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<RawRecord>,
}

impl MemorySource {
    /// Wrap a record list.
    pub const fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn records(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}

/// A JSON or JSON Lines file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    format: RecordFormat,
}

impl JsonFileSource {
    /// Source reading `path` in the given encoding.
    pub fn new(path: impl Into<PathBuf>, format: RecordFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One record per non-blank line. Rows are counted over records, so a
    /// bad line reports the same row the event log would.
    fn parse_lines(content: &str) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let record = serde_json::from_str(line)
                .map_err(|e| ScrobbleError::malformed(records.len() + 1, e.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }

    /// A top-level array of records. Elements are decoded one by one so a
    /// bad element reports its row.
    fn parse_array(content: &str) -> Result<Vec<RawRecord>> {
        let values: Vec<serde_json::Value> = serde_json::from_str(content)?;
        values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                serde_json::from_value(value).map_err(|e| ScrobbleError::malformed(idx + 1, e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn records(&self) -> Result<Vec<RawRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let records = match self.format {
            RecordFormat::Json => Self::parse_array(&content)?,
            RecordFormat::JsonLines => Self::parse_lines(&content)?,
        };
        debug!(path = %self.path.display(), count = records.len(), "Read raw records");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read all records from `source` and build the event log.
///
/// Any malformed record aborts the whole load.
#[instrument(skip(source), fields(source = %source.describe()))]
pub async fn load_event_log(source: &dyn RecordSource) -> Result<EventLog> {
    let records = source.records().await?;
    let log = EventLog::from_records(records)?;
    info!(
        events = log.len(),
        first = %log.first_instant(),
        last = %log.last_instant(),
        "Event log loaded"
    );
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrobble_common::test_utils::create_temp_dir;
    use tokio_test::{assert_err, assert_ok};

    fn record(ts: &str, artist: &str) -> RawRecord {
        RawRecord::new(ts, "t", artist, "b")
    }

    #[tokio::test]
    async fn test_memory_source_loads() {
        let source = MemorySource::new(vec![
            record("2023-01-02T10:00:00Z", "A"),
            record("2023-01-09T10:00:00Z", "B"),
        ]);
        let log = assert_ok!(load_event_log(&source).await);
        assert_eq!(log.len(), 2);
        assert!(source.describe().contains("2 records"));
    }

    #[tokio::test]
    async fn test_empty_source_is_rejected() {
        let err = assert_err!(load_event_log(&MemorySource::default()).await);
        assert!(matches!(err, ScrobbleError::EmptyInput { .. }));
    }

    #[tokio::test]
    async fn test_json_lines_file() {
        let dir = create_temp_dir();
        let path = dir.path().join("plays.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"ts":"2023-01-02T10:00:00Z","track":"x","artist":"A","album":"y"}"#,
                "\n\n",
                r#"{"ts":"2023-01-03 08:30:00","track":"x","artist":"B","album":"y","category":"jazz"}"#,
                "\n"
            ),
        )
        .unwrap();

        let source = JsonFileSource::new(&path, RecordFormat::JsonLines);
        let log = load_event_log(&source).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[1].category.as_deref(), Some("jazz"));
    }

    #[tokio::test]
    async fn test_json_lines_reports_bad_line() {
        let dir = create_temp_dir();
        let path = dir.path().join("plays.jsonl");
        std::fs::write(
            &path,
            "{\"ts\":\"2023-01-02T10:00:00Z\",\"artist\":\"A\"}\nnot json\n",
        )
        .unwrap();

        let err = JsonFileSource::new(&path, RecordFormat::JsonLines)
            .records()
            .await
            .unwrap_err();
        match err {
            ScrobbleError::MalformedEvent { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_json_array_file() {
        let dir = create_temp_dir();
        let path = dir.path().join("plays.json");
        std::fs::write(
            &path,
            r#"[{"ts":"2023-01-02","artist":"A"},{"ts":"2023-01-05","artist":"B"}]"#,
        )
        .unwrap();

        let log = load_event_log(&JsonFileSource::new(&path, RecordFormat::Json))
            .await
            .unwrap();
        assert_eq!(log.len(), 2);
    }

    fn malformed_row(err: ScrobbleError) -> usize {
        match err {
            ScrobbleError::MalformedEvent { row, .. } => row,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_json_array_missing_timestamp_reports_row() {
        let dir = create_temp_dir();
        for (name, bad) in [
            ("absent.json", r#"{"artist":"B"}"#),
            ("null.json", r#"{"ts":null,"artist":"B"}"#),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, format!(r#"[{{"ts":"2023-01-02","artist":"A"}},{bad}]"#)).unwrap();

            let err = load_event_log(&JsonFileSource::new(&path, RecordFormat::Json))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("missing timestamp"), "{name}: {err}");
            assert_eq!(malformed_row(err), 2, "{name}");
        }
    }

    #[tokio::test]
    async fn test_json_array_bad_element_reports_row() {
        let dir = create_temp_dir();
        let path = dir.path().join("plays.json");
        std::fs::write(&path, r#"[{"ts":"2023-01-02"},{"ts":"2023-01-03"},{"ts":42}]"#).unwrap();

        let err = JsonFileSource::new(&path, RecordFormat::Json).records().await.unwrap_err();
        assert_eq!(malformed_row(err), 3);
    }

    #[tokio::test]
    async fn test_json_array_requires_array() {
        let dir = create_temp_dir();
        let path = dir.path().join("plays.json");
        std::fs::write(&path, r#"{"ts":"2023-01-02"}"#).unwrap();

        let err = JsonFileSource::new(&path, RecordFormat::Json).records().await.unwrap_err();
        assert!(matches!(err, ScrobbleError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_json_lines_rows_skip_blank_lines() {
        let dir = create_temp_dir();
        let good = r#"{"ts":"2023-01-02T10:00:00Z","artist":"A"}"#;

        // Unparseable line: third physical line, second record.
        let path = dir.path().join("bad_json.jsonl");
        std::fs::write(&path, format!("{good}\n\nnot json\n")).unwrap();
        let err = load_event_log(&JsonFileSource::new(&path, RecordFormat::JsonLines))
            .await
            .unwrap_err();
        assert_eq!(malformed_row(err), 2);

        // Bad timestamp in the same position reports the same row.
        let path = dir.path().join("bad_ts.jsonl");
        std::fs::write(&path, format!("{good}\n\n{{\"ts\":\"yesterday\"}}\n")).unwrap();
        let err = load_event_log(&JsonFileSource::new(&path, RecordFormat::JsonLines))
            .await
            .unwrap_err();
        assert_eq!(malformed_row(err), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = JsonFileSource::new("/definitely/not/here.jsonl", RecordFormat::JsonLines);
        assert!(matches!(source.records().await, Err(ScrobbleError::Io(_))));
    }
}
