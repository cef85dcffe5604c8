//! JSON Lines output.

use async_trait::async_trait;
use scrobble_common::Result;
use scrobble_engine::{OverviewTable, PipelineResult, Renderer};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// One output line.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputLine<'a> {
    /// Whole-log overview, emitted once.
    Overview {
        /// Totals and cumulative counts.
        overview: &'a OverviewTable,
    },
    /// Result for one selection.
    View {
        /// Pipeline output.
        result: &'a PipelineResult,
    },
}

/// Writes each line as compact JSON followed by a newline.
#[derive(Debug)]
pub struct JsonLinesRenderer<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesRenderer<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Renderer writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Serialize and flush one line.
    pub async fn write_line(&self, line: &OutputLine<'_>) -> Result<()> {
        let mut bytes = serde_json::to_vec(line)?;
        bytes.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Emit the overview line.
    pub async fn write_overview(&self, overview: &OverviewTable) -> Result<()> {
        self.write_line(&OutputLine::Overview { overview }).await
    }
}

#[async_trait]
impl<W> Renderer for JsonLinesRenderer<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn render(&self, result: &PipelineResult) -> Result<()> {
        self.write_line(&OutputLine::View { result }).await
    }

    fn name(&self) -> &str {
        "json-lines"
    }
}
