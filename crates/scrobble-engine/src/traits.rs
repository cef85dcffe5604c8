//! Renderer seam.

use crate::pipeline::PipelineResult;
use async_trait::async_trait;
use scrobble_common::Result;

/// Consumer of published pipeline results.
///
/// Renderers only receive results; they hold no handle back into the
/// pipeline or the selection.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Draw or emit one result.
    async fn render(&self, result: &PipelineResult) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
