//! Debounced hand-off from selection changes to the pipeline and from the
//! pipeline to renderers.

use crate::pipeline::{AggregationPipeline, PipelineResult};
use crate::selection::SelectionChanged;
use crate::traits::Renderer;
use arc_swap::ArcSwapOption;
use scrobble_common::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the result channel.
pub const RESULT_CHANNEL_CAPACITY: usize = 16;

/// Lock-free view of the most recently published result.
pub type LatestResult = Arc<ArcSwapOption<PipelineResult>>;

/// Runs the pipeline for each (coalesced) selection change and publishes
/// the result.
#[derive(Debug)]
pub struct SelectionCoordinator {
    pipeline: AggregationPipeline,
    debounce: Duration,
    latest: LatestResult,
    results: broadcast::Sender<Arc<PipelineResult>>,
}

impl SelectionCoordinator {
    /// Coordinator coalescing changes that arrive within `debounce`.
    pub fn new(pipeline: AggregationPipeline, debounce: Duration) -> Self {
        let (results, _) = broadcast::channel(RESULT_CHANNEL_CAPACITY);
        Self {
            pipeline,
            debounce,
            latest: Arc::new(ArcSwapOption::empty()),
            results,
        }
    }

    /// The wrapped pipeline.
    pub const fn pipeline(&self) -> &AggregationPipeline {
        &self.pipeline
    }

    /// Subscribe to published results.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PipelineResult>> {
        self.results.subscribe()
    }

    /// Shared view of the latest result.
    pub fn latest(&self) -> LatestResult {
        Arc::clone(&self.latest)
    }

    /// Run the pipeline for one change and publish the result immediately.
    pub fn process(&self, change: &SelectionChanged) -> Result<Arc<PipelineResult>> {
        let result = Arc::new(self.pipeline.on_selection_changed(&change.window)?);
        self.latest.store(Some(Arc::clone(&result)));
        let receivers = self.results.send(Arc::clone(&result)).unwrap_or(0);
        debug!(seq = change.seq, receivers, "Published result");
        Ok(result)
    }

    /// Consume changes until the selection channel closes.
    ///
    /// Changes arriving within the debounce period of each other collapse
    /// into the last one. A lagged receiver skips to the newest change. A
    /// pipeline error stops the loop.
    pub async fn run(self, mut changes: broadcast::Receiver<SelectionChanged>) -> Result<()> {
        info!(debounce = ?self.debounce, "Selection coordinator started");

        loop {
            let mut change = match changes.recv().await {
                Ok(change) => change,
                Err(RecvError::Lagged(skipped)) => match drain_to_newest(&mut changes).0 {
                    Some(newest) => {
                        warn!(skipped, seq = newest.seq, "Selection receiver lagged, skipping to newest");
                        newest
                    }
                    None => continue,
                },
                Err(RecvError::Closed) => break,
            };

            let mut closed = false;
            if !self.debounce.is_zero() {
                loop {
                    match tokio::time::timeout(self.debounce, changes.recv()).await {
                        Ok(Ok(next)) => {
                            debug!(dropped = change.seq, "Coalesced selection change");
                            change = next;
                        }
                        Ok(Err(RecvError::Lagged(skipped))) => {
                            debug!(skipped, "Selection burst overflowed, continuing with newest");
                            if let Some(newest) = drain_to_newest(&mut changes).0 {
                                change = newest;
                            }
                        }
                        Ok(Err(RecvError::Closed)) => {
                            closed = true;
                            break;
                        }
                        Err(_) => break,
                    }
                }
            }

            self.process(&change)?;
            if closed {
                break;
            }
        }

        info!("Selection coordinator stopped");
        Ok(())
    }

    /// Run the coordinator on the current runtime.
    pub fn spawn(self, changes: broadcast::Receiver<SelectionChanged>) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(changes))
    }
}

/// Feed published results to a renderer until the channel closes.
///
/// A lagged renderer skips to the newest result. Returns the number of
/// results rendered.
pub async fn drive_renderer<R>(renderer: R, mut results: broadcast::Receiver<Arc<PipelineResult>>) -> Result<usize>
where
    R: Renderer,
{
    let mut rendered = 0;
    loop {
        match results.recv().await {
            Ok(result) => {
                renderer.render(&result).await?;
                rendered += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(renderer = renderer.name(), skipped, "Renderer lagged behind");
                if let Some(newest) = drain_to_newest(&mut results).0 {
                    renderer.render(&newest).await?;
                    rendered += 1;
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!(renderer = renderer.name(), rendered, "Renderer finished");
    Ok(rendered)
}

/// Take every message still buffered in `rx` and keep the newest.
///
/// The flag is `true` once the sending side has closed.
fn drain_to_newest<T: Clone>(rx: &mut broadcast::Receiver<T>) -> (Option<T>, bool) {
    let mut newest = None;
    loop {
        match rx.try_recv() {
            Ok(value) => newest = Some(value),
            Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty) => return (newest, false),
            Err(TryRecvError::Closed) => return (newest, true),
        }
    }
}
