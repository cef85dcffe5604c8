//! Application wiring: load, publish the first view, then follow commands.

use crate::command::{parse_command, Command};
use crate::error::CliResult;
use crate::render::JsonLinesRenderer;
use scrobble_config::Config;
use scrobble_engine::{
    drive_renderer, load_event_log, AggregationPipeline, JsonFileSource, PipelineSettings, SelectionCoordinator,
    SelectionHandle, SelectionWindow,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tracing::{info, warn};

/// The command-line application.
#[derive(Debug, Clone)]
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// Application for a validated configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the log, write the overview and the default view, then apply
    /// each command from `input` until it ends.
    ///
    /// Returns the number of views written.
    pub async fn run<R, W>(&self, input: R, output: W) -> CliResult<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let source = JsonFileSource::new(&self.config.data.path, self.config.data.format);
        let log = Arc::new(load_event_log(&source).await?);

        let pipeline = AggregationPipeline::new(Arc::clone(&log), PipelineSettings::from(self.config.as_ref()))?;
        let renderer = JsonLinesRenderer::new(output);
        renderer.write_overview(pipeline.overview()).await?;

        let debounce = Duration::from_millis(self.config.selection.debounce_ms);
        let coordinator = SelectionCoordinator::new(pipeline, debounce);
        let rendering = tokio::spawn(drive_renderer(renderer, coordinator.subscribe()));

        let selection = SelectionHandle::new(SelectionWindow::new(&log));
        if let Some(initial) = selection.activate() {
            coordinator.process(&initial)?;
        }
        let coordinating = coordinator.spawn(selection.subscribe());

        let mut lines = input.lines();
        let mut line_no = 0usize;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            match parse_command(&line) {
                Ok(Some(Command::Select { start, end })) => {
                    selection.select(start, end);
                }
                Ok(Some(Command::Reset)) => {
                    selection.clear();
                }
                Ok(None) => {}
                Err(message) => warn!(line = line_no, %message, "Ignoring input line"),
            }
        }

        // Closing the selection channel stops the coordinator, which in
        // turn closes the result channel.
        drop(selection);
        let (coordinated, rendered) = futures::try_join!(coordinating, rendering)?;
        coordinated?;
        let rendered = rendered?;

        info!(rendered, commands = line_no, "Input exhausted");
        Ok(rendered)
    }
}
