//! Main entry point for scrobble-cli.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use scrobble_cli::{App, Args};
use scrobble_common::init_logging;
use tokio::io::BufReader;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.load_config().context("failed to load configuration")?;

    init_logging(&config.logging.to_logging_config()).map_err(|e| anyhow!(e))?;
    info!(data = %config.data.path, "Starting scrobble-cli");

    let app = App::new(config);
    let stdin = BufReader::new(tokio::io::stdin());

    match app.run(stdin, tokio::io::stdout()).await {
        Ok(rendered) => {
            info!(rendered, "Finished");
            Ok(())
        }
        Err(e) => {
            error!("scrobble-cli failed: {}", e);
            Err(e.into())
        }
    }
}
