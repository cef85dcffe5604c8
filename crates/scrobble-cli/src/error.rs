//! Application-wide error types using thiserror.

use scrobble_common::ScrobbleError;
use scrobble_config::ConfigError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Loading or aggregation failed.
    #[error("Engine error: {0}")]
    Engine(#[from] ScrobbleError),

    /// A background task panicked or was cancelled.
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error on the command input or result output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the CLI application.
pub type CliResult<T> = Result<T, CliError>;
