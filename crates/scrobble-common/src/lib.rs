//! # Scrobble Common
//!
//! Shared types, errors and logging for the scrobble-streams workspace.
//!
//! This crate provides the listening [`Event`], the read-only [`EventLog`]
//! built from raw records, calendar [`Granularity`] arithmetic and the
//! [`TimeWindow`] type every other crate aggregates over.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod event_log;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{Result, ScrobbleError};
pub use event_log::{parse_timestamp, EventLog, RawRecord};
pub use logging::{init_logging, LoggingConfig};
pub use types::*;
pub use utils::*;
