//! # Scrobble CLI
//!
//! Loads a listening history, prints the overview and the default view as
//! JSON lines, then applies selection changes read from a line-oriented
//! input.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod args;
pub mod command;
pub mod error;
pub mod render;

pub use app::*;
pub use args::*;
pub use command::*;
pub use error::*;
pub use render::*;
