//! # Scrobble Engine
//!
//! Aggregation and coordinated-selection engine for listening histories.
//!
//! An [`EventLog`](scrobble_common::EventLog) is loaded once from a
//! [`RecordSource`]. Every change of the [`SelectionWindow`] runs the
//! [`AggregationPipeline`]: filter by window, bucket with the
//! [`TimeBucketer`], rank with [`select_top_k`] and stack with
//! [`StreamLayout`]. The [`SelectionCoordinator`] debounces changes and
//! publishes results to [`Renderer`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bucketer;
pub mod coordinator;
pub mod pipeline;
pub mod selection;
pub mod source;
pub mod stream_layout;
pub mod summary;
pub mod top_k;
pub mod traits;

pub use bucketer::*;
pub use coordinator::*;
pub use pipeline::*;
pub use selection::*;
pub use source::*;
pub use stream_layout::*;
pub use summary::*;
pub use top_k::*;
pub use traits::*;
