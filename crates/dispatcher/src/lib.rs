//! # Dispatcher
//!
//! Snapshot fan-out.
//!
//! Responsibilities:
//! - Consume `Snapshot`s from the aggregator
//! - Fan out to every configured sink
//! - Isolate slow sinks behind per-sink queues so they cannot stall the
//!   main path

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{Snapshot, SnapshotSink};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, LogSink};
