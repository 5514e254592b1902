//! # Frame Sync
//!
//! Frame-synchronized sensor aggregation.
//!
//! Three cooperating pieces:
//! - `FrameClock`: paces the pipeline against world ticks from a dedicated
//!   blocking thread, publishing one `TickInfo` per frame
//! - `SensorRegistry`: classifies world actors into sensor kinds and routes
//!   their readings into per-kind queues
//! - `Aggregator`: the single queue consumer, assembling one `Snapshot` per
//!   tick under the configured per-kind frame offsets

mod aggregator;
mod clock;
mod queues;
mod registry;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use clock::FrameClock;
pub use queues::SensorQueues;
pub use registry::{classify, DiscoverySummary, SensorRegistry};
