//! Pipeline orchestration: wires the mock world, frame clock, sensor
//! registry, aggregator, and dispatcher together for a single run.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
