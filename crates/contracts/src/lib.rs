//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `FrameId` (u64) is the primary clock: one id per simulation tick,
//!   monotonically increasing, never reused
//! - Simulation timestamp (seconds, f64) rides along for elapsed-time reporting

mod blueprint;
mod error;
mod frame;
mod geojson;
mod geometry;
mod lane_graph;
mod reading;
mod sensor_id;
mod sensor_source;
mod sink;
mod snapshot;

pub use blueprint::*;
pub use error::*;
pub use frame::*;
pub use geojson::*;
pub use geometry::*;
pub use lane_graph::{LaneGraph, Waypoint};
pub use reading::*;
pub use sensor_id::SensorId;
pub use sensor_source::{SensorDataCallback, SensorSource};
pub use sink::*;
pub use snapshot::*;
