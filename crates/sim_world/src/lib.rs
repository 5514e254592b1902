//! # Sim World
//!
//! Simulator boundary: world session, ticks, actor enumeration, lane graph.
//!
//! Responsibilities:
//! - `WorldClient` trait, the only seam the pipeline sees
//! - `MockWorld`: deterministic scripted world for tests and serverless runs
//! - `MockLaneGraph`: synthetic road geometry behind the `LaneGraph` trait
//!
//! Spawning vehicles and sensors is the operator's business, not ours; the
//! pipeline only observes actors that already exist in the world.

mod client;
mod error;
mod lane_graph;
mod mock_sensor;
mod mock_world;

pub use client::{EgoState, TickSnapshot, WorldActor, WorldClient};
pub use error::WorldError;
pub use lane_graph::{MockLaneGraph, MockLaneGraphBuilder, MockWaypoint};
pub use mock_sensor::{MockSensor, MockSensorConfig};
pub use mock_world::{MockWorld, MockWorldConfig};
