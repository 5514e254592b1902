//! WorldClient trait - the simulator session seam.

use std::time::Duration;

use contracts::{FrameId, LaneGraph, SensorSource, Transform, Vec3};

use crate::WorldError;

/// One world tick as observed by the frame clock.
#[derive(Debug, Clone, Copy)]
pub struct TickSnapshot {
    /// Frame id of the tick, strictly increasing
    pub frame: FrameId,

    /// Simulation timestamp (seconds)
    pub timestamp: f64,

    /// Ego vehicle state, absent until the ego exists in the world
    pub ego: Option<EgoState>,
}

/// Ego vehicle physical state at a tick.
#[derive(Debug, Clone, Copy)]
pub struct EgoState {
    /// Acceleration vector (m/s²)
    pub acceleration: Vec3,

    /// Velocity vector (m/s)
    pub velocity: Vec3,

    /// World-space pose
    pub transform: Transform,
}

/// An actor present in the world.
#[derive(Debug, Clone)]
pub struct WorldActor {
    /// Simulator-assigned actor id
    pub id: u64,

    /// Blueprint type id (e.g. "sensor.other.imu", "vehicle.tesla.model3")
    pub type_id: String,

    /// `role_name` attribute, when set
    pub role_name: Option<String>,
}

/// Simulator session.
///
/// Implementations must be shareable across the clock thread and the async
/// orchestrator; every method takes `&self`.
pub trait WorldClient: Send + Sync {
    type Graph: LaneGraph;

    /// Establish the session. Failure here is fatal at startup.
    fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<(), WorldError>;

    /// Block until the next world tick.
    ///
    /// Called from a dedicated blocking thread. `TickTimeout` is recoverable;
    /// the caller decides whether to retry.
    fn wait_for_tick(&self, timeout: Duration) -> Result<TickSnapshot, WorldError>;

    /// Enumerate actors currently in the world.
    fn actors(&self) -> Result<Vec<WorldActor>, WorldError>;

    /// Data source for a sensor actor, `None` for non-sensor actors.
    fn sensor_source(&self, actor_id: u64) -> Option<Box<dyn SensorSource>>;

    /// The world's lane graph.
    fn lane_graph(&self) -> Result<Self::Graph, WorldError>;
}
