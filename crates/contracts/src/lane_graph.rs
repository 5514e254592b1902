//! Lane-graph abstraction over the simulator's road map.
//!
//! The topology extractor only needs waypoint traversal; the concrete graph
//! (simulator map or synthetic mock) stays behind these traits.

use crate::Transform;

/// A point on a lane's centerline.
pub trait Waypoint: Clone {
    /// Id of the road this waypoint lies on.
    fn road_id(&self) -> u64;

    /// Lane width at this waypoint (meters).
    fn lane_width(&self) -> f64;

    /// World-space pose; rotation yaw points along the lane direction.
    fn transform(&self) -> Transform;

    /// Successor waypoints `distance` meters further along the lane.
    ///
    /// Empty for lane ends; more than one entry at junctions.
    fn next(&self, distance: f64) -> Vec<Self>;
}

/// The world's lane graph.
pub trait LaneGraph {
    type Node: Waypoint;

    /// Minimal set of (start, end) waypoint pairs covering every road segment.
    fn topology(&self) -> Vec<(Self::Node, Self::Node)>;
}
