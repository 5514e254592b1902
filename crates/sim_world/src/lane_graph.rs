//! Synthetic lane graph
//!
//! Straight road segments with real geometry, so waypoint walks produce the
//! same sample counts and spacing a simulator map would.

use std::sync::Arc;

use contracts::{LaneGraph, Location, Rotation, Transform, Waypoint};

#[derive(Debug)]
struct RoadData {
    road_id: u64,
    /// Centerline start
    origin: Location,
    /// Heading in degrees
    yaw: f64,
    lane_width: f64,
    /// Centerline length in meters
    length: f64,
    /// Index of the road this one flows into
    next_road: Option<usize>,
}

#[derive(Debug)]
struct GraphData {
    roads: Vec<RoadData>,
}

/// Synthetic lane graph of connected straight roads.
#[derive(Debug, Clone)]
pub struct MockLaneGraph {
    data: Arc<GraphData>,
}

impl MockLaneGraph {
    pub fn builder() -> MockLaneGraphBuilder {
        MockLaneGraphBuilder { roads: Vec::new() }
    }

    /// Two 10m roads flowing into each other, the default mock world map.
    pub fn two_road_default() -> Self {
        Self::builder()
            .road(1, Location::default(), 0.0, 4.0, 10.0)
            .road(
                2,
                Location {
                    x: 10.0,
                    y: 0.0,
                    z: 0.0,
                },
                0.0,
                4.0,
                10.0,
            )
            .link(0, 1)
            .build()
    }

    fn waypoint(&self, road: usize, s: f64) -> MockWaypoint {
        MockWaypoint {
            road,
            s,
            data: Arc::clone(&self.data),
        }
    }
}

/// Builder for `MockLaneGraph`.
pub struct MockLaneGraphBuilder {
    roads: Vec<RoadData>,
}

impl MockLaneGraphBuilder {
    /// Append a straight road segment.
    pub fn road(
        mut self,
        road_id: u64,
        origin: Location,
        yaw: f64,
        lane_width: f64,
        length: f64,
    ) -> Self {
        self.roads.push(RoadData {
            road_id,
            origin,
            yaw,
            lane_width,
            length,
            next_road: None,
        });
        self
    }

    /// Make road `from` flow into road `to` (indices in insertion order).
    pub fn link(mut self, from: usize, to: usize) -> Self {
        self.roads[from].next_road = Some(to);
        self
    }

    pub fn build(self) -> MockLaneGraph {
        MockLaneGraph {
            data: Arc::new(GraphData { roads: self.roads }),
        }
    }
}

/// A position along a mock road's centerline.
#[derive(Clone)]
pub struct MockWaypoint {
    road: usize,
    /// Distance from the road origin (meters)
    s: f64,
    data: Arc<GraphData>,
}

impl MockWaypoint {
    fn road_data(&self) -> &RoadData {
        &self.data.roads[self.road]
    }
}

impl Waypoint for MockWaypoint {
    fn road_id(&self) -> u64 {
        self.road_data().road_id
    }

    fn lane_width(&self) -> f64 {
        self.road_data().lane_width
    }

    fn transform(&self) -> Transform {
        let road = self.road_data();
        let rotation = Rotation {
            pitch: 0.0,
            yaw: road.yaw,
            roll: 0.0,
        };
        let forward = rotation.forward_vector();
        Transform {
            location: Location {
                x: road.origin.x + forward.x * self.s,
                y: road.origin.y + forward.y * self.s,
                z: road.origin.z + forward.z * self.s,
            },
            rotation,
        }
    }

    fn next(&self, distance: f64) -> Vec<Self> {
        let road = self.road_data();
        let s2 = self.s + distance;
        // Tolerance keeps accumulated float error from eating the last sample.
        if s2 <= road.length + 1e-9 {
            return vec![MockWaypoint {
                road: self.road,
                s: s2,
                data: Arc::clone(&self.data),
            }];
        }
        match road.next_road {
            Some(next) => vec![MockWaypoint {
                road: next,
                s: 0.0,
                data: Arc::clone(&self.data),
            }],
            None => Vec::new(),
        }
    }
}

impl LaneGraph for MockLaneGraph {
    type Node = MockWaypoint;

    fn topology(&self) -> Vec<(Self::Node, Self::Node)> {
        self.data
            .roads
            .iter()
            .enumerate()
            .map(|(idx, road)| (self.waypoint(idx, 0.0), self.waypoint(idx, road.length)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_stays_on_road_until_link() {
        let graph = MockLaneGraph::two_road_default();
        let (start, _) = graph.topology().into_iter().next().unwrap();
        assert_eq!(start.road_id(), 1);

        // 10m road at 0.5m spacing: 20 steps stay on road 1
        let mut wp = start;
        for _ in 0..20 {
            wp = wp.next(0.5).into_iter().next().unwrap();
            assert_eq!(wp.road_id(), 1);
        }
        // The 21st step crosses onto road 2
        let crossed = wp.next(0.5).into_iter().next().unwrap();
        assert_eq!(crossed.road_id(), 2);
    }

    #[test]
    fn test_dead_end_has_no_successor() {
        let graph = MockLaneGraph::builder()
            .road(7, Location::default(), 90.0, 3.5, 1.0)
            .build();
        let (_, end) = graph.topology().into_iter().next().unwrap();
        assert!(end.next(0.5).is_empty());
    }

    #[test]
    fn test_transform_follows_heading() {
        let graph = MockLaneGraph::builder()
            .road(1, Location::default(), 90.0, 4.0, 10.0)
            .build();
        let (start, _) = graph.topology().into_iter().next().unwrap();
        let wp = start.next(2.0).into_iter().next().unwrap();
        let t = wp.transform();
        // yaw 90 heads along +y
        assert!(t.location.x.abs() < 1e-9);
        assert!((t.location.y - 2.0).abs() < 1e-9);
    }
}
