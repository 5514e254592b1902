//! Lane-boundary extraction from the lane graph.
//!
//! Each topology edge contributes two boundary polylines, one walked from
//! the edge's start waypoint and one from its end. A walk samples the lane
//! every `precision` meters and stops when it leaves the road or the lane
//! ends. Output is deterministic for a fixed graph.

use contracts::{ContractError, Feature, FeatureCollection, LaneGraph, TopologySettings, Waypoint};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Waypoint sampling spacing in meters
    pub precision: f64,

    /// Walk step bound; a walk that exceeds it (looped road) is skipped
    pub max_walk_steps: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            precision: 0.5,
            max_walk_steps: 10_000,
        }
    }
}

impl From<&TopologySettings> for ExtractOptions {
    fn from(settings: &TopologySettings) -> Self {
        Self {
            precision: settings.precision,
            max_walk_steps: settings.max_walk_steps,
        }
    }
}

/// Extraction result.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub collection: FeatureCollection,

    /// Boundaries skipped because their walk never terminated
    pub skipped_features: usize,
}

/// Walk every topology edge and build the boundary FeatureCollection.
///
/// Feature ids follow the renderer's scheme: the edge's start-side boundary
/// gets the pair's base id, the end side gets base + 2, and each edge
/// advances the base by 4.
pub fn extract<G: LaneGraph>(graph: &G, options: &ExtractOptions) -> ExtractSummary {
    let mut features = Vec::new();
    let mut skipped = 0;
    let mut base: u64 = 0;

    for (start, end) in graph.topology() {
        for (id_offset, waypoint) in [(0, start), (2, end)] {
            let road_id = waypoint.road_id();
            match walk_boundary(waypoint, options) {
                Ok(points) => {
                    features.push(Feature::line_string(base + id_offset, road_id, points));
                }
                Err(err) => {
                    warn!(error = %err, "skipping boundary");
                    skipped += 1;
                }
            }
        }
        base += 4;
    }

    debug!(
        features = features.len(),
        skipped, "topology extraction finished"
    );
    ExtractSummary {
        collection: FeatureCollection::new(features),
        skipped_features: skipped,
    }
}

/// Sample one lane boundary from `start` until the road changes or ends.
///
/// An isolated waypoint with no successor yields a single-point line.
fn walk_boundary<W: Waypoint>(start: W, options: &ExtractOptions) -> Result<Vec<[f64; 3]>, ContractError> {
    let road_id = start.road_id();
    let mut points = vec![boundary_point(&start)];
    let mut current = start;
    let mut steps = 0usize;

    loop {
        let Some(next) = current.next(options.precision).into_iter().next() else {
            break;
        };
        if next.road_id() != road_id {
            break;
        }

        points.push(boundary_point(&next));
        current = next;

        steps += 1;
        if steps >= options.max_walk_steps {
            return Err(ContractError::WalkUnterminated { road_id, steps });
        }
    }

    Ok(points)
}

/// Project a centerline waypoint onto its right lane boundary.
///
/// The boundary sits half a lane width along the lane's lateral axis
/// (heading + 90 degrees); y is negated on output to flip the simulator's
/// left-handed frame into the renderer's.
fn boundary_point<W: Waypoint>(waypoint: &W) -> [f64; 3] {
    let transform = waypoint.transform();
    let mut lateral_rotation = transform.rotation;
    lateral_rotation.yaw += 90.0;
    let lateral = lateral_rotation.forward_vector();

    let shift = -waypoint.lane_width() / 2.0;
    let x = transform.location.x + lateral.x * shift;
    let y = transform.location.y + lateral.y * shift;
    let z = transform.location.z + lateral.z * shift;

    [x, -y, z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Location;
    use sim_world::MockLaneGraph;

    #[test]
    fn test_two_road_map_feature_ids_and_sampling() {
        let graph = MockLaneGraph::two_road_default();
        let summary = extract(&graph, &ExtractOptions::default());

        assert_eq!(summary.skipped_features, 0);
        let features = &summary.collection.features;
        assert_eq!(features.len(), 4);

        // Ids: first edge 0/2, second edge 4/6
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "2", "4", "6"]);
        assert_eq!(features[0].properties.name, "1");
        assert_eq!(features[2].properties.name, "2");

        // 10m road at 0.5m spacing: 21 samples from the start side
        let points = &features[0].geometry.coordinates;
        assert_eq!(points.len(), 21);

        // Consecutive samples sit one precision step apart (a shorter final
        // segment is allowed when the road length is not a multiple)
        let precision = ExtractOptions::default().precision;
        for (i, pair) in points.windows(2).enumerate() {
            let [dx, dy, dz] = [
                pair[1][0] - pair[0][0],
                pair[1][1] - pair[0][1],
                pair[1][2] - pair[0][2],
            ];
            let dist = (dx * dx + dy * dy + dz * dz).sqrt();
            assert!(
                dist <= precision + 1e-9,
                "segment {i} spans {dist}, wider than the sampling precision"
            );
            if i < points.len() - 2 {
                assert!(
                    (dist - precision).abs() < 1e-9,
                    "interior segment {i} spans {dist}, expected {precision}"
                );
            }
        }

        // End side crosses into the next road immediately: one sample
        assert_eq!(features[1].geometry.coordinates.len(), 1);
    }

    #[test]
    fn test_boundary_shift_and_y_negation() {
        // Road heading east, 4m lane: right boundary at world y = -2,
        // emitted with y negated
        let graph = MockLaneGraph::builder()
            .road(9, Location::default(), 0.0, 4.0, 1.0)
            .build();
        let summary = extract(&graph, &ExtractOptions::default());

        let first = summary.collection.features[0].geometry.coordinates[0];
        assert!((first[0] - 0.0).abs() < 1e-9);
        assert!((first[1] - 2.0).abs() < 1e-9);
        assert!((first[2] - 0.0).abs() < 1e-9);

        let last = *summary.collection.features[0]
            .geometry
            .coordinates
            .last()
            .unwrap();
        assert!((last[0] - 1.0).abs() < 1e-9);
        assert!((last[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_road_yields_single_point() {
        let graph = MockLaneGraph::builder()
            .road(3, Location::default(), 0.0, 4.0, 0.0)
            .build();
        let summary = extract(&graph, &ExtractOptions::default());

        for feature in &summary.collection.features {
            assert_eq!(feature.geometry.coordinates.len(), 1);
        }
    }

    #[test]
    fn test_looped_road_is_skipped() {
        // Road flowing into itself never leaves its road id
        let graph = MockLaneGraph::builder()
            .road(5, Location::default(), 0.0, 4.0, 2.0)
            .road(
                6,
                Location {
                    x: 50.0,
                    y: 0.0,
                    z: 0.0,
                },
                0.0,
                4.0,
                2.0,
            )
            .link(0, 0)
            .build();

        let summary = extract(
            &graph,
            &ExtractOptions {
                precision: 0.5,
                max_walk_steps: 100,
            },
        );

        // Both boundaries of the looped road skipped, the healthy road kept
        assert_eq!(summary.skipped_features, 2);
        assert_eq!(summary.collection.features.len(), 2);
        assert!(summary
            .collection
            .features
            .iter()
            .all(|f| f.properties.name == "6"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let graph = MockLaneGraph::two_road_default();
        let a = extract(&graph, &ExtractOptions::default());
        let b = extract(&graph, &ExtractOptions::default());

        let ja = serde_json::to_string(&a.collection).unwrap();
        let jb = serde_json::to_string(&b.collection).unwrap();
        assert_eq!(ja, jb);
    }
}
