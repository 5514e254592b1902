//! GeoJSON output types for the road-topology map.
//!
//! Minimal subset the downstream renderer consumes: a FeatureCollection of
//! LineString features with string ids and a `name` property carrying the
//! road id.

use serde::{Deserialize, Serialize};

/// Top-level GeoJSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `"FeatureCollection"`
    #[serde(rename = "type")]
    pub kind: String,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

/// A single lane-boundary polyline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Renderer-facing id, allocated by the extractor's id scheme
    pub id: String,

    /// Always `"Feature"`
    #[serde(rename = "type")]
    pub kind: String,

    pub properties: FeatureProperties,

    pub geometry: Geometry,
}

impl Feature {
    /// LineString feature named after its road.
    pub fn line_string(id: u64, road_id: u64, coordinates: Vec<[f64; 3]>) -> Self {
        Self {
            id: id.to_string(),
            kind: "Feature".to_string(),
            properties: FeatureProperties {
                name: road_id.to_string(),
            },
            geometry: Geometry {
                kind: "LineString".to_string(),
                coordinates,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureProperties {
    /// Road id as a string
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    /// Always `"LineString"`
    #[serde(rename = "type")]
    pub kind: String,

    /// [x, y, z] triples
    pub coordinates: Vec<[f64; 3]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection_json_shape() {
        let fc = FeatureCollection::new(vec![Feature::line_string(
            0,
            12,
            vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]],
        )]);

        let json = serde_json::to_value(&fc).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["type"], "Feature");
        assert_eq!(json["features"][0]["id"], "0");
        assert_eq!(json["features"][0]["properties"]["name"], "12");
        assert_eq!(json["features"][0]["geometry"]["type"], "LineString");
        assert_eq!(
            json["features"][0]["geometry"]["coordinates"][1][0]
                .as_f64()
                .unwrap(),
            0.5
        );
    }
}
