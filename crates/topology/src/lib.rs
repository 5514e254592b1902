//! # Topology
//!
//! Road-topology extraction: samples lane boundaries from the world's lane
//! graph and writes them as a GeoJSON FeatureCollection (`map.json`) for the
//! downstream renderer. Runs once at pipeline startup.

mod extractor;
mod writer;

pub use extractor::{extract, ExtractOptions, ExtractSummary};
pub use writer::write_map_json;
