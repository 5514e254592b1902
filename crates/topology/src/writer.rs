//! map.json output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use contracts::{ContractError, FeatureCollection};
use tracing::info;

/// Write the FeatureCollection to `path`, creating parent directories.
pub fn write_map_json(path: impl AsRef<Path>, collection: &FeatureCollection) -> Result<(), ContractError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, collection)
        .map_err(|err| ContractError::Other(format!("failed to encode map json: {err}")))?;
    writer.flush()?;

    info!(
        path = %path.display(),
        features = collection.features.len(),
        "map written"
    );
    Ok(())
}
