//! FileSink - persists snapshots to disk
//!
//! Layout under `base_path`:
//! - `images/{frame}.png`: decoded camera frame, when present
//! - `frames.jsonl`: one manifest record per snapshot

use contracts::{ContractError, ImageFrame, PixelFormat, ReadingPayload, SensorKind, Snapshot, SnapshotSink};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// One line of `frames.jsonl`.
#[derive(Serialize)]
struct ManifestRecord<'a> {
    frame: u64,
    timestamp: f64,
    elapsed: f64,
    acceleration: Option<f64>,
    velocity: Option<f64>,
    missing_kinds: &'a [SensorKind],
    mismatch_drops: u32,
    recorded_at: String,
}

/// Sink that writes snapshots to disk files
pub struct FileSink {
    name: String,
    images_dir: PathBuf,
    manifest: BufWriter<File>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let images_dir = config.base_path.join("images");
        fs::create_dir_all(&images_dir)?;

        let manifest_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.base_path.join("frames.jsonl"))?;

        Ok(Self {
            name: name.into(),
            images_dir,
            manifest: BufWriter::new(manifest_file),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    fn write_snapshot_to_disk(&mut self, snapshot: &Snapshot) -> std::io::Result<()> {
        if let Some(reading) = &snapshot.image {
            if let ReadingPayload::Image(image) = &reading.payload {
                let path = self.images_dir.join(format!("{}.png", snapshot.frame));
                save_image(path, image)?;
            }
        }

        let record = ManifestRecord {
            frame: snapshot.frame,
            timestamp: snapshot.timestamp,
            elapsed: snapshot.elapsed,
            acceleration: snapshot.kinematics.as_ref().map(|k| k.acceleration),
            velocity: snapshot.kinematics.as_ref().map(|k| k.velocity),
            missing_kinds: &snapshot.meta.missing_kinds,
            mismatch_drops: snapshot.meta.mismatch_drops,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        };
        serde_json::to_writer(&mut self.manifest, &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.manifest.write_all(b"\n")?;

        Ok(())
    }

    fn persist_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        self.write_snapshot_to_disk(snapshot).map_err(|e| {
            error!(sink = %self.name, frame = snapshot.frame, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

fn save_image(path: PathBuf, image: &ImageFrame) -> std::io::Result<()> {
    match image.format {
        PixelFormat::Rgb8 => image::save_buffer(
            path,
            &image.data,
            image.width,
            image.height,
            image::ColorType::Rgb8,
        )
        .map_err(std::io::Error::other),

        PixelFormat::Rgba8 => image::save_buffer(
            path,
            &image.data,
            image.width,
            image.height,
            image::ColorType::Rgba8,
        )
        .map_err(std::io::Error::other),

        PixelFormat::Bgra8 => {
            // Convert BGRA to RGBA
            let mut rgba_data = image.data.to_vec();
            for chunk in rgba_data.chunks_exact_mut(4) {
                chunk.swap(0, 2); // Swap B and R
            }
            image::save_buffer(
                path,
                &rgba_data,
                image.width,
                image.height,
                image::ColorType::Rgba8,
            )
            .map_err(std::io::Error::other)
        }
    }
}

impl SnapshotSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, snapshot),
        fields(sink = %self.name, frame = snapshot.frame)
    )]
    async fn write(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        self.persist_snapshot(snapshot)?;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.manifest
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.manifest
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
