//! ScenarioBlueprint - Config Loader output
//!
//! Describes a full collection scenario: world connection, frame alignment,
//! mock world shape, topology export, output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::FrameOffsets;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Full scenario blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// World connection settings
    #[serde(default)]
    pub world: WorldSettings,

    /// Frame alignment settings
    #[serde(default)]
    pub frame: FrameSettings,

    /// Mock world shape (serverless runs and tests)
    #[serde(default)]
    pub mock: MockSettings,

    /// Topology export settings
    #[serde(default)]
    pub topology: TopologySettings,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// World connection: server address, tick timeout, ego identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Simulator server address
    #[serde(default = "default_host")]
    pub host: String,

    /// Simulator server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds to wait for each world tick before ClockTimeout
    #[serde(default = "default_tick_timeout_s")]
    pub tick_timeout_s: f64,

    /// `role_name` attribute identifying the ego vehicle
    #[serde(default = "default_ego_role")]
    pub ego_role: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    2000
}

fn default_tick_timeout_s() -> f64 {
    30.0
}

fn default_ego_role() -> String {
    "ego_vehicle".to_string()
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tick_timeout_s: default_tick_timeout_s(),
            ego_role: default_ego_role(),
        }
    }
}

/// Frame alignment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSettings {
    /// Per-kind frame offsets (image defaults to -1)
    #[serde(default)]
    pub offsets: FrameOffsets,

    /// Milliseconds the aggregator waits for a registered kind's reading
    #[serde(default = "default_dequeue_timeout_ms")]
    pub dequeue_timeout_ms: u64,
}

fn default_dequeue_timeout_ms() -> u64 {
    200
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            offsets: FrameOffsets::default(),
            dequeue_timeout_ms: default_dequeue_timeout_ms(),
        }
    }
}

/// Mock world shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockSettings {
    /// Tick frequency
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// Attach a mock IMU to the ego vehicle
    #[serde(default = "default_true")]
    pub with_imu: bool,

    /// Attach a mock camera to the ego vehicle
    #[serde(default = "default_true")]
    pub with_camera: bool,

    /// Mock camera frame width
    #[serde(default = "default_image_width")]
    pub image_width: u32,

    /// Mock camera frame height
    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

fn default_tick_hz() -> f64 {
    20.0
}

fn default_true() -> bool {
    true
}

fn default_image_width() -> u32 {
    800
}

fn default_image_height() -> u32 {
    600
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            with_imu: true,
            with_camera: true,
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

/// Topology export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySettings {
    /// Waypoint sampling spacing in meters
    #[serde(default = "default_precision")]
    pub precision: f64,

    /// Upper bound on waypoints walked per boundary
    #[serde(default = "default_max_walk_steps")]
    pub max_walk_steps: usize,

    /// Where the map document is written at startup
    #[serde(default = "default_map_path")]
    pub map_path: PathBuf,
}

fn default_precision() -> f64 {
    0.5
}

fn default_max_walk_steps() -> usize {
    10_000
}

fn default_map_path() -> PathBuf {
    PathBuf::from("output/map.json")
}

impl Default for TopologySettings {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            max_walk_steps: default_max_walk_steps(),
            map_path: default_map_path(),
        }
    }
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Unique sink name
    pub name: String,

    /// Sink implementation
    pub sink_type: SinkType,

    /// Worker queue depth before snapshots are dropped for this sink
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Implementation-specific parameters (e.g. `base_path` for File)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log one summary line per snapshot
    Log,
    /// Persist camera frames + a JSONL metric manifest
    File,
}
