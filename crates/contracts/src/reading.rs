//! SensorReading - what sensor callbacks enqueue
//!
//! One reading per sensor per tick, tagged with the frame it was captured in.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{FrameId, SensorId};

/// Closed set of sensor kinds the pipeline aggregates.
///
/// Classification from simulator blueprint ids happens once at discovery;
/// everything downstream switches on this enum, never on strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// IMU: accelerometer + gyroscope + compass
    Inertial,
    /// Camera frames
    Image,
    /// Ego acceleration/velocity derived from the tick snapshot
    Kinematic,
}

impl SensorKind {
    /// All kinds, in aggregation order.
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Inertial,
        SensorKind::Image,
        SensorKind::Kinematic,
    ];

    /// Stable lowercase name (metrics labels, log fields).
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Inertial => "inertial",
            SensorKind::Image => "image",
            SensorKind::Kinematic => "kinematic",
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sensor reading for one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Frame id of the tick this reading was captured in
    pub frame: FrameId,

    /// Which sensor produced it
    pub sensor_id: SensorId,

    /// Sensor kind (redundant with payload, kept for cheap routing)
    pub kind: SensorKind,

    /// Simulation timestamp (seconds)
    pub timestamp: f64,

    /// Decoded payload
    pub payload: ReadingPayload,
}

/// Decoded sensor payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReadingPayload {
    /// IMU sample
    Inertial(ImuSample),

    /// Camera frame
    Image(ImageFrame),

    /// Ego kinematic state
    Kinematic(Kinematics),

    /// Raw bytes (fallback, e.g. undecodable payloads kept for diagnostics)
    Raw(Bytes),
}

impl ReadingPayload {
    /// Kind this payload belongs to, if it maps onto one.
    pub fn kind(&self) -> Option<SensorKind> {
        match self {
            ReadingPayload::Inertial(_) => Some(SensorKind::Inertial),
            ReadingPayload::Image(_) => Some(SensorKind::Image),
            ReadingPayload::Kinematic(_) => Some(SensorKind::Kinematic),
            ReadingPayload::Raw(_) => None,
        }
    }
}

/// IMU sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImuSample {
    /// Accelerometer (m/s²)
    pub accelerometer: Vec3,

    /// Gyroscope (rad/s)
    pub gyroscope: Vec3,

    /// Compass (rad)
    pub compass: f64,
}

/// Camera frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFrame {
    /// Image width
    pub width: u32,

    /// Image height
    pub height: u32,

    /// Pixel format
    pub format: PixelFormat,

    /// Raw pixel data (zero-copy)
    pub data: Bytes,
}

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
    /// Simulator's native camera layout
    Bgra8,
}

/// Ego kinematic state, scalar magnitudes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// |acceleration| (m/s²)
    pub acceleration: f64,

    /// |velocity| (m/s)
    pub velocity: f64,
}

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Euclidean magnitude.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}
