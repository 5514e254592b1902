//! Frame identifiers and per-kind frame offsets.

use serde::{Deserialize, Serialize};

use crate::SensorKind;

/// Simulation frame identifier.
///
/// One id per world tick, monotonically increasing, never reused.
pub type FrameId = u64;

/// Default frame offset for imaging sensors.
///
/// Camera data for tick N becomes consumable one tick later, so the
/// aggregator pairs snapshot N with the image tagged N - 1.
pub const DEFAULT_IMAGE_FRAME_OFFSET: i64 = -1;

/// Tick notification pushed onto the control channel by the frame clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickInfo {
    /// Frame id of this tick
    pub frame: FrameId,

    /// Simulation timestamp (seconds)
    pub timestamp: f64,

    /// Seconds since the first observed tick
    pub elapsed: f64,
}

/// Per-kind frame offsets applied when pairing readings with a snapshot.
///
/// A snapshot for frame N consumes the reading tagged `N + offset(kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameOffsets {
    #[serde(default)]
    pub inertial: i64,

    #[serde(default = "default_image_offset")]
    pub image: i64,

    #[serde(default)]
    pub kinematic: i64,
}

fn default_image_offset() -> i64 {
    DEFAULT_IMAGE_FRAME_OFFSET
}

impl Default for FrameOffsets {
    fn default() -> Self {
        Self {
            inertial: 0,
            image: DEFAULT_IMAGE_FRAME_OFFSET,
            kinematic: 0,
        }
    }
}

impl FrameOffsets {
    /// Offset for the given sensor kind.
    pub fn offset(&self, kind: SensorKind) -> i64 {
        match kind {
            SensorKind::Inertial => self.inertial,
            SensorKind::Image => self.image,
            SensorKind::Kinematic => self.kinematic,
        }
    }

    /// Frame a snapshot for `frame` expects from `kind`.
    ///
    /// Returns `None` when the offset points before the first frame
    /// (e.g. frame 0 with an image offset of -1).
    pub fn expected_frame(&self, frame: FrameId, kind: SensorKind) -> Option<FrameId> {
        frame.checked_add_signed(self.offset(kind))
    }
}
