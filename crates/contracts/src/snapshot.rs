//! Snapshot - Aggregator output
//!
//! One time-aligned bundle of sensor data per simulation frame.

use serde::{Deserialize, Serialize};

use crate::{FrameId, Kinematics, ReadingPayload, SensorKind, SensorReading, TickInfo};

/// Frame-aligned multi-sensor snapshot.
///
/// Every populated reading satisfies frame coherence: its frame id equals
/// the snapshot frame plus the declared per-kind offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Frame id this snapshot was assembled for
    pub frame: FrameId,

    /// Simulation timestamp of the tick (seconds)
    pub timestamp: f64,

    /// Seconds since the first tick of the run
    pub elapsed: f64,

    /// IMU reading, if one arrived for this frame
    pub inertial: Option<SensorReading>,

    /// Camera reading, if one arrived for this frame (offset applied)
    pub image: Option<SensorReading>,

    /// Ego kinematic state from the tick
    pub kinematics: Option<Kinematics>,

    /// Assembly diagnostics
    pub meta: SnapshotMeta,
}

impl Snapshot {
    /// Empty snapshot for a tick, to be filled by the aggregator.
    pub fn empty(tick: TickInfo) -> Self {
        Self {
            frame: tick.frame,
            timestamp: tick.timestamp,
            elapsed: tick.elapsed,
            inertial: None,
            image: None,
            kinematics: None,
            meta: SnapshotMeta::default(),
        }
    }

    /// Place a reading into its kind's slot.
    ///
    /// Kinematic readings are unwrapped to their scalar state.
    pub fn set_reading(&mut self, reading: SensorReading) {
        match reading.kind {
            SensorKind::Inertial => self.inertial = Some(reading),
            SensorKind::Image => self.image = Some(reading),
            SensorKind::Kinematic => {
                if let ReadingPayload::Kinematic(k) = reading.payload {
                    self.kinematics = Some(k);
                }
            }
        }
    }

    /// Whether the kind's slot is populated.
    pub fn has(&self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::Inertial => self.inertial.is_some(),
            SensorKind::Image => self.image.is_some(),
            SensorKind::Kinematic => self.kinematics.is_some(),
        }
    }
}

/// Snapshot assembly diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Kinds that produced no reading for this frame
    pub missing_kinds: Vec<SensorKind>,

    /// Stale readings discarded while assembling this snapshot
    pub mismatch_drops: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinematics;

    fn tick(frame: FrameId) -> TickInfo {
        TickInfo {
            frame,
            timestamp: frame as f64 * 0.05,
            elapsed: frame as f64 * 0.05,
        }
    }

    #[test]
    fn test_set_kinematic_reading_unwraps_payload() {
        let mut snap = Snapshot::empty(tick(3));
        snap.set_reading(SensorReading {
            frame: 3,
            sensor_id: "ego".into(),
            kind: SensorKind::Kinematic,
            timestamp: 0.15,
            payload: ReadingPayload::Kinematic(Kinematics {
                acceleration: 1.5,
                velocity: 8.0,
            }),
        });

        assert!(snap.has(SensorKind::Kinematic));
        assert_eq!(snap.kinematics.unwrap().velocity, 8.0);
        assert!(!snap.has(SensorKind::Image));
    }
}
