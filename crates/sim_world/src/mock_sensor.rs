//! Mock sensor implementation
//!
//! Implements `SensorSource`, producing one reading per world tick on its own
//! thread. The world pushes tick events into the sensor's feed; the sensor
//! thread decodes them into readings and invokes the installed callback,
//! mirroring how real simulator sensors deliver data per tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use contracts::{
    FrameId, ImageFrame, ImuSample, PixelFormat, ReadingPayload, SensorDataCallback, SensorKind,
    SensorReading, SensorSource, Vec3,
};
use tracing::{debug, trace};

/// Mock sensor configuration
#[derive(Debug, Clone)]
pub struct MockSensorConfig {
    /// Image width (Image kind only)
    pub image_width: u32,
    /// Image height (Image kind only)
    pub image_height: u32,
}

impl Default for MockSensorConfig {
    fn default() -> Self {
        Self {
            image_width: 800,
            image_height: 600,
        }
    }
}

struct Inner {
    sensor_id: String,
    kind: SensorKind,
    config: MockSensorConfig,
    listening: AtomicBool,
    feed_tx: async_channel::Sender<(FrameId, f64)>,
    feed_rx: async_channel::Receiver<(FrameId, f64)>,
}

/// Mock sensor
///
/// Cheap to clone; all clones share the same feed and listen state, so the
/// world can keep one handle while the registry owns another.
#[derive(Clone)]
pub struct MockSensor {
    inner: Arc<Inner>,
}

impl MockSensor {
    /// Create a new mock sensor.
    pub fn new(sensor_id: impl Into<String>, kind: SensorKind, config: MockSensorConfig) -> Self {
        let (feed_tx, feed_rx) = async_channel::unbounded();
        Self {
            inner: Arc::new(Inner {
                sensor_id: sensor_id.into(),
                kind,
                config,
                listening: AtomicBool::new(false),
                feed_tx,
                feed_rx,
            }),
        }
    }

    /// Deliver a tick event to this sensor.
    ///
    /// No-op while nobody is listening, like a real sensor without a
    /// subscription. Tests drive sensors directly through this.
    pub fn emit_tick(&self, frame: FrameId, timestamp: f64) {
        if !self.is_listening() {
            return;
        }
        // Unbounded feed: try_send only fails when the channel is closed.
        let _ = self.inner.feed_tx.try_send((frame, timestamp));
    }

    fn make_reading(inner: &Inner, frame: FrameId, timestamp: f64) -> SensorReading {
        let payload = match inner.kind {
            SensorKind::Inertial => ReadingPayload::Inertial(ImuSample {
                accelerometer: Vec3 {
                    x: (frame as f64 * 0.1).sin() * 0.2,
                    y: 0.0,
                    z: 9.81,
                },
                gyroscope: Vec3::default(),
                compass: 0.0,
            }),
            SensorKind::Image => {
                let size = (inner.config.image_width * inner.config.image_height * 4) as usize;
                ReadingPayload::Image(ImageFrame {
                    width: inner.config.image_width,
                    height: inner.config.image_height,
                    format: PixelFormat::Bgra8,
                    data: Bytes::from(vec![128u8; size]),
                })
            }
            SensorKind::Kinematic => ReadingPayload::Raw(Bytes::new()),
        };

        SensorReading {
            frame,
            sensor_id: inner.sensor_id.as_str().into(),
            kind: inner.kind,
            timestamp,
            payload,
        }
    }
}

impl SensorSource for MockSensor {
    fn sensor_id(&self) -> &str {
        &self.inner.sensor_id
    }

    fn kind(&self) -> SensorKind {
        self.inner.kind
    }

    fn listen(&self, callback: SensorDataCallback) {
        // Idempotent: if already listening, don't start again
        if self.inner.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);

        thread::spawn(move || {
            debug!(
                sensor_id = %inner.sensor_id,
                kind = %inner.kind,
                "mock sensor started"
            );

            while inner.listening.load(Ordering::Relaxed) {
                let Ok((frame, timestamp)) = inner.feed_rx.recv_blocking() else {
                    break;
                };

                let reading = Self::make_reading(&inner, frame, timestamp);
                callback(reading);

                trace!(
                    sensor_id = %inner.sensor_id,
                    frame,
                    timestamp,
                    "mock reading sent"
                );
            }

            debug!(sensor_id = %inner.sensor_id, "mock sensor stopped");
        });
    }

    fn stop(&self) {
        self.inner.listening.store(false, Ordering::SeqCst);
        // Close the feed so a thread parked in recv_blocking wakes up.
        self.inner.feed_tx.close();
    }

    fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    #[test]
    fn test_mock_sensor_delivers_tick_readings() {
        let sensor = MockSensor::new("imu/1", SensorKind::Inertial, MockSensorConfig::default());

        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();

        sensor.listen(Arc::new(move |reading| {
            assert_eq!(reading.sensor_id, "imu/1");
            assert_eq!(reading.kind, SensorKind::Inertial);
            count_clone.fetch_add(1, Ordering::Relaxed);
        }));

        for frame in 1..=5 {
            sensor.emit_tick(frame, frame as f64 * 0.05);
        }

        // Delivery happens on the sensor thread
        thread::sleep(Duration::from_millis(100));
        sensor.stop();

        assert_eq!(count.load(Ordering::Relaxed), 5);
        assert!(!sensor.is_listening());
    }

    #[test]
    fn test_emit_without_listener_is_dropped() {
        let sensor = MockSensor::new("camera/1", SensorKind::Image, MockSensorConfig::default());
        sensor.emit_tick(1, 0.05);
        assert_eq!(sensor.inner.feed_rx.len(), 0);
    }

    #[test]
    fn test_idempotent_listen() {
        let sensor = MockSensor::new("imu/2", SensorKind::Inertial, MockSensorConfig::default());

        let count = Arc::new(AtomicU64::new(0));
        let count1 = count.clone();
        let count2 = count.clone();

        sensor.listen(Arc::new(move |_| {
            count1.fetch_add(1, Ordering::Relaxed);
        }));

        // Second callback must not be installed
        sensor.listen(Arc::new(move |_| {
            count2.fetch_add(100, Ordering::Relaxed);
        }));

        for frame in 1..=3 {
            sensor.emit_tick(frame, frame as f64 * 0.05);
        }

        thread::sleep(Duration::from_millis(100));
        sensor.stop();

        assert_eq!(count.load(Ordering::Relaxed), 3);
    }
}
