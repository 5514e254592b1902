//! SensorSource trait - sensor data source abstraction
//!
//! Unified interface over real simulator sensors and mock sensors, so the
//! registry never knows which one it is wiring up.

use std::sync::Arc;

use crate::{SensorKind, SensorReading};

/// Sensor data callback type
///
/// Invoked on the producer's thread for every reading the sensor emits.
/// Uses `Arc` to allow callback sharing across multiple contexts.
pub type SensorDataCallback = Arc<dyn Fn(SensorReading) + Send + Sync>;

/// Sensor data source trait
///
/// Abstracts the common behavior of real simulator sensors and mock sensors.
/// Producers decode raw data into `SensorReading` before invoking the
/// callback; a decode failure is logged and the single reading dropped,
/// never panicked across the callback boundary.
///
/// # Example
///
/// ```ignore
/// let sensor: Box<dyn SensorSource> = world.sensor_source(actor_id)?;
/// sensor.listen(Arc::new(|reading| {
///     println!("frame {} from {}", reading.frame, reading.sensor_id);
/// }));
/// // ... run ...
/// sensor.stop();
/// ```
pub trait SensorSource: Send + Sync {
    /// Sensor identifier
    fn sensor_id(&self) -> &str;

    /// Sensor kind
    fn kind(&self) -> SensorKind;

    /// Register data callback and start producing.
    ///
    /// Idempotent: if already listening, repeated calls are a no-op and the
    /// original callback stays installed.
    fn listen(&self, callback: SensorDataCallback);

    /// Stop producing. Safe to call when not listening.
    fn stop(&self);

    /// Whether a callback is currently installed.
    fn is_listening(&self) -> bool;
}
