//! SensorRegistry - actor discovery and sensor attachment
//!
//! Walks the world's actor list once at startup, resolves the ego vehicle by
//! role name, classifies sensor actors into kinds and wires their callbacks
//! into the per-kind queues. Attachment is idempotent per sensor id.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use contracts::{ContractError, SensorId, SensorKind, SensorReading, SensorSource};
use sim_world::WorldClient;
use tracing::{debug, info, warn};

use crate::SensorQueues;

/// Map a blueprint type id onto a sensor kind.
///
/// Kinematic never matches: it is derived from the tick's ego state, not
/// read from an actor.
pub fn classify(type_id: &str) -> Option<SensorKind> {
    if type_id == "sensor.other.imu" {
        Some(SensorKind::Inertial)
    } else if type_id.starts_with("sensor.camera") {
        Some(SensorKind::Image)
    } else {
        None
    }
}

/// Outcome of an actor discovery pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoverySummary {
    /// Sensors newly attached in this pass
    pub attached: usize,
    /// Sensor actors seen but already attached
    pub already_attached: usize,
    /// Whether the ego vehicle was resolved (in this or a previous pass)
    pub ego_resolved: bool,
}

pub struct SensorRegistry {
    senders: HashMap<SensorKind, async_channel::Sender<SensorReading>>,
    sources: Mutex<HashMap<SensorId, Box<dyn SensorSource>>>,
    ego_actor: OnceLock<u64>,
}

impl SensorRegistry {
    pub fn new(queues: &SensorQueues) -> Self {
        let senders = SensorKind::ALL
            .into_iter()
            .map(|kind| (kind, queues.reading_sender(kind)))
            .collect();
        Self {
            senders,
            sources: Mutex::new(HashMap::new()),
            ego_actor: OnceLock::new(),
        }
    }

    /// Enumerate world actors, resolve the ego, attach every sensor actor.
    ///
    /// Safe to call again on a live registry; already-attached sensors are
    /// left untouched.
    pub fn discover<C: WorldClient>(
        &self,
        world: &C,
        ego_role: &str,
    ) -> Result<DiscoverySummary, ContractError> {
        let mut summary = DiscoverySummary::default();

        for actor in world.actors()? {
            if actor.role_name.as_deref() == Some(ego_role) {
                if self.ego_actor.set(actor.id).is_ok() {
                    info!(actor_id = actor.id, role = ego_role, "ego vehicle resolved");
                } else if self.ego_actor.get() != Some(&actor.id) {
                    warn!(
                        actor_id = actor.id,
                        existing = ?self.ego_actor.get(),
                        "second actor with ego role, keeping first"
                    );
                }
            }

            let Some(kind) = classify(&actor.type_id) else {
                continue;
            };

            let Some(source) = world.sensor_source(actor.id) else {
                warn!(
                    actor_id = actor.id,
                    type_id = %actor.type_id,
                    "sensor actor has no data source, skipping"
                );
                continue;
            };

            debug_assert_eq!(source.kind(), kind);
            if self.attach(source)? {
                summary.attached += 1;
            } else {
                summary.already_attached += 1;
            }
        }

        summary.ego_resolved = self.ego_actor.get().is_some();
        info!(
            attached = summary.attached,
            already_attached = summary.already_attached,
            ego_resolved = summary.ego_resolved,
            "sensor discovery finished"
        );
        Ok(summary)
    }

    /// Attach a sensor source, wiring its callback into the kind's queue.
    ///
    /// Returns `Ok(false)` when a source with the same sensor id is already
    /// attached; the duplicate is dropped without listening.
    pub fn attach(&self, source: Box<dyn SensorSource>) -> Result<bool, ContractError> {
        let sensor_id: SensorId = source.sensor_id().into();
        let kind = source.kind();

        let mut sources = self
            .sources
            .lock()
            .map_err(|_| ContractError::Other("sensor registry lock poisoned".to_string()))?;

        if sources.contains_key(&sensor_id) {
            debug!(
                error = %ContractError::AttachConflict { sensor_id: sensor_id.to_string() },
                "skipping duplicate attach"
            );
            return Ok(false);
        }

        let tx = self.senders[&kind].clone();
        let expected_id = sensor_id.clone();
        source.listen(std::sync::Arc::new(move |reading: SensorReading| {
            if reading.payload.kind() != Some(kind) {
                warn!(
                    sensor_id = %expected_id,
                    got = ?reading.payload.kind(),
                    "payload kind does not match sensor, dropping reading"
                );
                return;
            }
            metrics::counter!("carla_viz_readings_total", "kind" => kind.as_str()).increment(1);
            // Unbounded queue: failure means the aggregator is gone.
            let _ = tx.try_send(reading);
        }));

        info!(sensor_id = %sensor_id, kind = %kind, "sensor attached");
        sources.insert(sensor_id, source);
        Ok(true)
    }

    /// Stop every attached sensor and forget it. Called before shutdown.
    pub fn detach_all(&self) {
        let mut sources = match self.sources.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (sensor_id, source) in sources.drain() {
            source.stop();
            debug!(sensor_id = %sensor_id, "sensor detached");
        }
    }

    /// Kinds with at least one attached sensor.
    pub fn attached_kinds(&self) -> Vec<SensorKind> {
        let sources = match self.sources.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        SensorKind::ALL
            .into_iter()
            .filter(|kind| sources.values().any(|s| s.kind() == *kind))
            .collect()
    }

    pub fn ego_actor_id(&self) -> Option<u64> {
        self.ego_actor.get().copied()
    }

    pub fn len(&self) -> usize {
        match self.sources.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_world::{MockSensor, MockSensorConfig, MockWorld, MockWorldConfig};
    use std::time::Duration;

    #[test]
    fn test_classify() {
        assert_eq!(classify("sensor.other.imu"), Some(SensorKind::Inertial));
        assert_eq!(classify("sensor.camera.rgb"), Some(SensorKind::Image));
        assert_eq!(
            classify("sensor.camera.semantic_segmentation"),
            Some(SensorKind::Image)
        );
        assert_eq!(classify("sensor.other.gnss"), None);
        assert_eq!(classify("vehicle.tesla.model3"), None);
        assert_eq!(classify("traffic.traffic_light"), None);
    }

    #[test]
    fn test_discover_attaches_and_resolves_ego() {
        let world = MockWorld::new(MockWorldConfig::default());
        world
            .connect("localhost", 2000, Duration::from_secs(1))
            .unwrap();

        let queues = SensorQueues::new();
        let registry = SensorRegistry::new(&queues);

        let summary = registry.discover(&world, "ego_vehicle").unwrap();
        assert_eq!(summary.attached, 2);
        assert!(summary.ego_resolved);
        assert!(registry.ego_actor_id().is_some());

        // Second pass attaches nothing new
        let again = registry.discover(&world, "ego_vehicle").unwrap();
        assert_eq!(again.attached, 0);
        assert_eq!(again.already_attached, 2);
        assert_eq!(registry.len(), 2);

        let mut kinds = registry.attached_kinds();
        kinds.sort_by_key(|k| k.as_str());
        assert_eq!(kinds, vec![SensorKind::Image, SensorKind::Inertial]);

        registry.detach_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_attach_is_idempotent_per_sensor_id() {
        let queues = SensorQueues::new();
        let registry = SensorRegistry::new(&queues);

        let sensor = MockSensor::new("imu/5", SensorKind::Inertial, MockSensorConfig::default());

        assert!(registry.attach(Box::new(sensor.clone())).unwrap());
        assert!(!registry.attach(Box::new(sensor.clone())).unwrap());
        assert_eq!(registry.len(), 1);

        registry.detach_all();
        assert!(!sensor.is_listening());
    }

    #[test]
    fn test_attached_callback_feeds_queue() {
        let queues = SensorQueues::new();
        let registry = SensorRegistry::new(&queues);

        let sensor = MockSensor::new("imu/6", SensorKind::Inertial, MockSensorConfig::default());
        registry.attach(Box::new(sensor.clone())).unwrap();

        sensor.emit_tick(4, 0.20);
        std::thread::sleep(Duration::from_millis(100));

        let reading = queues
            .reading_receiver(SensorKind::Inertial)
            .try_recv()
            .unwrap();
        assert_eq!(reading.frame, 4);
        registry.detach_all();
    }
}
