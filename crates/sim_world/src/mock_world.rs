//! Mock world - deterministic scripted simulator session
//!
//! Paces ticks at a fixed rate, fans each tick out to its mock sensors, and
//! scripts a simple ego trajectory. Used by tests and serverless runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use contracts::{Location, Rotation, ScenarioBlueprint, SensorSource, Transform, Vec3};
use tracing::{debug, info};

use crate::mock_sensor::{MockSensor, MockSensorConfig};
use crate::{EgoState, MockLaneGraph, TickSnapshot, WorldActor, WorldClient, WorldError};

const EGO_ACTOR_ID: u64 = 1;
const IMU_ACTOR_ID: u64 = 2;
const CAMERA_ACTOR_ID: u64 = 3;
const TRAFFIC_LIGHT_ACTOR_ID: u64 = 99;

/// Mock world configuration
#[derive(Debug, Clone)]
pub struct MockWorldConfig {
    /// Tick frequency
    pub tick_hz: f64,
    /// Attach a mock IMU
    pub with_imu: bool,
    /// Attach a mock camera
    pub with_camera: bool,
    /// Mock camera frame size
    pub image_width: u32,
    pub image_height: u32,
    /// role_name reported for the ego vehicle actor
    pub ego_role: String,
}

impl Default for MockWorldConfig {
    fn default() -> Self {
        Self {
            tick_hz: 20.0,
            with_imu: true,
            with_camera: true,
            image_width: 800,
            image_height: 600,
            ego_role: "ego_vehicle".to_string(),
        }
    }
}

impl MockWorldConfig {
    /// Derive the mock world shape from a scenario blueprint.
    pub fn from_blueprint(blueprint: &ScenarioBlueprint) -> Self {
        Self {
            tick_hz: blueprint.mock.tick_hz,
            with_imu: blueprint.mock.with_imu,
            with_camera: blueprint.mock.with_camera,
            image_width: blueprint.mock.image_width,
            image_height: blueprint.mock.image_height,
            ego_role: blueprint.world.ego_role.clone(),
        }
    }
}

/// Deterministic scripted world.
pub struct MockWorld {
    config: MockWorldConfig,
    connected: AtomicBool,
    frame: AtomicU64,
    sensors: Vec<(u64, MockSensor)>,
    graph: MockLaneGraph,
}

impl MockWorld {
    pub fn new(config: MockWorldConfig) -> Self {
        let sensor_config = MockSensorConfig {
            image_width: config.image_width,
            image_height: config.image_height,
        };

        let mut sensors = Vec::new();
        if config.with_imu {
            sensors.push((
                IMU_ACTOR_ID,
                MockSensor::new(
                    format!("imu/{IMU_ACTOR_ID}"),
                    contracts::SensorKind::Inertial,
                    sensor_config.clone(),
                ),
            ));
        }
        if config.with_camera {
            sensors.push((
                CAMERA_ACTOR_ID,
                MockSensor::new(
                    format!("camera/{CAMERA_ACTOR_ID}"),
                    contracts::SensorKind::Image,
                    sensor_config,
                ),
            ));
        }

        Self {
            config,
            connected: AtomicBool::new(false),
            frame: AtomicU64::new(0),
            sensors,
            graph: MockLaneGraph::two_road_default(),
        }
    }

    pub fn from_blueprint(blueprint: &ScenarioBlueprint) -> Self {
        Self::new(MockWorldConfig::from_blueprint(blueprint))
    }

    /// Replace the default two-road map (tests).
    pub fn with_graph(mut self, graph: MockLaneGraph) -> Self {
        self.graph = graph;
        self
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.tick_hz)
    }

    /// Scripted ego trajectory: accelerate along +x, cap at 15 m/s.
    fn ego_state(&self, frame: u64, dt: f64) -> EgoState {
        let speed = (0.25 * frame as f64).min(15.0);
        let accelerating = speed < 15.0;
        EgoState {
            acceleration: Vec3 {
                x: if accelerating { 0.25 / dt } else { 0.0 },
                y: 0.0,
                z: 0.0,
            },
            velocity: Vec3 {
                x: speed,
                y: 0.0,
                z: 0.0,
            },
            transform: Transform {
                location: Location {
                    x: speed * frame as f64 * dt * 0.5,
                    y: 0.0,
                    z: 0.0,
                },
                rotation: Rotation::default(),
            },
        }
    }
}

impl WorldClient for MockWorld {
    type Graph = MockLaneGraph;

    fn connect(&self, host: &str, port: u16, _timeout: Duration) -> Result<(), WorldError> {
        if port == 0 {
            return Err(WorldError::connection_failed(host, port, "invalid port"));
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(host, port, "mock world session established");
        Ok(())
    }

    fn wait_for_tick(&self, timeout: Duration) -> Result<TickSnapshot, WorldError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WorldError::NotConnected);
        }

        let interval = self.tick_interval();
        if timeout < interval {
            // The next tick cannot arrive within the budget.
            thread::sleep(timeout);
            return Err(WorldError::TickTimeout {
                waited_ms: timeout.as_millis() as u64,
            });
        }

        thread::sleep(interval);

        let dt = interval.as_secs_f64();
        let frame = self.frame.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = frame as f64 * dt;

        for (_, sensor) in &self.sensors {
            sensor.emit_tick(frame, timestamp);
        }

        Ok(TickSnapshot {
            frame,
            timestamp,
            ego: Some(self.ego_state(frame, dt)),
        })
    }

    fn actors(&self) -> Result<Vec<WorldActor>, WorldError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WorldError::NotConnected);
        }

        let mut actors = vec![
            WorldActor {
                id: EGO_ACTOR_ID,
                type_id: "vehicle.tesla.model3".to_string(),
                role_name: Some(self.config.ego_role.clone()),
            },
            // Present in any real world; must be skipped by classification
            WorldActor {
                id: TRAFFIC_LIGHT_ACTOR_ID,
                type_id: "traffic.traffic_light".to_string(),
                role_name: None,
            },
        ];

        for (actor_id, sensor) in &self.sensors {
            let type_id = match sensor.kind() {
                contracts::SensorKind::Inertial => "sensor.other.imu",
                contracts::SensorKind::Image => "sensor.camera.rgb",
                contracts::SensorKind::Kinematic => "sensor.other.unknown",
            };
            actors.push(WorldActor {
                id: *actor_id,
                type_id: type_id.to_string(),
                role_name: None,
            });
        }

        debug!(count = actors.len(), "mock world actors enumerated");
        Ok(actors)
    }

    fn sensor_source(&self, actor_id: u64) -> Option<Box<dyn SensorSource>> {
        self.sensors
            .iter()
            .find(|(id, _)| *id == actor_id)
            .map(|(_, sensor)| Box::new(sensor.clone()) as Box<dyn SensorSource>)
    }

    fn lane_graph(&self) -> Result<Self::Graph, WorldError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WorldError::NotConnected);
        }
        Ok(self.graph.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> MockWorldConfig {
        MockWorldConfig {
            tick_hz: 200.0,
            image_width: 8,
            image_height: 8,
            ..Default::default()
        }
    }

    #[test]
    fn test_ticks_are_strictly_increasing() {
        let world = MockWorld::new(fast_config());
        world
            .connect("localhost", 2000, Duration::from_secs(1))
            .unwrap();

        let t1 = world.wait_for_tick(Duration::from_secs(1)).unwrap();
        let t2 = world.wait_for_tick(Duration::from_secs(1)).unwrap();
        assert!(t2.frame > t1.frame);
        assert!(t2.timestamp > t1.timestamp);
        assert!(t1.ego.is_some());
    }

    #[test]
    fn test_wait_before_connect_fails() {
        let world = MockWorld::new(fast_config());
        let err = world.wait_for_tick(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, WorldError::NotConnected));
    }

    #[test]
    fn test_tick_timeout() {
        let world = MockWorld::new(MockWorldConfig {
            tick_hz: 1.0,
            ..fast_config()
        });
        world
            .connect("localhost", 2000, Duration::from_secs(1))
            .unwrap();

        let err = world.wait_for_tick(Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, WorldError::TickTimeout { .. }));
    }

    #[test]
    fn test_actor_enumeration() {
        let world = MockWorld::new(fast_config());
        world
            .connect("localhost", 2000, Duration::from_secs(1))
            .unwrap();

        let actors = world.actors().unwrap();
        assert!(actors
            .iter()
            .any(|a| a.role_name.as_deref() == Some("ego_vehicle")));
        assert!(actors.iter().any(|a| a.type_id == "sensor.other.imu"));
        assert!(actors.iter().any(|a| a.type_id == "sensor.camera.rgb"));

        // Sensor actors resolve to sources, others don't
        assert!(world.sensor_source(IMU_ACTOR_ID).is_some());
        assert!(world.sensor_source(EGO_ACTOR_ID).is_none());
    }
}
