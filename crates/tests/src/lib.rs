//! # Integration Tests
//!
//! End-to-end tests covering the mock pipeline without a simulator:
//! - world tick to snapshot flow through clock, registry and aggregator
//! - topology extraction and map output
//! - dispatcher fan-out to sinks

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_config_loads_from_disk() {
        use std::io::Write;

        let toml = r#"
[world]
host = "localhost"
port = 2000
ego_role = "ego_vehicle"

[frame.offsets]
image = -1

[topology]
precision = 0.5
map_path = "output/map.json"

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(toml.as_bytes())
            .unwrap();

        let blueprint = config_loader::ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(blueprint.world.port, 2000);
        assert_eq!(blueprint.frame.offsets.image, -1);
        assert_eq!(blueprint.sinks.len(), 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{Kinematics, SensorKind, SinkConfig, SinkType, Snapshot, TickInfo};
    use dispatcher::create_dispatcher;
    use frame_sync::{Aggregator, AggregatorConfig, FrameClock, SensorQueues, SensorRegistry};
    use observability::SnapshotMetricsAggregator;
    use sim_world::{MockWorld, MockWorldConfig, WorldClient};
    use tokio::sync::{mpsc, watch};

    /// End-to-end: MockWorld ticks -> FrameClock + sensors -> Aggregator.
    ///
    /// Verifies the full synchronization flow: frames strictly increase,
    /// the derived kinematic reading rides along every tick, and the camera
    /// slot fills from the second snapshot on (image offset is -1 and no
    /// reading exists for frame 0).
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let world = Arc::new(MockWorld::new(MockWorldConfig {
            tick_hz: 200.0,
            image_width: 4,
            image_height: 4,
            ..Default::default()
        }));
        world
            .connect("localhost", 2000, Duration::from_millis(100))
            .unwrap();

        let queues = SensorQueues::new();
        let registry = SensorRegistry::new(&queues);
        let discovery = registry.discover(world.as_ref(), "ego_vehicle").unwrap();
        assert_eq!(discovery.attached, 2, "imu and camera should attach");
        assert!(discovery.ego_resolved);

        let (stop_tx, stop_rx) = watch::channel(false);

        let clock = FrameClock::new(
            Arc::clone(&world),
            queues.control_sender(),
            queues.reading_sender(SensorKind::Kinematic),
            Duration::from_millis(100),
        );
        let clock_stop = stop_rx.clone();
        let clock_handle = tokio::task::spawn_blocking(move || clock.run(clock_stop));

        let mut live_kinds = registry.attached_kinds();
        live_kinds.push(SensorKind::Kinematic);
        let (snapshot_tx, mut snapshot_rx) = mpsc::channel(16);
        let aggregator = Aggregator::new(
            &queues,
            snapshot_tx,
            AggregatorConfig {
                live_kinds,
                ..Default::default()
            },
        );
        let aggregator_handle = tokio::spawn(aggregator.run(stop_rx));

        let mut snapshots = Vec::new();
        while snapshots.len() < 5 {
            let snapshot = tokio::time::timeout(Duration::from_secs(5), snapshot_rx.recv())
                .await
                .expect("pipeline stalled")
                .expect("aggregator output closed");
            snapshots.push(snapshot);
        }

        stop_tx.send(true).unwrap();
        registry.detach_all();
        clock_handle.await.unwrap().unwrap();
        let _ = aggregator_handle.await.unwrap();

        for pair in snapshots.windows(2) {
            assert!(pair[1].frame > pair[0].frame, "frames must increase");
        }

        let first = &snapshots[0];
        assert_eq!(first.frame, 1);
        assert!(first.inertial.is_some());
        assert!(first.kinematics.is_some());
        assert!(first.image.is_none());
        assert!(first.meta.missing_kinds.contains(&SensorKind::Image));

        for snapshot in &snapshots[1..] {
            assert!(snapshot.inertial.is_some(), "frame {}", snapshot.frame);
            assert!(snapshot.image.is_some(), "frame {}", snapshot.frame);
            assert!(snapshot.kinematics.is_some(), "frame {}", snapshot.frame);
            let image = snapshot.image.as_ref().unwrap();
            assert_eq!(image.frame, snapshot.frame - 1, "image lags by one frame");
        }

        // Scripted ego accelerates, so velocity grows between snapshots
        let v_first = snapshots[0].kinematics.as_ref().unwrap().velocity;
        let v_last = snapshots[4].kinematics.as_ref().unwrap().velocity;
        assert!(v_last > v_first);

        // Run summary sees only the first snapshot's missing camera slot
        let mut aggregates = SnapshotMetricsAggregator::new();
        for snapshot in &snapshots {
            aggregates.update(snapshot);
        }
        let summary = aggregates.summary();
        assert_eq!(summary.total_snapshots, 5);
        assert_eq!(summary.snapshots_with_missing, 1);
        assert_eq!(summary.total_mismatch_drops, 0);
        assert!(summary.velocity.max > summary.velocity.min);
    }

    /// Topology extraction writes a parseable GeoJSON map.
    #[tokio::test]
    async fn test_topology_map_output() {
        let world = MockWorld::new(MockWorldConfig::default());
        world
            .connect("localhost", 2000, Duration::from_millis(100))
            .unwrap();

        let graph = world.lane_graph().unwrap();
        let summary = topology::extract(&graph, &topology::ExtractOptions::default());
        assert!(summary.collection.features.len() >= 2);
        assert_eq!(summary.skipped_features, 0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        topology::write_map_json(&path, &summary.collection).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "FeatureCollection");

        let features = value["features"].as_array().unwrap();
        assert_eq!(features.len(), summary.collection.features.len());
        for feature in features {
            assert_eq!(feature["geometry"]["type"], "LineString");
            let coords = feature["geometry"]["coordinates"].as_array().unwrap();
            assert!(!coords.is_empty());
            assert_eq!(coords[0].as_array().unwrap().len(), 3);
        }
    }

    /// Dispatcher fans snapshots out to log and file sinks.
    #[tokio::test]
    async fn test_dispatcher_fan_out() {
        let dir = tempfile::tempdir().unwrap();
        let base_path = dir.path().join("capture");

        let mut params = HashMap::new();
        params.insert(
            "base_path".to_string(),
            base_path.display().to_string(),
        );
        let sink_configs = vec![
            SinkConfig {
                name: "log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "file".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 50,
                params,
            },
        ];

        let (snapshot_tx, snapshot_rx) = mpsc::channel::<Snapshot>(16);
        let dispatcher = create_dispatcher(sink_configs, snapshot_rx).unwrap();
        let dispatcher_handle = dispatcher.spawn();

        for frame in 1..=3u64 {
            let mut snapshot = Snapshot::empty(TickInfo {
                frame,
                timestamp: frame as f64 * 0.05,
                elapsed: (frame - 1) as f64 * 0.05,
            });
            snapshot.kinematics = Some(Kinematics {
                acceleration: 0.5,
                velocity: frame as f64,
            });
            snapshot_tx.send(snapshot).await.unwrap();
        }
        drop(snapshot_tx);

        tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
            .await
            .expect("dispatcher did not drain")
            .unwrap();

        let manifest = std::fs::read_to_string(base_path.join("frames.jsonl")).unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(record["frame"], (i + 1) as u64);
            assert_eq!(record["velocity"], (i + 1) as f64);
        }
    }
}
