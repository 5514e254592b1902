//! Pipeline orchestrator - coordinates all components.
//!
//! Startup order: connect to the world, extract and write the road map,
//! discover sensors, start the dispatcher, then run the frame clock and
//! aggregator until stopped.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{ScenarioBlueprint, SensorKind};
use dispatcher::create_dispatcher;
use frame_sync::{Aggregator, AggregatorConfig, FrameClock, SensorQueues, SensorRegistry};
use observability::record_snapshot_metrics;
use sim_world::{MockWorld, WorldClient};
use tokio::sync::{mpsc, watch};
use topology::ExtractOptions;
use tracing::{info, warn};

use super::PipelineStats;

/// How long to wait for the dispatcher to drain its queues at shutdown
const DISPATCHER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The scenario blueprint configuration
    pub blueprint: ScenarioBlueprint,

    /// Maximum number of snapshots to build (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion.
    ///
    /// `shutdown` must not be cancelled from outside: the pipeline selects
    /// on it internally so the ordered-shutdown tail (stop signal, sensor
    /// detach, dispatcher drain) always runs, signal or not.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let world = Arc::new(MockWorld::from_blueprint(&self.config.blueprint));
        self.run_with_world(world, shutdown).await
    }

    pub(crate) async fn run_with_world(
        self,
        world: Arc<MockWorld>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Connect to the simulator
        info!(
            host = %blueprint.world.host,
            port = blueprint.world.port,
            "Connecting to simulator..."
        );

        let tick_timeout = Duration::from_secs_f64(blueprint.world.tick_timeout_s);
        world
            .connect(&blueprint.world.host, blueprint.world.port, tick_timeout)
            .with_context(|| {
                format!(
                    "Failed to connect to simulator at {}:{}",
                    blueprint.world.host, blueprint.world.port
                )
            })?;

        info!("Connected to simulator");

        // Extract and write the road map before any frames flow
        let (topology_features, topology_skipped) =
            extract_topology(world.as_ref(), blueprint).context("Topology extraction failed")?;

        // Discover sensors and the ego vehicle
        let queues = SensorQueues::new();
        let registry = SensorRegistry::new(&queues);
        let discovery = registry
            .discover(world.as_ref(), &blueprint.world.ego_role)
            .context("Sensor discovery failed")?;

        if !discovery.ego_resolved {
            warn!(
                role = %blueprint.world.ego_role,
                "No ego vehicle found; kinematics will be missing"
            );
        }

        let mut live_kinds = registry.attached_kinds();
        if discovery.ego_resolved && !live_kinds.contains(&SensorKind::Kinematic) {
            live_kinds.push(SensorKind::Kinematic);
        }

        // Start the dispatcher
        let (snapshot_tx, snapshot_rx) = mpsc::channel(self.config.buffer_size);
        let dispatcher = create_dispatcher(blueprint.sinks.clone(), snapshot_rx)
            .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        let (stop_tx, stop_rx) = watch::channel(false);

        // Frame clock runs on a dedicated blocking thread
        let clock = FrameClock::new(
            Arc::clone(&world),
            queues.control_sender(),
            queues.reading_sender(SensorKind::Kinematic),
            tick_timeout,
        );
        let clock_stop = stop_rx.clone();
        let clock_handle = tokio::task::spawn_blocking(move || clock.run(clock_stop));

        // Aggregator consumes ticks and readings, emits snapshots
        let (assembled_tx, mut assembled_rx) = mpsc::channel(self.config.buffer_size);
        let aggregator = Aggregator::new(
            &queues,
            assembled_tx,
            AggregatorConfig {
                offsets: blueprint.frame.offsets,
                dequeue_timeout: Duration::from_millis(blueprint.frame.dequeue_timeout_ms),
                live_kinds,
            },
        );
        let aggregator_handle = tokio::spawn(aggregator.run(stop_rx));

        info!(
            sensors = registry.len(),
            sinks = blueprint.sinks.len(),
            max_frames = ?self.config.max_frames,
            "Pipeline running"
        );

        let mut stats = PipelineStats {
            active_sensors: registry.len(),
            active_sinks: blueprint.sinks.len(),
            topology_features,
            topology_skipped,
            ..Default::default()
        };

        let deadline = self
            .config
            .timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);

        tokio::pin!(shutdown);

        loop {
            let received = tokio::select! {
                _ = &mut shutdown => {
                    warn!("Shutdown signal received, stopping pipeline");
                    break;
                }
                received = next_snapshot(&mut assembled_rx, deadline) => {
                    match received {
                        Some(received) => received,
                        None => {
                            info!("Pipeline timeout reached, shutting down");
                            break;
                        }
                    }
                }
            };

            let Some(snapshot) = received else {
                warn!("Aggregator output closed unexpectedly");
                break;
            };

            stats.snapshots_built += 1;
            stats.snapshot_metrics.update(&snapshot);
            record_snapshot_metrics(&snapshot);

            if snapshot_tx.send(snapshot).await.is_err() {
                warn!("Dispatcher input closed, shutting down");
                break;
            }

            if self
                .config
                .max_frames
                .is_some_and(|max| stats.snapshots_built >= max)
            {
                info!(snapshots = stats.snapshots_built, "Frame limit reached");
                break;
            }
        }

        // Ordered shutdown: stop producers, then let consumers drain
        let _ = stop_tx.send(true);
        registry.detach_all();
        drop(snapshot_tx);

        match clock_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "Frame clock ended with error"),
            Err(err) => warn!(error = %err, "Frame clock task panicked"),
        }

        match aggregator_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "Aggregator ended with error"),
            Err(err) => warn!(error = %err, "Aggregator task panicked"),
        }

        if tokio::time::timeout(DISPATCHER_SHUTDOWN_TIMEOUT, dispatcher_handle)
            .await
            .is_err()
        {
            warn!("Dispatcher did not drain within shutdown timeout");
        }

        stats.duration = start_time.elapsed();
        Ok(stats)
    }
}

/// Wait for the next assembled snapshot, bounded by the run deadline.
///
/// Outer `None` means the deadline passed; inner `None` means the aggregator
/// output closed.
async fn next_snapshot(
    rx: &mut mpsc::Receiver<contracts::Snapshot>,
    deadline: Option<tokio::time::Instant>,
) -> Option<Option<contracts::Snapshot>> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, rx.recv()).await.ok(),
        None => Some(rx.recv().await),
    }
}

/// Extract the lane graph, write `map.json`, return (features, skipped).
fn extract_topology(world: &MockWorld, blueprint: &ScenarioBlueprint) -> Result<(usize, usize)> {
    let graph = world.lane_graph()?;
    let summary = topology::extract(&graph, &ExtractOptions::from(&blueprint.topology));
    let features = summary.collection.features.len();

    topology::write_map_json(&blueprint.topology.map_path, &summary.collection).with_context(
        || {
            format!(
                "Failed to write map to {}",
                blueprint.topology.map_path.display()
            )
        },
    )?;

    observability::record_topology_extracted(features, summary.skipped_features);
    info!(
        features,
        skipped = summary.skipped_features,
        path = %blueprint.topology.map_path.display(),
        "Road topology written"
    );

    Ok((features, summary.skipped_features))
}
