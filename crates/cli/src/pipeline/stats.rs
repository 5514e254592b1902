//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::SnapshotMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total snapshots assembled and dispatched
    pub snapshots_built: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of sensors that were attached
    pub active_sensors: usize,

    /// Number of sinks that received data
    pub active_sinks: usize,

    /// Road boundary features written to the map
    pub topology_features: usize,

    /// Boundary walks that failed and were skipped
    pub topology_skipped: usize,

    /// Snapshot metrics aggregator
    pub snapshot_metrics: SnapshotMetricsAggregator,
}

impl PipelineStats {
    /// Calculate snapshots per second throughput
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.snapshots_built as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Snapshots built: {}", self.snapshots_built);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   ├─ Active sensors: {}", self.active_sensors);
        println!("   ├─ Active sinks: {}", self.active_sinks);
        println!(
            "   └─ Topology features: {} ({} skipped)",
            self.topology_features, self.topology_skipped
        );

        let summary = self.snapshot_metrics.summary();

        println!("\n📈 Frame Alignment Metrics");
        println!(
            "   ├─ Stale readings dropped: {}",
            summary.total_mismatch_drops
        );
        println!(
            "   ├─ Snapshots with missing kinds: {} ({:.2}%)",
            summary.snapshots_with_missing, summary.missing_rate
        );
        println!("   ├─ Ego velocity (m/s): {}", summary.velocity);
        println!("   └─ Ego acceleration (m/s²): {}", summary.acceleration);

        if !summary.kind_missing_counts.is_empty() {
            println!("\n⚠️  Missing Kind Counts");
            for (kind, count) in &summary.kind_missing_counts {
                println!("   ├─ {}: {}", kind, count);
            }
        }

        println!();
    }
}
