//! Pipeline metrics collection
//!
//! Records per-snapshot metrics and keeps in-memory aggregates for the
//! end-of-run summary.

use contracts::Snapshot;
use metrics::{counter, gauge, histogram};

/// Record metrics for one assembled snapshot.
///
/// Call once per snapshot coming out of the aggregator.
pub fn record_snapshot_metrics(snapshot: &Snapshot) {
    counter!("carla_viz_snapshots_total").increment(1);

    // Frame id (for spotting frame jumps)
    gauge!("carla_viz_last_frame_id").set(snapshot.frame as f64);

    histogram!("carla_viz_snapshot_elapsed_s").record(snapshot.elapsed);

    if let Some(kinematics) = &snapshot.kinematics {
        gauge!("carla_viz_ego_velocity").set(kinematics.velocity);
        gauge!("carla_viz_ego_acceleration").set(kinematics.acceleration);
    }

    if snapshot.meta.mismatch_drops > 0 {
        counter!("carla_viz_mismatch_drops_total")
            .increment(snapshot.meta.mismatch_drops as u64);
    }

    let missing = snapshot.meta.missing_kinds.len();
    gauge!("carla_viz_kinds_missing").set(missing as f64);
    if missing > 0 {
        counter!("carla_viz_snapshots_with_missing_total").increment(1);
        for kind in &snapshot.meta.missing_kinds {
            counter!("carla_viz_kind_missing_total", "kind" => kind.as_str()).increment(1);
        }
    }
}

/// Record the startup topology extraction
pub fn record_topology_extracted(features: usize, skipped: usize) {
    gauge!("carla_viz_topology_features").set(features as f64);
    gauge!("carla_viz_topology_skipped").set(skipped as f64);
}

/// Snapshot metrics aggregator
///
/// Aggregates in memory for the end-of-run summary report.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMetricsAggregator {
    /// Total snapshots seen
    pub total_snapshots: u64,

    /// Total stale readings dropped
    pub total_mismatch_drops: u64,

    /// Snapshots with at least one missing kind
    pub snapshots_with_missing: u64,

    /// Ego velocity statistics (m/s)
    pub velocity_stats: RunningStats,

    /// Ego acceleration statistics (m/s²)
    pub acceleration_stats: RunningStats,

    /// Missing counts per kind
    pub missing_counts: std::collections::HashMap<&'static str, u64>,
}

impl SnapshotMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one snapshot into the aggregates
    pub fn update(&mut self, snapshot: &Snapshot) {
        self.total_snapshots += 1;
        self.total_mismatch_drops += snapshot.meta.mismatch_drops as u64;

        if !snapshot.meta.missing_kinds.is_empty() {
            self.snapshots_with_missing += 1;
            for kind in &snapshot.meta.missing_kinds {
                *self.missing_counts.entry(kind.as_str()).or_insert(0) += 1;
            }
        }

        if let Some(kinematics) = &snapshot.kinematics {
            self.velocity_stats.push(kinematics.velocity);
            self.acceleration_stats.push(kinematics.acceleration);
        }
    }

    /// Produce the summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_snapshots: self.total_snapshots,
            total_mismatch_drops: self.total_mismatch_drops,
            snapshots_with_missing: self.snapshots_with_missing,
            missing_rate: if self.total_snapshots > 0 {
                self.snapshots_with_missing as f64 / self.total_snapshots as f64 * 100.0
            } else {
                0.0
            },
            velocity: StatsSummary::from(&self.velocity_stats),
            acceleration: StatsSummary::from(&self.acceleration_stats),
            kind_missing_counts: self
                .missing_counts
                .iter()
                .map(|(kind, count)| (kind.to_string(), *count))
                .collect(),
        }
    }

    /// Reset all aggregates
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary of a run's snapshot metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_snapshots: u64,
    pub total_mismatch_drops: u64,
    pub snapshots_with_missing: u64,
    pub missing_rate: f64,
    pub velocity: StatsSummary,
    pub acceleration: StatsSummary,
    pub kind_missing_counts: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Snapshot Metrics Summary ===")?;
        writeln!(f, "Total snapshots: {}", self.total_snapshots)?;
        writeln!(f, "Stale readings dropped: {}", self.total_mismatch_drops)?;
        writeln!(
            f,
            "Snapshots with missing kinds: {} ({:.2}%)",
            self.snapshots_with_missing, self.missing_rate
        )?;
        writeln!(f, "Ego velocity (m/s): {}", self.velocity)?;
        writeln!(f, "Ego acceleration (m/s2): {}", self.acceleration)?;

        if !self.kind_missing_counts.is_empty() {
            writeln!(f, "Missing kind counts:")?;
            for (kind, count) in &self.kind_missing_counts {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
