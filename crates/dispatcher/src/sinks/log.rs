//! LogSink - logs snapshot summary via tracing

use contracts::{ContractError, SensorKind, Snapshot, SnapshotSink};
use tracing::{info, instrument};

/// Sink that logs snapshot summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_snapshot_summary(&self, snapshot: &Snapshot) {
        info!(
            sink = %self.name,
            frame = snapshot.frame,
            elapsed = snapshot.elapsed,
            inertial = snapshot.has(SensorKind::Inertial),
            image = snapshot.has(SensorKind::Image),
            kinematics = snapshot.has(SensorKind::Kinematic),
            missing = snapshot.meta.missing_kinds.len(),
            drops = snapshot.meta.mismatch_drops,
            "Snapshot received"
        );
    }
}

impl SnapshotSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, snapshot),
        fields(sink = %self.name, frame = snapshot.frame)
    )]
    async fn write(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        self.log_snapshot_summary(snapshot);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
