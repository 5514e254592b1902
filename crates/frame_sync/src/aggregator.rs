//! Aggregator - snapshot assembly
//!
//! Single consumer of the control channel and all per-kind reading queues.
//! For each tick it dequeues the reading whose frame matches the snapshot
//! frame plus the kind's offset, discards stale readings, and parks a reading
//! that arrives early in a one-slot pending buffer for the next tick.

use std::time::Duration;

use contracts::{
    ContractError, FrameId, FrameOffsets, SensorKind, SensorReading, Snapshot, TickInfo,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::SensorQueues;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Per-kind frame offsets
    pub offsets: FrameOffsets,

    /// How long to wait for a reading from a live kind before declaring it
    /// missing for this frame
    pub dequeue_timeout: Duration,

    /// Kinds with an attached producer. Anything else is only polled, never
    /// waited on, so a world without a camera cannot stall the pipeline.
    pub live_kinds: Vec<SensorKind>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            offsets: FrameOffsets::default(),
            dequeue_timeout: Duration::from_millis(200),
            live_kinds: SensorKind::ALL.to_vec(),
        }
    }
}

pub struct Aggregator {
    control_rx: async_channel::Receiver<TickInfo>,
    inertial_rx: async_channel::Receiver<SensorReading>,
    image_rx: async_channel::Receiver<SensorReading>,
    kinematic_rx: async_channel::Receiver<SensorReading>,
    out_tx: mpsc::Sender<Snapshot>,
    config: AggregatorConfig,
    /// One reading per kind that arrived ahead of its frame
    pending: [Option<SensorReading>; 3],
    last_frame: Option<FrameId>,
}

fn slot(kind: SensorKind) -> usize {
    match kind {
        SensorKind::Inertial => 0,
        SensorKind::Image => 1,
        SensorKind::Kinematic => 2,
    }
}

impl Aggregator {
    pub fn new(queues: &SensorQueues, out_tx: mpsc::Sender<Snapshot>, config: AggregatorConfig) -> Self {
        Self {
            control_rx: queues.control_receiver(),
            inertial_rx: queues.reading_receiver(SensorKind::Inertial),
            image_rx: queues.reading_receiver(SensorKind::Image),
            kinematic_rx: queues.reading_receiver(SensorKind::Kinematic),
            out_tx,
            config,
            pending: [None, None, None],
            last_frame: None,
        }
    }

    fn receiver(&self, kind: SensorKind) -> &async_channel::Receiver<SensorReading> {
        match kind {
            SensorKind::Inertial => &self.inertial_rx,
            SensorKind::Image => &self.image_rx,
            SensorKind::Kinematic => &self.kinematic_rx,
        }
    }

    /// Consume ticks until stopped, emitting one snapshot per frame.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> Result<(), ContractError> {
        info!(live_kinds = ?self.config.live_kinds, "aggregator started");

        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                tick = self.control_rx.recv() => {
                    let tick = tick.map_err(|_| ContractError::ChannelClosed { channel: "control" })?;

                    // Frames only ever move forward
                    if self.last_frame.is_some_and(|last| tick.frame <= last) {
                        warn!(frame = tick.frame, last = ?self.last_frame, "non-monotonic tick, skipping");
                        continue;
                    }
                    self.last_frame = Some(tick.frame);

                    let snapshot = self.assemble(tick).await?;
                    metrics::counter!("carla_viz_snapshots_built_total").increment(1);

                    if self.out_tx.send(snapshot).await.is_err() {
                        return Err(ContractError::ChannelClosed { channel: "snapshot" });
                    }
                }
            }
        }

        info!(last_frame = ?self.last_frame, "aggregator stopped");
        Ok(())
    }

    /// Build the snapshot for one tick.
    async fn assemble(&mut self, tick: TickInfo) -> Result<Snapshot, ContractError> {
        let mut snapshot = Snapshot::empty(tick);

        for kind in SensorKind::ALL {
            let Some(expected) = self.config.offsets.expected_frame(tick.frame, kind) else {
                // Offset points before the first frame; nothing can match.
                snapshot.meta.missing_kinds.push(kind);
                continue;
            };

            match self.take_reading(kind, expected, &mut snapshot).await? {
                Some(reading) => snapshot.set_reading(reading),
                None => snapshot.meta.missing_kinds.push(kind),
            }
        }

        debug!(
            frame = snapshot.frame,
            missing = ?snapshot.meta.missing_kinds,
            drops = snapshot.meta.mismatch_drops,
            "snapshot assembled"
        );
        Ok(snapshot)
    }

    /// Fetch the reading of `kind` whose frame equals `expected`.
    ///
    /// Stale readings are dropped with a mismatch diagnostic; a reading from
    /// a future frame is parked in the pending slot and `None` is returned.
    /// Kinds without a live producer are only polled.
    async fn take_reading(
        &mut self,
        kind: SensorKind,
        expected: FrameId,
        snapshot: &mut Snapshot,
    ) -> Result<Option<SensorReading>, ContractError> {
        if let Some(parked) = self.pending[slot(kind)].take() {
            if parked.frame == expected {
                return Ok(Some(parked));
            }
            if parked.frame > expected {
                self.pending[slot(kind)] = Some(parked);
                return Ok(None);
            }
            self.drop_stale(&parked, expected, snapshot);
        }

        let live = self.config.live_kinds.contains(&kind);
        loop {
            let reading = if live {
                match tokio::time::timeout(self.config.dequeue_timeout, self.receiver(kind).recv())
                    .await
                {
                    Err(_) => return Ok(None),
                    Ok(Err(_)) => {
                        return Err(ContractError::ChannelClosed {
                            channel: kind.as_str(),
                        })
                    }
                    Ok(Ok(reading)) => reading,
                }
            } else {
                match self.receiver(kind).try_recv() {
                    Ok(reading) => reading,
                    Err(async_channel::TryRecvError::Empty) => return Ok(None),
                    Err(async_channel::TryRecvError::Closed) => {
                        return Err(ContractError::ChannelClosed {
                            channel: kind.as_str(),
                        })
                    }
                }
            };

            if reading.frame == expected {
                return Ok(Some(reading));
            }
            if reading.frame > expected {
                self.pending[slot(kind)] = Some(reading);
                return Ok(None);
            }
            self.drop_stale(&reading, expected, snapshot);
        }
    }

    fn drop_stale(&self, reading: &SensorReading, expected: FrameId, snapshot: &mut Snapshot) {
        let diag = ContractError::FrameMismatch {
            sensor_id: reading.sensor_id.to_string(),
            kind: reading.kind,
            expected,
            got: reading.frame,
        };
        warn!(error = %diag, "dropping stale reading");
        snapshot.meta.mismatch_drops += 1;
        metrics::counter!("carla_viz_frame_mismatch_drops_total", "kind" => reading.kind.as_str())
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{Kinematics, ReadingPayload};

    fn reading(kind: SensorKind, frame: FrameId) -> SensorReading {
        let payload = match kind {
            SensorKind::Kinematic => ReadingPayload::Kinematic(Kinematics {
                acceleration: 0.5,
                velocity: frame as f64,
            }),
            _ => ReadingPayload::Raw(Bytes::new()),
        };
        SensorReading {
            frame,
            sensor_id: format!("{kind}/1").as_str().into(),
            kind,
            timestamp: frame as f64 * 0.05,
            payload,
        }
    }

    fn tick(frame: FrameId) -> TickInfo {
        TickInfo {
            frame,
            timestamp: frame as f64 * 0.05,
            elapsed: frame.saturating_sub(1) as f64 * 0.05,
        }
    }

    fn aggregator(live_kinds: Vec<SensorKind>) -> (SensorQueues, Aggregator, mpsc::Receiver<Snapshot>) {
        let queues = SensorQueues::new();
        let (out_tx, out_rx) = mpsc::channel(16);
        let agg = Aggregator::new(
            &queues,
            out_tx,
            AggregatorConfig {
                dequeue_timeout: Duration::from_millis(50),
                live_kinds,
                ..Default::default()
            },
        );
        (queues, agg, out_rx)
    }

    #[tokio::test]
    async fn test_offsets_pair_image_with_previous_frame() {
        let (queues, mut agg, _out) = aggregator(SensorKind::ALL.to_vec());

        for (kind, frame) in [
            (SensorKind::Inertial, 10),
            (SensorKind::Image, 9),
            (SensorKind::Kinematic, 10),
        ] {
            queues.reading_sender(kind).send(reading(kind, frame)).await.unwrap();
        }

        let snap = agg.assemble(tick(10)).await.unwrap();
        assert_eq!(snap.frame, 10);
        assert_eq!(snap.inertial.as_ref().unwrap().frame, 10);
        assert_eq!(snap.image.as_ref().unwrap().frame, 9);
        assert_eq!(snap.kinematics.unwrap().velocity, 10.0);
        assert!(snap.meta.missing_kinds.is_empty());
        assert_eq!(snap.meta.mismatch_drops, 0);

        // Next tick consumes the next image in sequence
        for (kind, frame) in [
            (SensorKind::Inertial, 11),
            (SensorKind::Image, 10),
            (SensorKind::Kinematic, 11),
        ] {
            queues.reading_sender(kind).send(reading(kind, frame)).await.unwrap();
        }

        let snap = agg.assemble(tick(11)).await.unwrap();
        assert_eq!(snap.image.as_ref().unwrap().frame, 10);
        assert!(snap.meta.missing_kinds.is_empty());
    }

    #[tokio::test]
    async fn test_stale_readings_are_dropped_and_counted() {
        let (queues, mut agg, _out) = aggregator(vec![SensorKind::Inertial]);

        for frame in [8, 9, 10] {
            queues
                .reading_sender(SensorKind::Inertial)
                .send(reading(SensorKind::Inertial, frame))
                .await
                .unwrap();
        }

        let snap = agg.assemble(tick(10)).await.unwrap();
        assert_eq!(snap.inertial.as_ref().unwrap().frame, 10);
        assert_eq!(snap.meta.mismatch_drops, 2);
    }

    #[tokio::test]
    async fn test_absent_kinds_do_not_block() {
        // Only the IMU produces; image and kinematics must not be waited on
        let (queues, mut agg, _out) = aggregator(vec![SensorKind::Inertial]);
        queues
            .reading_sender(SensorKind::Inertial)
            .send(reading(SensorKind::Inertial, 5))
            .await
            .unwrap();

        let snap = agg.assemble(tick(5)).await.unwrap();
        assert!(snap.has(SensorKind::Inertial));
        assert_eq!(
            snap.meta.missing_kinds,
            vec![SensorKind::Image, SensorKind::Kinematic]
        );
    }

    #[tokio::test]
    async fn test_frame_zero_has_no_image_expectation() {
        let (_queues, mut agg, _out) = aggregator(vec![]);

        let snap = agg.assemble(tick(0)).await.unwrap();
        assert!(snap.meta.missing_kinds.contains(&SensorKind::Image));
        assert!(!snap.has(SensorKind::Image));
    }

    #[tokio::test]
    async fn test_early_reading_is_parked_for_next_frame() {
        let (queues, mut agg, _out) = aggregator(vec![SensorKind::Image]);

        // Image for frame 10 shows up while assembling frame 10 (expects 9)
        queues
            .reading_sender(SensorKind::Image)
            .send(reading(SensorKind::Image, 10))
            .await
            .unwrap();

        let snap = agg.assemble(tick(10)).await.unwrap();
        assert!(!snap.has(SensorKind::Image));
        assert_eq!(snap.meta.missing_kinds, vec![SensorKind::Inertial, SensorKind::Image, SensorKind::Kinematic]);

        // Frame 11 expects image 10: served from the pending slot
        let snap = agg.assemble(tick(11)).await.unwrap();
        assert_eq!(snap.image.as_ref().unwrap().frame, 10);
    }

    #[tokio::test]
    async fn test_run_emits_snapshots_until_stopped() {
        let (queues, agg, mut out_rx) = aggregator(vec![SensorKind::Inertial]);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(agg.run(stop_rx));

        for frame in 1..=3 {
            queues
                .reading_sender(SensorKind::Inertial)
                .send(reading(SensorKind::Inertial, frame))
                .await
                .unwrap();
            queues.control_sender().send(tick(frame)).await.unwrap();
        }

        for frame in 1..=3 {
            let snap = out_rx.recv().await.unwrap();
            assert_eq!(snap.frame, frame);
            assert!(snap.has(SensorKind::Inertial));
        }

        stop_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_closed_control_channel_is_fatal() {
        let (queues, agg, _out) = aggregator(vec![]);
        let (_stop_tx, stop_rx) = watch::channel(false);

        queues.control_receiver().close();

        let err = agg.run(stop_rx).await.unwrap_err();
        assert!(matches!(err, ContractError::ChannelClosed { channel: "control" }));
    }
}
