//! FrameClock - world-tick pacing
//!
//! Runs on a dedicated blocking thread (`spawn_blocking` from the
//! orchestrator) because `WorldClient::wait_for_tick` blocks. Each tick it
//! publishes exactly one `TickInfo` on the control channel and, when the ego
//! exists, one derived kinematic reading.

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    ContractError, FrameId, Kinematics, ReadingPayload, SensorKind, SensorReading, TickInfo,
};
use sim_world::WorldClient;
use tokio::sync::watch;
use tracing::{error, info, trace, warn};

/// Sensor id used for readings derived from the ego tick state.
const EGO_SENSOR_ID: &str = "ego";

pub struct FrameClock<C: WorldClient> {
    world: Arc<C>,
    control_tx: async_channel::Sender<TickInfo>,
    kinematic_tx: async_channel::Sender<SensorReading>,
    tick_timeout: Duration,
    /// Simulation timestamp of the first observed tick
    start_time: Option<f64>,
    last_frame: Option<FrameId>,
}

impl<C: WorldClient> FrameClock<C> {
    pub fn new(
        world: Arc<C>,
        control_tx: async_channel::Sender<TickInfo>,
        kinematic_tx: async_channel::Sender<SensorReading>,
        tick_timeout: Duration,
    ) -> Self {
        Self {
            world,
            control_tx,
            kinematic_tx,
            tick_timeout,
            start_time: None,
            last_frame: None,
        }
    }

    /// Block until the next new frame and publish it.
    ///
    /// The first tick fixes the run's time origin; `elapsed` is measured
    /// from it. Duplicate or out-of-order frames from the world are waited
    /// past, never republished.
    pub fn advance(&mut self) -> Result<TickInfo, ContractError> {
        let tick = loop {
            let tick = self.world.wait_for_tick(self.tick_timeout)?;
            match self.last_frame {
                Some(last) if tick.frame <= last => {
                    trace!(frame = tick.frame, last, "duplicate world tick, waiting on");
                }
                _ => break tick,
            }
        };

        let start = *self.start_time.get_or_insert(tick.timestamp);
        let info = TickInfo {
            frame: tick.frame,
            timestamp: tick.timestamp,
            elapsed: tick.timestamp - start,
        };
        self.last_frame = Some(tick.frame);

        self.control_tx
            .send_blocking(info)
            .map_err(|_| ContractError::ChannelClosed { channel: "control" })?;

        if let Some(ego) = tick.ego {
            let reading = SensorReading {
                frame: tick.frame,
                sensor_id: EGO_SENSOR_ID.into(),
                kind: SensorKind::Kinematic,
                timestamp: tick.timestamp,
                payload: ReadingPayload::Kinematic(Kinematics {
                    acceleration: ego.acceleration.magnitude(),
                    velocity: ego.velocity.magnitude(),
                }),
            };
            self.kinematic_tx
                .send_blocking(reading)
                .map_err(|_| ContractError::ChannelClosed {
                    channel: "kinematic",
                })?;
        }

        metrics::counter!("carla_viz_ticks_total").increment(1);
        trace!(frame = info.frame, elapsed = info.elapsed, "tick published");
        Ok(info)
    }

    /// Clock loop: advance until stopped.
    ///
    /// Recoverable errors (tick timeouts) are logged and retried; anything
    /// else ends the run. Channel closures observed after the stop signal
    /// are part of normal shutdown.
    pub fn run(mut self, stop: watch::Receiver<bool>) -> Result<(), ContractError> {
        info!(timeout_ms = self.tick_timeout.as_millis() as u64, "frame clock started");

        while !*stop.borrow() {
            match self.advance() {
                Ok(_) => {}
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "clock hiccup, retrying");
                }
                Err(err) => {
                    if *stop.borrow() {
                        break;
                    }
                    error!(error = %err, "frame clock failed");
                    return Err(err);
                }
            }
        }

        info!(last_frame = ?self.last_frame, "frame clock stopped");
        Ok(())
    }
}
