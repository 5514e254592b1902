//! Per-kind sensor queues and the tick control channel.

use contracts::{SensorKind, SensorReading, TickInfo};

/// Channel bundle connecting clock, sensor callbacks, and aggregator.
///
/// One control channel carrying tick notifications and one unbounded reading
/// channel per sensor kind. Senders are cheap clones; the aggregator holds
/// the only receivers that matter.
pub struct SensorQueues {
    control_tx: async_channel::Sender<TickInfo>,
    control_rx: async_channel::Receiver<TickInfo>,
    inertial: ReadingChannel,
    image: ReadingChannel,
    kinematic: ReadingChannel,
}

struct ReadingChannel {
    tx: async_channel::Sender<SensorReading>,
    rx: async_channel::Receiver<SensorReading>,
}

impl ReadingChannel {
    fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self { tx, rx }
    }
}

impl SensorQueues {
    pub fn new() -> Self {
        let (control_tx, control_rx) = async_channel::unbounded();
        Self {
            control_tx,
            control_rx,
            inertial: ReadingChannel::new(),
            image: ReadingChannel::new(),
            kinematic: ReadingChannel::new(),
        }
    }

    fn channel(&self, kind: SensorKind) -> &ReadingChannel {
        match kind {
            SensorKind::Inertial => &self.inertial,
            SensorKind::Image => &self.image,
            SensorKind::Kinematic => &self.kinematic,
        }
    }

    pub fn control_sender(&self) -> async_channel::Sender<TickInfo> {
        self.control_tx.clone()
    }

    pub fn control_receiver(&self) -> async_channel::Receiver<TickInfo> {
        self.control_rx.clone()
    }

    pub fn reading_sender(&self, kind: SensorKind) -> async_channel::Sender<SensorReading> {
        self.channel(kind).tx.clone()
    }

    pub fn reading_receiver(&self, kind: SensorKind) -> async_channel::Receiver<SensorReading> {
        self.channel(kind).rx.clone()
    }
}

impl Default for SensorQueues {
    fn default() -> Self {
        Self::new()
    }
}
