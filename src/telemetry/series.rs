//! Bounded per-channel history for charting.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::types::{Channel, PowerSample};

/// Default number of points kept per channel.
pub const DEFAULT_SERIES_CAPACITY: usize = 300;

/// Fixed-capacity FIFO of `(index, value)` points.
#[derive(Debug, Clone)]
pub struct RollingSeries {
    capacity: usize,
    points: VecDeque<(u64, f64)>,
}

impl RollingSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a point, evicting the oldest one once capacity is exceeded.
    pub fn append(&mut self, index: u64, value: f64) {
        self.points.push_back((index, value));
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Owned copy of the points in insertion order.
    pub fn snapshot(&self) -> Vec<(u64, f64)> {
        self.points.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<(u64, f64)> {
        self.points.back().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The three channel series of one session, appended together.
#[derive(Debug, Clone)]
pub struct ChannelHistory {
    current: RollingSeries,
    voltage: RollingSeries,
    power: RollingSeries,
}

impl ChannelHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            current: RollingSeries::new(capacity),
            voltage: RollingSeries::new(capacity),
            power: RollingSeries::new(capacity),
        }
    }

    pub fn push(&mut self, index: u64, sample: &PowerSample) {
        self.current.append(index, sample.current);
        self.voltage.append(index, sample.voltage);
        self.power.append(index, sample.power);
    }

    pub fn series(&self, channel: Channel) -> &RollingSeries {
        match channel {
            Channel::Current => &self.current,
            Channel::Voltage => &self.voltage,
            Channel::Power => &self.power,
        }
    }

    /// Last published sample, rebuilt from the tails of the three series.
    pub fn latest(&self) -> Option<(u64, PowerSample)> {
        let (index, current) = self.current.latest()?;
        let (_, voltage) = self.voltage.latest()?;
        let (_, power) = self.power.latest()?;
        Some((index, PowerSample::new(current, voltage, power)))
    }
}

/// History shared between a session's poller thread and its readers.
#[derive(Debug, Clone)]
pub struct SharedHistory(Arc<Mutex<ChannelHistory>>);

impl SharedHistory {
    pub fn new(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(ChannelHistory::new(capacity))))
    }

    /// Lock the history. A poisoned lock is recovered since every mutation is a
    /// single append that leaves the buffers consistent.
    pub fn lock(&self) -> MutexGuard<'_, ChannelHistory> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self, channel: Channel) -> Vec<(u64, f64)> {
        self.lock().series(channel).snapshot()
    }

    /// Snapshot of every channel in [`Channel::ALL`] order, taken under one lock so
    /// the series always end on the same index.
    pub fn snapshot_all(&self) -> [Vec<(u64, f64)>; 3] {
        let history = self.lock();
        Channel::ALL.map(|channel| history.series(channel).snapshot())
    }

    pub fn latest(&self) -> Option<(u64, PowerSample)> {
        self.lock().latest()
    }
}
