//! Value types shared across the telemetry core.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// One reading from the backend, produced once per successful fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample {
    pub current: f64,
    pub voltage: f64,
    pub power: f64,
}

impl PowerSample {
    pub fn new(current: f64, voltage: f64, power: f64) -> Self {
        Self { current, voltage, power }
    }

    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Current => self.current,
            Channel::Voltage => self.voltage,
            Channel::Power => self.power,
        }
    }
}

/// Measured quantity a history series belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Current,
    Voltage,
    Power,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Current, Channel::Voltage, Channel::Power];

    /// Key of this channel in the backend's telemetry object.
    pub fn field_name(&self) -> &'static str {
        match self {
            Channel::Current => "current_A",
            Channel::Voltage => "voltage_V",
            Channel::Power => "power_W",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Current => write!(f, "Current"),
            Channel::Voltage => write!(f, "Voltage"),
            Channel::Power => write!(f, "Power"),
        }
    }
}

/// Polling cadence selected by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyMode {
    /// Slow cadence, one reading per minute by default.
    High,
    /// Fast cadence, one reading every few seconds by default.
    Low,
}

impl LatencyMode {
    /// Poll interval for this mode under the given configuration.
    pub fn interval(&self, high: Duration, low: Duration) -> Duration {
        match self {
            LatencyMode::High => high,
            LatencyMode::Low => low,
        }
    }
}

impl std::fmt::Display for LatencyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LatencyMode::High => write!(f, "High"),
            LatencyMode::Low => write!(f, "Low"),
        }
    }
}

/// Source of sample indices shared by the three channels.
///
/// Cloning shares the underlying counter. Indices start at 1 and are never reused.
#[derive(Debug, Clone, Default)]
pub struct SampleCounter(Arc<AtomicU64>);

impl SampleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next index.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last index handed out, 0 if none.
    pub fn last(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
