//! Telemetry polling core.
//!
//! Provides:
//! - Minimal field extraction from the backend's telemetry body
//! - Bounded per-channel history with aligned sample indices
//! - A single-threaded, non-overlapping poller with blocking `stop()`
//! - Poll sessions tying a device and latency mode to one poller
//!
//! Updates leave the core only through [`TelemetryObserver`], on the poller's thread.

pub mod clock;
pub mod error;
pub mod extract;
pub mod observer;
pub mod poller;
pub mod series;
pub mod session;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::{ErrorKind, LimitApplyError, NetworkError, ParseError, PollerError};
pub use observer::TelemetryObserver;
pub use poller::{PollerStatus, TelemetryPoller};
pub use series::{ChannelHistory, DEFAULT_SERIES_CAPACITY, RollingSeries, SharedHistory};
pub use session::{PollSession, SessionContext};
pub use types::{Channel, LatencyMode, PowerSample, SampleCounter};
