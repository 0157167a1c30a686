//! Backend access: telemetry fetches and the power-limit command.
//!
//! The poller and the power-limit controller both talk to the backend through
//! [`TelemetryBackend`]; they share no mutable state with each other.

pub mod client;
pub mod command;
pub mod limit;

pub use client::{BackendClient, DEFAULT_TIMEOUT, TelemetryBackend};
pub use command::PowerLimitCommand;
pub use limit::{CommitHandle, LIMIT_FAILED_TEXT, PowerLimitController, preview_text};
