//! Callback surface the core reports through.

use super::error::ErrorKind;
use super::types::PowerSample;

/// Receiver of core updates.
///
/// Methods are invoked on whatever thread produced the update: the poller thread for
/// samples and errors, a short-lived worker thread for power-limit results. Implementors
/// that drive a UI must hand the update off to their own loop.
pub trait TelemetryObserver: Send + Sync {
    fn on_sample(&self, sample: &PowerSample, index: u64);

    /// A tick failed. The readout should fall back to its blank placeholder.
    fn on_error(&self, kind: ErrorKind, message: &str);

    fn on_limit_applied(&self, text: &str);

    fn on_limit_failed(&self, text: &str);
}
