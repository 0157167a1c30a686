//! Request payloads for the backend's control endpoints.

use serde::Serialize;

/// Body of `POST /control/power_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerLimitCommand {
    pub percent: i32,
}

impl PowerLimitCommand {
    pub fn new(percent: i32) -> Self {
        Self { percent }
    }
}
