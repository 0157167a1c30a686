//! Error taxonomy for the telemetry core.

use thiserror::Error;

/// Failure to pull a numeric field out of a response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("field not found in payload: {0}")]
    FieldNotFound(String),
    #[error("malformed payload near field: {0}")]
    MalformedPayload(String),
    #[error("invalid number for {field}: {raw:?}")]
    InvalidNumber { field: String, raw: String },
}

/// Fetch-level failure of a backend call.
///
/// Extraction and status failures are folded in here so a tick has exactly one
/// error path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("backend returned {status}: {body}")]
    BackendStatus { status: u16, body: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Payload(#[from] ParseError),
}

/// Coarse classification handed to observers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FieldNotFound,
    MalformedPayload,
    InvalidNumber,
    BackendStatus,
    Timeout,
    Transport,
}

impl NetworkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetworkError::BackendStatus { .. } => ErrorKind::BackendStatus,
            NetworkError::Timeout(_) => ErrorKind::Timeout,
            NetworkError::Transport(_) => ErrorKind::Transport,
            NetworkError::Payload(ParseError::FieldNotFound(_)) => ErrorKind::FieldNotFound,
            NetworkError::Payload(ParseError::MalformedPayload(_)) => ErrorKind::MalformedPayload,
            NetworkError::Payload(ParseError::InvalidNumber { .. }) => ErrorKind::InvalidNumber,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::FieldNotFound => write!(f, "field not found"),
            ErrorKind::MalformedPayload => write!(f, "malformed payload"),
            ErrorKind::InvalidNumber => write!(f, "invalid number"),
            ErrorKind::BackendStatus => write!(f, "backend status"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Transport => write!(f, "transport"),
        }
    }
}

/// Misuse of the poller state machine. These are programming errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollerError {
    #[error("poller is already running")]
    AlreadyRunning,
    #[error("poller was stopped and cannot be restarted")]
    AlreadyStopped,
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
    #[error("failed to spawn poller thread: {0}")]
    Spawn(String),
}

/// Failure to apply a power limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitApplyError {
    #[error("power limit {percent}% outside allowed range {min}..={max}")]
    OutOfBounds { percent: i32, min: i32, max: i32 },
    #[error("failed to apply power limit: {0}")]
    Network(#[from] NetworkError),
    #[error("power limit request did not complete: {0}")]
    Dispatch(String),
}
