use std::fmt;

use thiserror::Error;

pub type Generation = u64;

/// One reading of the backend progress endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSample {
    pub total: u64,
    pub processed: u64,
}

impl ProgressSample {
    pub fn new(total: u64, processed: u64) -> Self {
        Self { total, processed }
    }

    /// An unsized job (`total == 0`) is never complete.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.processed >= self.total
    }

    /// Folds a fresh reading into the last known one. Unsized readings are
    /// dropped and `processed` never decreases.
    pub fn absorb(&self, reading: ProgressSample) -> ProgressSample {
        if reading.total == 0 {
            return *self;
        }
        ProgressSample {
            total: reading.total,
            processed: self.processed.max(reading.processed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SubmissionAccepted {
        generation: Generation,
    },
    SubmissionFailed {
        generation: Generation,
        error: JobError,
    },
    Sample {
        generation: Generation,
        sample: ProgressSample,
    },
    /// Sent once per job, after the final `Sample`.
    Completed {
        generation: Generation,
        sample: ProgressSample,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("Failed to start report: {0}")]
    SubmissionFailed(ApiError),
    #[error("progress read failed: {0}")]
    PollReadFailed(ApiError),
}

#[derive(Debug, Error)]
#[error("failed to start engine runtime: {0}")]
pub struct EngineStartError(#[from] std::io::Error);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
