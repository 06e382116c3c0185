//! Pipeline error kinds.
//!
//! Every lower-layer error folds into one of three kinds. The driver's
//! failure policy is chosen per kind.

use thiserror::Error;

use crate::config::ConfigLoadError;
use crate::io::bag::PlayerError;
use crate::io::checkpoint::CheckpointError;
use crate::io::cloud_store::CloudStoreError;

/// Error raised while processing a scan.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required state or input is missing (no anchors, no prior record, ...).
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// The registration engine (or its review loop) failed for a scan.
    #[error("registration failed for scan {scan_index}: {reason}")]
    RegistrationFailure { scan_index: usize, reason: String },

    /// Reading or writing persisted data failed.
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

/// The three failure classes, for policy lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Registration,
    Storage,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::PreconditionViolation(_) => ErrorKind::Precondition,
            PipelineError::RegistrationFailure { .. } => ErrorKind::Registration,
            PipelineError::StorageFailure(_) => ErrorKind::Storage,
        }
    }

    pub fn registration(scan_index: usize, err: impl std::fmt::Display) -> Self {
        PipelineError::RegistrationFailure {
            scan_index,
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<CheckpointError> for PipelineError {
    fn from(e: CheckpointError) -> Self {
        match e {
            CheckpointError::NotFound(_) => PipelineError::PreconditionViolation(e.to_string()),
            _ => PipelineError::StorageFailure(e.to_string()),
        }
    }
}

impl From<CloudStoreError> for PipelineError {
    fn from(e: CloudStoreError) -> Self {
        PipelineError::StorageFailure(e.to_string())
    }
}

impl From<PlayerError> for PipelineError {
    fn from(e: PlayerError) -> Self {
        PipelineError::StorageFailure(format!("sensor log: {}", e))
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(e: ConfigLoadError) -> Self {
        PipelineError::PreconditionViolation(e.to_string())
    }
}

impl From<std::convert::Infallible> for PipelineError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}
