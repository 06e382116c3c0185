//! Orchestration layer.
//!
//! Turns decimated scans into checkpointed poses.
//!
//! # Contents
//!
//! - [`accumulator`]: per-scan state machine and trajectory
//! - [`reanchor`]: loop anchors and nearest-anchor search
//! - [`retry`]: registration with optional review and perturbation
//! - [`review`]: human-review capability and console implementation
//! - [`generator`]: sensor log driver with decimation and failure policy
//! - [`error`]: pipeline error kinds

pub mod accumulator;
pub mod error;
pub mod generator;
pub mod reanchor;
pub mod retry;
pub mod review;

pub use accumulator::{
    AccumulatorState, OdometryAccumulator, PoseSource, Scan, ScanOutcome, TrajectoryState,
};
pub use error::{ErrorKind, PipelineError};
pub use generator::{DatasetGenerator, FailurePolicy, GenerationSummary, LoopSignal, PolicyConfig};
pub use reanchor::{LoopAnchorSet, ReanchorMode, ReanchorOutcome, reanchor};
pub use retry::{DEFAULT_PERTURBATION_RAD, RegistrationRetryLoop};
pub use review::{
    ConsoleReviewer, ReviewError, ReviewPort, ReviewRequest, ReviewVerdict, ScriptedReviewer,
};
