//! DhruvaDataset - Loop-closed odometry dataset generator
//!
//! Reads a recorded log of raw sensor poses and point clouds and produces a
//! labeled dataset: one stored cloud and one corrected 6-DOF pose per kept
//! scan. Drift is removed at loop crossings by snapping back onto poses
//! captured during the first traversal. Runs are resumable: every committed
//! scan leaves a write-once odometry record that later runs load instead of
//! recomputing.
//!
//! # Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 bin/  +  config/                    │  ← Executables
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │   (accumulator, reanchor, retry, review, generator) │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Infrastructure
//! │          (bag, checkpoint, cloud_store, ply)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Core algorithms
//! │                   (matching)                        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Sensor processing
//! │                  (decimation)                       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                (types, math)                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Pose Conventions
//!
//! Poses are [`RigidTransform`]s composed in the global frame:
//! `compose(base, inc)` adds translations and left-multiplies the rotation,
//! and `difference(start, end)` is its inverse so that
//! `compose(start, difference(start, end)) == end`. Euler angles follow
//! `R = Rz(yaw)·Ry(pitch)·Rx(roll)`.
//!
//! # Output Layout
//!
//! ```text
//! <output>/scan_0000.cloud        stored point cloud (postcard)
//! <output>/scan_0000_info.dat     "Odometry: x y z roll pitch yaw"
//! <output>/scan_0001_merged.ply   reference + registered cloud (review)
//! ```

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Sensor processing (depends on core)
// ============================================================================
pub mod sensors;

// ============================================================================
// Layer 3: Algorithms (depends on core)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Layer 4: I/O infrastructure (depends on core)
// ============================================================================
pub mod io;

// ============================================================================
// Layer 5: Orchestration and configuration (depends on all layers)
// ============================================================================
pub mod config;
pub mod engine;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use core::math;
pub use core::types::{OdometryRecord, Point3D, PointCloud3D, RigidTransform, Stamped};
pub use core::types::{compose, decompose, difference, positional_distance};

// Sensors
pub use sensors::Decimator;

// Algorithms - Matching
pub use algorithms::matching::{
    IcpConfig, PassthroughEngine, PointToPointIcp, RegistrationEngine, RegistrationError,
};

// I/O
pub use io::bag::{BagHeader, BagInfo, BagMessage, BagPlayer, BagRecorder, PoseSample};
pub use io::{
    CheckpointStore, CloudStore, FileCheckpointStore, FileCloudStore, MemoryCheckpointStore,
    MemoryCloudStore, MergedCloudWriter,
};

// Configuration
pub use config::{ConfigLoadError, DatasetConfig};

// Engine
pub use engine::{
    AccumulatorState, ConsoleReviewer, DatasetGenerator, FailurePolicy, GenerationSummary,
    LoopAnchorSet, LoopSignal, OdometryAccumulator, PipelineError, PolicyConfig, PoseSource,
    RegistrationRetryLoop, ReviewPort, ReviewVerdict, Scan, ScanOutcome, ScriptedReviewer,
};
