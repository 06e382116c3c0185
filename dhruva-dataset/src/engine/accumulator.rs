//! Per-scan odometry accumulation.
//!
//! Turns the stream of decimated scans into a trajectory of corrected
//! poses. Each scan is registered against a reference cloud, the refined
//! relative transform is composed onto a base pose, and the result is
//! checkpointed.
//!
//! # State Machine
//!
//! ```text
//!                    first scan
//!  AwaitingFirstScan ──────────► SteadyState ◄─────────────────┐
//!                                   │   │                      │
//!               mark_loop_start()   │   │  mark_loop_end()     │ anchor
//!                                   ▼   ▼                      │ match
//!              ReanchorToLoopStart     ReanchorToLoopEnd ──────┤
//!                       │                                      │
//!                       └──────────────────────────────────────┘
//! ```
//!
//! In `SteadyState` the initial guess is the raw sensor delta since the
//! previous scan and the reference is the previous scan's cloud. In the
//! reanchor states the guess and reference come from
//! [`reanchor`](super::reanchor::reanchor).
//!
//! Poses and deltas share the global frame, while clouds are in the sensor
//! frame. The guess is rotated into the reference scan's sensor axes before
//! it reaches the engine and the refined transform is rotated back.
//!
//! A scan either commits completely (trajectory updated, checkpoint
//! written) or not at all.

use nalgebra::Vector3;

use crate::core::types::{OdometryRecord, PointCloud3D, RigidTransform};
use crate::io::checkpoint::CheckpointStore;
use crate::io::cloud_store::CloudStore;

use super::error::{PipelineError, Result};
use super::reanchor::{LoopAnchorSet, ReanchorMode, reanchor};
use super::retry::RegistrationRetryLoop;

/// Initial-guess strategy for the next scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulatorState {
    /// No scan committed yet.
    #[default]
    AwaitingFirstScan,
    /// Chain onto the previous scan.
    SteadyState,
    /// Snap to the nearest first-loop anchor, loop-start flavour.
    ReanchorToLoopStart,
    /// Snap to the nearest first-loop anchor, loop-end flavour.
    ReanchorToLoopEnd,
}

/// One decimated scan.
#[derive(Debug, Clone)]
pub struct Scan {
    pub index: usize,
    pub cloud: PointCloud3D,
    /// Raw sensor pose at capture time.
    pub raw_pose: RigidTransform,
}

/// Running trajectory estimate.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryState {
    /// Best estimate of the latest scan's global pose.
    pub last_corrected_pose: RigidTransform,
    /// Raw sensor pose at the latest scan.
    pub last_raw_pose: RigidTransform,
    /// Latest scan's cloud, the default registration reference.
    pub last_cloud: Option<PointCloud3D>,
    /// Latest committed scan index.
    pub last_index: Option<usize>,
    /// Rotation from corrected orientations to raw sensor orientations,
    /// fixed by the first scan of the run.
    pub sensor_alignment: RigidTransform,
}

impl TrajectoryState {
    /// Sensor axes of a scan whose corrected pose is `pose`.
    fn sensor_frame(&self, pose: &RigidTransform) -> RigidTransform {
        RigidTransform::new(
            pose.rotation() * self.sensor_alignment.rotation(),
            Vector3::zeros(),
        )
    }
}

/// How a scan's pose was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseSource {
    /// First scan of the trajectory.
    Identity,
    /// Read back from an existing checkpoint.
    Loaded,
    /// Registered against the previous scan (or a placeholder anchor).
    Registered,
    /// Registered against the nearest loop anchor.
    Reanchored,
}

/// Result of processing one scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanOutcome {
    pub index: usize,
    pub pose: RigidTransform,
    pub source: PoseSource,
}

/// The per-scan orchestrator.
pub struct OdometryAccumulator {
    state: AccumulatorState,
    trajectory: TrajectoryState,
    anchors: LoopAnchorSet,
    is_first_loop: bool,
    loop_scan_count: usize,
    review_required: bool,
    retry: RegistrationRetryLoop,
    checkpoints: Box<dyn CheckpointStore>,
    clouds: Box<dyn CloudStore>,
}

impl OdometryAccumulator {
    pub fn new(
        retry: RegistrationRetryLoop,
        checkpoints: Box<dyn CheckpointStore>,
        clouds: Box<dyn CloudStore>,
    ) -> Self {
        Self {
            state: AccumulatorState::AwaitingFirstScan,
            trajectory: TrajectoryState::default(),
            anchors: LoopAnchorSet::new(),
            is_first_loop: true,
            loop_scan_count: 0,
            review_required: false,
            retry,
            checkpoints,
            clouds,
        }
    }

    /// Ask the reviewer about every registration.
    pub fn with_review_required(mut self, required: bool) -> Self {
        self.review_required = required;
        self
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    pub fn trajectory(&self) -> &TrajectoryState {
        &self.trajectory
    }

    pub fn anchors(&self) -> &LoopAnchorSet {
        &self.anchors
    }

    pub fn is_first_loop(&self) -> bool {
        self.is_first_loop
    }

    /// Scans committed since the last loop signal.
    pub fn loop_scan_count(&self) -> usize {
        self.loop_scan_count
    }

    pub fn engine_calls(&self) -> usize {
        self.retry.engine_calls()
    }

    /// The robot is back at the loop start.
    ///
    /// Ends the first loop and resets the corrected pose to the loop-start
    /// frame (scan 0's identity pose).
    pub fn mark_loop_start(&mut self) {
        log::info!("Loop start marked after {} scans", self.loop_scan_count);
        self.end_first_loop();
        self.trajectory.last_corrected_pose = RigidTransform::identity();
        self.state = AccumulatorState::ReanchorToLoopStart;
    }

    /// The robot is back at the loop end.
    pub fn mark_loop_end(&mut self) {
        log::info!("Loop end marked after {} scans", self.loop_scan_count);
        self.end_first_loop();
        self.state = AccumulatorState::ReanchorToLoopEnd;
    }

    fn end_first_loop(&mut self) {
        self.loop_scan_count = 0;
        if self.is_first_loop {
            self.is_first_loop = false;
            self.anchors.freeze();
            log::info!("First loop closed with {} anchors", self.anchors.len());
        }
    }

    /// Store a cloud without computing odometry for it.
    pub fn archive_cloud(&mut self, index: usize, cloud: &PointCloud3D) -> Result<()> {
        self.clouds.save_cloud(index, cloud)?;
        Ok(())
    }

    /// Process one scan.
    pub fn process_scan(&mut self, scan: &Scan) -> Result<ScanOutcome> {
        log::info!("===== Processing cloud {}", scan.index);
        // The pose can still be computed without the stored cloud.
        if let Err(e) = self.clouds.save_cloud(scan.index, &scan.cloud) {
            log::error!("Failed to store cloud {}: {}", scan.index, e);
        }

        let mut anchor_matched = false;
        let (pose, source) = if let Some(pose) = self.load_checkpoint(scan.index) {
            log::info!("Loaded odometry for scan {} from checkpoint", scan.index);
            (pose, PoseSource::Loaded)
        } else if self.trajectory.last_index.is_none() {
            if scan.index != 0 {
                return Err(PipelineError::PreconditionViolation(format!(
                    "scan {} is the first scan of this run but has no checkpoint",
                    scan.index
                )));
            }
            let pose = RigidTransform::identity();
            self.checkpoints.save(scan.index, &pose)?;
            (pose, PoseSource::Identity)
        } else {
            let (pose, matched) = self.register(scan)?;
            self.checkpoints.save(scan.index, &pose)?;
            anchor_matched = matched;
            let source = if matched {
                PoseSource::Reanchored
            } else {
                PoseSource::Registered
            };
            (pose, source)
        };

        self.commit(scan, pose, anchor_matched);
        log_pose(&pose);

        Ok(ScanOutcome {
            index: scan.index,
            pose,
            source,
        })
    }

    /// Stored pose for `index`, if there is a readable one.
    ///
    /// An unreadable record is logged and left on disk; the pose is then
    /// recomputed.
    fn load_checkpoint(&self, index: usize) -> Option<RigidTransform> {
        if !self.checkpoints.has(index) {
            return None;
        }
        match self.checkpoints.load(index) {
            Ok(record) => Some(record.to_transform()),
            Err(e) => {
                log::warn!("Ignoring odometry record for scan {}: {}", index, e);
                None
            }
        }
    }

    /// Compute the corrected pose for `scan` without mutating any state.
    ///
    /// Returns the pose and whether a loop anchor match fired.
    fn register(&mut self, scan: &Scan) -> Result<(RigidTransform, bool)> {
        let raw_delta = self.trajectory.last_raw_pose.difference(&scan.raw_pose);

        let mode = match self.state {
            AccumulatorState::ReanchorToLoopStart => Some(ReanchorMode::LoopStart),
            AccumulatorState::ReanchorToLoopEnd => Some(ReanchorMode::LoopEnd),
            AccumulatorState::AwaitingFirstScan | AccumulatorState::SteadyState => None,
        };

        let (base, guess, reference, matched) = match mode {
            Some(mode) => {
                let outcome = reanchor(
                    &self.trajectory.last_corrected_pose,
                    self.loop_scan_count,
                    &raw_delta,
                    &self.anchors,
                    mode,
                )?;
                let reference = self.clouds.load_cloud(outcome.reference_index)?;
                (
                    outcome.base_pose,
                    outcome.initial_guess,
                    reference,
                    outcome.matched(),
                )
            }
            None => {
                let reference = self.trajectory.last_cloud.clone().ok_or_else(|| {
                    PipelineError::PreconditionViolation(format!(
                        "no reference cloud for scan {}",
                        scan.index
                    ))
                })?;
                (self.trajectory.last_corrected_pose, raw_delta, reference, false)
            }
        };

        let frame = self.trajectory.sensor_frame(&base);
        let refined = self.retry.refine(
            scan.index,
            &reference,
            &scan.cloud,
            &guess.in_frame_of(&frame),
            self.review_required,
        )?;
        Ok((base.compose(&refined.from_frame_of(&frame)), matched))
    }

    fn commit(&mut self, scan: &Scan, pose: RigidTransform, anchor_matched: bool) {
        if self.trajectory.last_index.is_none() {
            self.trajectory.sensor_alignment = RigidTransform::new(
                pose.rotation().inverse() * scan.raw_pose.rotation(),
                Vector3::zeros(),
            );
        }
        self.trajectory.last_corrected_pose = pose;
        self.trajectory.last_raw_pose = scan.raw_pose;
        self.trajectory.last_cloud = Some(scan.cloud.clone());
        self.trajectory.last_index = Some(scan.index);

        if self.is_first_loop {
            self.anchors.capture(scan.index, pose);
        }

        let reanchoring = matches!(
            self.state,
            AccumulatorState::ReanchorToLoopStart | AccumulatorState::ReanchorToLoopEnd
        );
        // A loaded pose in a pending reanchor stands in for the match.
        let consumed = anchor_matched || (reanchoring && self.loop_scan_count > 0);
        if self.state == AccumulatorState::AwaitingFirstScan || consumed {
            self.state = AccumulatorState::SteadyState;
        }
        self.loop_scan_count += 1;
    }
}

/// Log a corrected pose with its distance from the origin.
pub fn log_pose(pose: &RigidTransform) {
    let record = OdometryRecord::from_transform(pose);
    log::info!(
        "Odometry (x,y,z,r,p,y): {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} = {:.3} m",
        record.x,
        record.y,
        record.z,
        record.roll,
        record.pitch,
        record.yaw,
        record.translation_norm()
    );
}
