//! Dataset driver.
//!
//! Walks a sensor log in order, tracks the latest raw pose sample, decimates
//! point clouds, fires loop markers and hands each kept scan to the
//! [`OdometryAccumulator`]. Failures are routed through a [`PolicyConfig`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algorithms::matching::{PassthroughEngine, PointToPointIcp, RegistrationEngine};
use crate::config::{DatasetConfig, RegistrationMethod};
use crate::core::types::{PointCloud3D, RigidTransform};
use crate::io::bag::BagMessage;
use crate::io::checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use crate::io::cloud_store::{CloudStore, FileCloudStore, MemoryCloudStore};
use crate::io::ply::MergedCloudWriter;
use crate::sensors::Decimator;

use super::accumulator::{OdometryAccumulator, PoseSource, Scan};
use super::error::{ErrorKind, PipelineError, Result};
use super::retry::RegistrationRetryLoop;
use super::review::ReviewPort;

/// What to do when a scan fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and return the error.
    Abort,
    /// Log, leave the trajectory untouched and move on to the next scan.
    Skip,
}

/// Failure policy per error kind.
///
/// Precondition violations always abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub on_registration_failure: FailurePolicy,
    pub on_storage_failure: FailurePolicy,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            on_registration_failure: FailurePolicy::Skip,
            on_storage_failure: FailurePolicy::Abort,
        }
    }
}

impl PolicyConfig {
    pub fn for_kind(&self, kind: ErrorKind) -> FailurePolicy {
        match kind {
            ErrorKind::Precondition => FailurePolicy::Abort,
            ErrorKind::Registration => self.on_registration_failure,
            ErrorKind::Storage => self.on_storage_failure,
        }
    }
}

/// Loop-closure signal raised by the external controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopSignal {
    Start,
    End,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Point clouds read from the log, before decimation.
    pub clouds_seen: usize,
    /// Scans that committed (registered, loaded or archived).
    pub processed: usize,
    /// Scans whose pose came from an existing checkpoint.
    pub loaded: usize,
    /// Scan indices dropped under the skip policy.
    pub skipped: Vec<usize>,
    /// Registration engine invocations.
    pub registration_calls: usize,
}

/// Drives a whole log through the accumulator.
pub struct DatasetGenerator {
    accumulator: OdometryAccumulator,
    decimator: Decimator,
    policy: PolicyConfig,
    loop_markers: BTreeMap<usize, LoopSignal>,
    odometry_output: bool,
    latest_raw_pose: Option<RigidTransform>,
    summary: GenerationSummary,
}

impl DatasetGenerator {
    pub fn new(accumulator: OdometryAccumulator, keep_one_out_of: usize) -> Self {
        Self {
            accumulator,
            decimator: Decimator::new(keep_one_out_of),
            policy: PolicyConfig::default(),
            loop_markers: BTreeMap::new(),
            odometry_output: true,
            latest_raw_pose: None,
            summary: GenerationSummary::default(),
        }
    }

    /// Assemble a generator from configuration.
    ///
    /// With `dry_run` set, clouds and checkpoints are kept in memory and
    /// nothing is written to the output directory.
    pub fn from_config(
        config: &DatasetConfig,
        reviewer: Option<Box<dyn ReviewPort>>,
        dry_run: bool,
    ) -> Result<Self> {
        config.validate()?;

        let engine: Box<dyn RegistrationEngine> = match config.registration.method {
            RegistrationMethod::Icp => Box::new(
                PointToPointIcp::new(config.registration.to_icp_config())
                    .with_profile(config.registration.profile.clone()),
            ),
            RegistrationMethod::Passthrough => Box::new(PassthroughEngine),
        };
        log::info!(
            "Registration engine: {:?} (profile {})",
            config.registration.method,
            engine.profile()
        );

        let output = &config.output;
        let (checkpoints, clouds): (Box<dyn CheckpointStore>, Box<dyn CloudStore>) = if dry_run {
            log::info!("Dry run: results are kept in memory");
            (
                Box::new(MemoryCheckpointStore::new()),
                Box::new(MemoryCloudStore::new()),
            )
        } else {
            (
                Box::new(FileCheckpointStore::new(&output.directory, output.suffix_width)?),
                Box::new(FileCloudStore::new(&output.directory, output.suffix_width)?),
            )
        };

        let mut retry = RegistrationRetryLoop::new(engine)
            .with_perturbation(config.review.perturbation_rad);
        if !dry_run && (output.save_merged_clouds || config.review.required) {
            retry = retry.with_merged_writer(MergedCloudWriter::new(
                &output.directory,
                output.suffix_width,
            ));
        }
        if let Some(reviewer) = reviewer {
            retry = retry.with_reviewer(reviewer);
        }

        let accumulator = OdometryAccumulator::new(retry, checkpoints, clouds)
            .with_review_required(config.review.required);

        Ok(Self::new(accumulator, config.input.keep_one_out_of)
            .with_policy(config.policy)
            .with_odometry_output(config.input.odometry_output)
            .with_loop_markers(
                config
                    .loop_markers
                    .iter()
                    .map(|marker| (marker.scan_index, marker.kind)),
            ))
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Signals to raise just before the scan with the given index.
    pub fn with_loop_markers(mut self, markers: impl IntoIterator<Item = (usize, LoopSignal)>) -> Self {
        self.loop_markers.extend(markers);
        self
    }

    /// When false, clouds are stored but no poses are computed.
    pub fn with_odometry_output(mut self, enabled: bool) -> Self {
        self.odometry_output = enabled;
        self
    }

    pub fn accumulator(&self) -> &OdometryAccumulator {
        &self.accumulator
    }

    pub fn accumulator_mut(&mut self) -> &mut OdometryAccumulator {
        &mut self.accumulator
    }

    pub fn summary(&self) -> &GenerationSummary {
        &self.summary
    }

    /// Raise a loop signal immediately.
    pub fn signal(&mut self, signal: LoopSignal) {
        match signal {
            LoopSignal::Start => self.accumulator.mark_loop_start(),
            LoopSignal::End => self.accumulator.mark_loop_end(),
        }
    }

    /// Consume a sensor log.
    ///
    /// Errors from the log itself always abort; per-scan errors follow the
    /// policy.
    pub fn run<I, E>(&mut self, messages: I) -> Result<GenerationSummary>
    where
        I: IntoIterator<Item = std::result::Result<BagMessage, E>>,
        E: Into<PipelineError>,
    {
        for message in messages {
            match message.map_err(Into::into)? {
                BagMessage::PoseSample(sample) => {
                    self.latest_raw_pose = Some(sample.data.to_transform());
                }
                BagMessage::PointCloud(cloud) => {
                    self.summary.clouds_seen += 1;
                    if let Some(index) = self.decimator.offer() {
                        self.handle_scan(index, cloud.data)?;
                    }
                }
            }
        }

        self.summary.registration_calls = self.accumulator.engine_calls();
        log::info!(
            "Generation finished: {} clouds, {} scans processed ({} from checkpoints), {} skipped, {} registrations",
            self.summary.clouds_seen,
            self.summary.processed,
            self.summary.loaded,
            self.summary.skipped.len(),
            self.summary.registration_calls
        );
        Ok(self.summary.clone())
    }

    fn handle_scan(&mut self, index: usize, cloud: PointCloud3D) -> Result<()> {
        if let Some(&signal) = self.loop_markers.get(&index) {
            log::info!("Loop marker {:?} at scan {}", signal, index);
            self.signal(signal);
        }

        let result = if self.odometry_output {
            let raw_pose = self.latest_raw_pose.unwrap_or_else(|| {
                log::warn!("Scan {} has no preceding pose sample, using identity", index);
                RigidTransform::identity()
            });
            let scan = Scan {
                index,
                cloud,
                raw_pose,
            };
            self.accumulator
                .process_scan(&scan)
                .map(|outcome| outcome.source == PoseSource::Loaded)
        } else {
            self.accumulator.archive_cloud(index, &cloud).map(|_| false)
        };

        match result {
            Ok(loaded) => {
                self.summary.processed += 1;
                if loaded {
                    self.summary.loaded += 1;
                }
                Ok(())
            }
            Err(e) => match self.policy.for_kind(e.kind()) {
                FailurePolicy::Abort => {
                    log::error!("Aborting at scan {}: {}", index, e);
                    Err(e)
                }
                FailurePolicy::Skip => {
                    log::warn!("Skipping scan {}: {}", index, e);
                    self.summary.skipped.push(index);
                    Ok(())
                }
            },
        }
    }
}
