//! Registration with optional human review and retry.
//!
//! ```text
//!           ┌──────────────────────────────────────────┐
//!           ▼                                          │
//!   register(ref, cur, guess) ─► write merged cloud    │
//!           │                        │                 │
//!           │ no review              ▼                 │
//!           ▼                  review(request)         │
//!        result          accepted │      │ rejected    │
//!                                 ▼      └─► guess = Rz(δ)·guess
//!                              result
//! ```
//!
//! Engine errors end the loop immediately; they are never retried.

use crate::algorithms::matching::RegistrationEngine;
use crate::core::types::{PointCloud3D, RigidTransform};
use crate::io::ply::MergedCloudWriter;

use super::error::{PipelineError, Result};
use super::review::{ReviewPort, ReviewRequest, ReviewVerdict};

/// Rotation added about Z to the guess after a rejected attempt.
pub const DEFAULT_PERTURBATION_RAD: f64 = 0.2;

/// Drives the registration engine, and the reviewer when review is required.
pub struct RegistrationRetryLoop {
    engine: Box<dyn RegistrationEngine>,
    reviewer: Option<Box<dyn ReviewPort>>,
    merged_writer: Option<MergedCloudWriter>,
    perturbation_rad: f64,
    engine_calls: usize,
}

impl RegistrationRetryLoop {
    pub fn new(engine: Box<dyn RegistrationEngine>) -> Self {
        Self {
            engine,
            reviewer: None,
            merged_writer: None,
            perturbation_rad: DEFAULT_PERTURBATION_RAD,
            engine_calls: 0,
        }
    }

    pub fn with_reviewer(mut self, reviewer: Box<dyn ReviewPort>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    /// Write a merged cloud after every attempt.
    pub fn with_merged_writer(mut self, writer: MergedCloudWriter) -> Self {
        self.merged_writer = Some(writer);
        self
    }

    pub fn with_perturbation(mut self, perturbation_rad: f64) -> Self {
        self.perturbation_rad = perturbation_rad;
        self
    }

    /// Total number of engine invocations so far.
    pub fn engine_calls(&self) -> usize {
        self.engine_calls
    }

    pub fn has_reviewer(&self) -> bool {
        self.reviewer.is_some()
    }

    pub fn engine_profile(&self) -> &str {
        self.engine.profile()
    }

    /// Refine `initial_guess` by registering `current` onto `reference`.
    ///
    /// Without review the engine is called exactly once and its result is
    /// returned as is. With review, attempts repeat until the reviewer
    /// accepts one; each rejection rotates the guess further about Z.
    pub fn refine(
        &mut self,
        scan_index: usize,
        reference: &PointCloud3D,
        current: &PointCloud3D,
        initial_guess: &RigidTransform,
        review_required: bool,
    ) -> Result<RigidTransform> {
        if review_required && self.reviewer.is_none() {
            return Err(PipelineError::PreconditionViolation(
                "review required but no reviewer is attached".to_string(),
            ));
        }

        let mut guess = *initial_guess;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            log::debug!("Registration attempt {} for scan {}", attempt, scan_index);

            self.engine_calls += 1;
            let refined = self
                .engine
                .register(reference, current, &guess)
                .map_err(|e| PipelineError::registration(scan_index, e))?;

            let merged_cloud = match &self.merged_writer {
                Some(writer) => Some(
                    writer
                        .write(scan_index, reference, current, &refined)
                        .map_err(|e| {
                            PipelineError::StorageFailure(format!(
                                "merged cloud for scan {}: {}",
                                scan_index, e
                            ))
                        })?,
                ),
                None => None,
            };

            if !review_required {
                return Ok(refined);
            }
            let Some(reviewer) = self.reviewer.as_mut() else {
                return Ok(refined);
            };

            let request = ReviewRequest {
                scan_index,
                attempt,
                transform: refined,
                merged_cloud,
            };
            match reviewer
                .review(&request)
                .map_err(|e| PipelineError::registration(scan_index, e))?
            {
                ReviewVerdict::Accepted => return Ok(refined),
                ReviewVerdict::Rejected => {
                    log::info!(
                        "Scan {} attempt {} rejected, rotating guess by {:.3} rad",
                        scan_index,
                        attempt,
                        self.perturbation_rad
                    );
                    guess = guess.rotated_about_z(self.perturbation_rad);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::matching::{PassthroughEngine, RegistrationError};
    use crate::core::types::{Point3D, TRANSFORM_EPSILON};
    use crate::engine::review::ScriptedReviewer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Echoes the guess and records every guess it was given.
    struct RecordingEngine {
        guesses: Arc<Mutex<Vec<RigidTransform>>>,
    }

    impl RegistrationEngine for RecordingEngine {
        fn register(
            &self,
            _reference: &PointCloud3D,
            _target: &PointCloud3D,
            initial_guess: &RigidTransform,
        ) -> std::result::Result<RigidTransform, RegistrationError> {
            self.guesses.lock().unwrap().push(*initial_guess);
            Ok(*initial_guess)
        }
    }

    struct FailingEngine {
        calls: Arc<AtomicUsize>,
    }

    impl RegistrationEngine for FailingEngine {
        fn register(
            &self,
            _reference: &PointCloud3D,
            _target: &PointCloud3D,
            _initial_guess: &RigidTransform,
        ) -> std::result::Result<RigidTransform, RegistrationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RegistrationError::NotConverged {
                iterations: 50,
                mse: 1.0,
            })
        }
    }

    /// Reviewer sharing its script with the test.
    struct SharedReviewer(Arc<Mutex<ScriptedReviewer>>);

    impl ReviewPort for SharedReviewer {
        fn review(
            &mut self,
            request: &ReviewRequest,
        ) -> std::result::Result<ReviewVerdict, crate::engine::review::ReviewError> {
            self.0.lock().unwrap().review(request)
        }
    }

    fn cloud() -> PointCloud3D {
        PointCloud3D::from_points(vec![Point3D::new(1.0, 2.0, 3.0)])
    }

    #[test]
    fn test_no_review_calls_engine_once() {
        let guesses = Arc::new(Mutex::new(Vec::new()));
        let mut retry = RegistrationRetryLoop::new(Box::new(RecordingEngine {
            guesses: guesses.clone(),
        }));
        let guess = RigidTransform::from_translation(1.0, 0.0, 0.0);

        let refined = retry.refine(1, &cloud(), &cloud(), &guess, false).unwrap();
        assert_eq!(refined, guess);
        assert_eq!(guesses.lock().unwrap().len(), 1);
        assert_eq!(retry.engine_calls(), 1);
    }

    #[test]
    fn test_rejections_accumulate_rotation() {
        let guesses = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(ScriptedReviewer::new([
            ReviewVerdict::Rejected,
            ReviewVerdict::Rejected,
            ReviewVerdict::Accepted,
        ])));
        let mut retry = RegistrationRetryLoop::new(Box::new(RecordingEngine {
            guesses: guesses.clone(),
        }))
        .with_reviewer(Box::new(SharedReviewer(script.clone())))
        .with_perturbation(0.2);

        let guess = RigidTransform::from_translation_rpy(0.5, 0.0, 0.0, 0.0, 0.0, 0.1);
        let refined = retry.refine(4, &cloud(), &cloud(), &guess, true).unwrap();

        let guesses = guesses.lock().unwrap();
        assert_eq!(guesses.len(), 3);
        assert_eq!(retry.engine_calls(), 3);
        assert!(guesses[0].approx_eq(&guess, TRANSFORM_EPSILON));
        assert!(guesses[1].approx_eq(&guess.rotated_about_z(0.2), TRANSFORM_EPSILON));
        assert!(guesses[2].approx_eq(&guess.rotated_about_z(0.4), TRANSFORM_EPSILON));

        // Translation never changes.
        for g in guesses.iter() {
            assert_eq!(g.translation(), guess.translation());
        }
        assert!(refined.approx_eq(&guesses[2], TRANSFORM_EPSILON));

        let script = script.lock().unwrap();
        let attempts: Vec<u32> = script.requests().iter().map(|r| r.attempt).collect();
        assert_eq!(attempts, vec![1, 2, 3]);
    }

    #[test]
    fn test_engine_error_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut retry = RegistrationRetryLoop::new(Box::new(FailingEngine {
            calls: calls.clone(),
        }))
        .with_reviewer(Box::new(ScriptedReviewer::new([ReviewVerdict::Rejected])));

        let result = retry.refine(2, &cloud(), &cloud(), &RigidTransform::identity(), true);
        assert!(matches!(
            result,
            Err(PipelineError::RegistrationFailure { scan_index: 2, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_review_without_reviewer_is_precondition_violation() {
        let mut retry = RegistrationRetryLoop::new(Box::new(PassthroughEngine));
        let result = retry.refine(1, &cloud(), &cloud(), &RigidTransform::identity(), true);
        assert!(matches!(result, Err(PipelineError::PreconditionViolation(_))));
        assert_eq!(retry.engine_calls(), 0);
    }

    #[test]
    fn test_merged_cloud_is_offered_to_reviewer() {
        let dir = TempDir::new().unwrap();
        let script = Arc::new(Mutex::new(ScriptedReviewer::new([ReviewVerdict::Accepted])));
        let mut retry = RegistrationRetryLoop::new(Box::new(PassthroughEngine))
            .with_reviewer(Box::new(SharedReviewer(script.clone())))
            .with_merged_writer(MergedCloudWriter::new(dir.path(), 4));

        retry
            .refine(6, &cloud(), &cloud(), &RigidTransform::identity(), true)
            .unwrap();

        let script = script.lock().unwrap();
        let path = script.requests()[0].merged_cloud.clone().unwrap();
        assert!(path.ends_with("scan_0006_merged.ply"));
        assert!(path.exists());
    }
}
