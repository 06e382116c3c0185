//! Loop-closure re-anchoring.
//!
//! During the first traversal of a loop every committed pose is captured as
//! an anchor. When the controller later signals that the robot is back at
//! the loop start (or end), the next scan is not chained onto the drifting
//! trajectory. Instead its predicted pose is matched against the anchors and
//! the nearest anchor becomes both the new base pose and the registration
//! reference.
//!
//! ```text
//! first loop:   a0 ── a1 ── a2 ── a3 ── a4        (anchors captured)
//!                                        │
//! mark_loop_start()                      ▼
//! next scan:    predicted = last ⊕ raw_delta ──► nearest anchor aᵢ
//!               base      = aᵢ
//!               guess     = difference(aᵢ, predicted)
//!               reference = cloud of scan i
//! ```

use crate::core::types::{RigidTransform, positional_distance};

use super::error::{PipelineError, Result};

/// Which end of the loop a reanchor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReanchorMode {
    LoopStart,
    LoopEnd,
}

/// `(scan index, pose)` pairs captured during the first loop.
///
/// Append-only until frozen; frozen once the first loop ends.
#[derive(Debug, Clone, Default)]
pub struct LoopAnchorSet {
    anchors: Vec<(usize, RigidTransform)>,
    frozen: bool,
}

impl LoopAnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an anchor. Ignored (returns `false`) once frozen.
    pub fn capture(&mut self, index: usize, pose: RigidTransform) -> bool {
        if self.frozen {
            return false;
        }
        self.anchors.push((index, pose));
        true
    }

    /// Stop accepting anchors.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn first(&self) -> Option<&(usize, RigidTransform)> {
        self.anchors.first()
    }

    pub fn last(&self) -> Option<&(usize, RigidTransform)> {
        self.anchors.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, RigidTransform)> {
        self.anchors.iter()
    }

    /// Anchor closest to `pose` by translation.
    ///
    /// Equal distances resolve to the lowest scan index.
    pub fn nearest(&self, pose: &RigidTransform) -> Option<(usize, RigidTransform, f64)> {
        self.anchors
            .iter()
            .map(|(index, anchor)| (*index, *anchor, positional_distance(pose, anchor)))
            .min_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)))
    }
}

/// What the accumulator should register against, and from where.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReanchorOutcome {
    /// Initial guess handed to the registration engine.
    pub initial_guess: RigidTransform,
    /// Scan whose stored cloud becomes the registration reference.
    pub reference_index: usize,
    /// Pose of the reference scan; the refined transform composes onto it.
    pub base_pose: RigidTransform,
    /// Whether the nearest-anchor match fired (and the reanchor state is consumed).
    pub anchor_matched: bool,
}

impl ReanchorOutcome {
    pub fn matched(&self) -> bool {
        self.anchor_matched
    }
}

/// Choose the initial guess and reference for a scan after a loop signal.
///
/// With `loop_scan_count == 0` there is no scan yet in this traversal to
/// predict from: the guess is identity and the reference is the loop-start
/// anchor (first) or loop-end anchor (last). The base pose is that anchor's
/// pose so the registration result lands in the reference's frame, but the
/// match does not count as fired. Otherwise the pose predicted from `last_corrected_pose` and `raw_delta`
/// is matched to the nearest anchor.
pub fn reanchor(
    last_corrected_pose: &RigidTransform,
    loop_scan_count: usize,
    raw_delta: &RigidTransform,
    anchors: &LoopAnchorSet,
    mode: ReanchorMode,
) -> Result<ReanchorOutcome> {
    let placeholder = match mode {
        ReanchorMode::LoopStart => anchors.first(),
        ReanchorMode::LoopEnd => anchors.last(),
    };
    let Some(&(placeholder_index, placeholder_pose)) = placeholder else {
        return Err(PipelineError::PreconditionViolation(
            "reanchor requested but no loop anchors were captured".to_string(),
        ));
    };

    if loop_scan_count == 0 {
        return Ok(ReanchorOutcome {
            initial_guess: RigidTransform::identity(),
            reference_index: placeholder_index,
            base_pose: placeholder_pose,
            anchor_matched: false,
        });
    }

    let predicted = last_corrected_pose.compose(raw_delta);
    let Some((index, anchor, distance)) = anchors.nearest(&predicted) else {
        return Err(PipelineError::PreconditionViolation(
            "reanchor requested but no loop anchors were captured".to_string(),
        ));
    };
    log::debug!(
        "Reanchor ({:?}): nearest anchor is scan {} at {:.3} m",
        mode,
        index,
        distance
    );

    Ok(ReanchorOutcome {
        initial_guess: anchor.difference(&predicted),
        reference_index: index,
        base_pose: anchor,
        anchor_matched: true,
    })
}
