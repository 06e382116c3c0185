//! Human review of registration results.
//!
//! When review is enabled, every registration attempt is shown to an
//! operator who either accepts it or asks for another attempt. The pipeline
//! only sees the [`ReviewPort`] trait; the console implementation is what
//! the binary wires in, scripted reviewers are what tests wire in.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::{Child, Command};

use thiserror::Error;

use crate::core::types::RigidTransform;

/// Operator's decision on one registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Accepted,
    /// Try again from a perturbed initial guess.
    Rejected,
}

/// One registration attempt presented for review.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub scan_index: usize,
    /// 1-based attempt number for this scan.
    pub attempt: u32,
    /// Refined transform produced by this attempt.
    pub transform: RigidTransform,
    /// Merged reference + aligned cloud, if one was written.
    pub merged_cloud: Option<PathBuf>,
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("review channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no scripted verdict left for scan {0}")]
    Exhausted(usize),
}

/// Capability to ask for a verdict on a registration attempt.
pub trait ReviewPort {
    /// Block until a verdict is available.
    fn review(&mut self, request: &ReviewRequest) -> Result<ReviewVerdict, ReviewError>;
}

/// Interactive reviewer on a text console.
///
/// Optionally launches an external viewer on the merged cloud, then reads
/// one line: `y`/`Y` means the odometry needs adjustment, anything else
/// accepts it. Viewers run in the background and are reaped once they exit.
pub struct ConsoleReviewer<R, W> {
    input: R,
    output: W,
    viewer_command: Option<String>,
    viewers: Vec<Child>,
}

impl ConsoleReviewer<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Reviewer on the process's stdin/stdout.
    pub fn stdio(viewer_command: Option<String>) -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout(), viewer_command)
    }
}

impl<R: BufRead, W: Write> ConsoleReviewer<R, W> {
    pub fn new(input: R, output: W, viewer_command: Option<String>) -> Self {
        Self {
            input,
            output,
            viewer_command,
            viewers: Vec::new(),
        }
    }

    /// Viewer processes that have not exited yet.
    pub fn running_viewers(&mut self) -> usize {
        self.reap_viewers();
        self.viewers.len()
    }

    fn reap_viewers(&mut self) {
        self.viewers.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                log::debug!("Viewer {} exited with {}", child.id(), status);
                false
            }
            Ok(None) => true,
            Err(e) => {
                log::warn!("Lost track of viewer {}: {}", child.id(), e);
                false
            }
        });
    }

    fn launch_viewer(&mut self, request: &ReviewRequest) {
        self.reap_viewers();
        let (Some(command), Some(path)) = (&self.viewer_command, &request.merged_cloud) else {
            return;
        };
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return;
        };
        match Command::new(program).args(parts).arg(path).spawn() {
            Ok(child) => {
                log::debug!("Launched `{}` on {}", program, path.display());
                self.viewers.push(child);
            }
            Err(e) => log::warn!("Failed to launch viewer `{}`: {}", program, e),
        }
    }
}

impl<R: BufRead, W: Write> ReviewPort for ConsoleReviewer<R, W> {
    fn review(&mut self, request: &ReviewRequest) -> Result<ReviewVerdict, ReviewError> {
        self.launch_viewer(request);

        let (t, [roll, pitch, yaw]) = request.transform.decompose();
        writeln!(
            self.output,
            "Scan {} attempt {}: t=({:.3}, {:.3}, {:.3}) rpy=({:.3}, {:.3}, {:.3})",
            request.scan_index, request.attempt, t.x, t.y, t.z, roll, pitch, yaw
        )?;
        write!(self.output, "Enter (y) if odom need adjustment : ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            log::warn!("Review input closed, accepting scan {}", request.scan_index);
            return Ok(ReviewVerdict::Accepted);
        }

        match line.trim() {
            "y" | "Y" => Ok(ReviewVerdict::Rejected),
            _ => Ok(ReviewVerdict::Accepted),
        }
    }
}

/// Replays a fixed sequence of verdicts.
///
/// Records every request it sees, so callers can check what was reviewed.
#[derive(Debug, Default)]
pub struct ScriptedReviewer {
    verdicts: VecDeque<ReviewVerdict>,
    requests: Vec<ReviewRequest>,
}

impl ScriptedReviewer {
    pub fn new(verdicts: impl IntoIterator<Item = ReviewVerdict>) -> Self {
        Self {
            verdicts: verdicts.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[ReviewRequest] {
        &self.requests
    }

    pub fn remaining(&self) -> usize {
        self.verdicts.len()
    }
}

impl ReviewPort for ScriptedReviewer {
    fn review(&mut self, request: &ReviewRequest) -> Result<ReviewVerdict, ReviewError> {
        self.requests.push(request.clone());
        self.verdicts
            .pop_front()
            .ok_or(ReviewError::Exhausted(request.scan_index))
    }
}
