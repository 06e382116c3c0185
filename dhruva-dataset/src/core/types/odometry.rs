//! Persisted form of a corrected pose.
//!
//! One record per scan index, stored as a single human-readable line:
//!
//! ```text
//! Odometry: <x> <y> <z> <roll> <pitch> <yaw>
//! ```
//!
//! Angles are radians. Lines starting with `#` are comments. If the tag
//! appears more than once, the first occurrence wins.

use thiserror::Error;

use super::transform::RigidTransform;
use crate::core::math::canonical_zero;

/// Tag that prefixes the pose line.
pub const ODOMETRY_TAG: &str = "Odometry:";

/// Errors from parsing an odometry record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordParseError {
    #[error("no `Odometry:` line found")]
    MissingTag,

    #[error("expected 6 values after `Odometry:`, found {0}")]
    WrongFieldCount(usize),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),
}

/// Six-scalar pose: translation in meters and roll/pitch/yaw in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OdometryRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl OdometryRecord {
    /// Decompose a transform into a record.
    pub fn from_transform(transform: &RigidTransform) -> Self {
        let (t, [roll, pitch, yaw]) = transform.decompose();
        Self {
            x: t.x,
            y: t.y,
            z: t.z,
            roll,
            pitch,
            yaw,
        }
    }

    /// Rebuild the transform this record was decomposed from.
    pub fn to_transform(&self) -> RigidTransform {
        RigidTransform::from_translation_rpy(self.x, self.y, self.z, self.roll, self.pitch, self.yaw)
    }

    /// The six values in file order.
    pub fn values(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.roll, self.pitch, self.yaw]
    }

    /// Norm of the translation part.
    pub fn translation_norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Format as the tagged record line (no trailing newline).
    ///
    /// Values use the shortest representation that parses back to the same
    /// `f64`, and `-0` is written as `0`.
    pub fn to_line(&self) -> String {
        let fields: Vec<String> = self
            .values()
            .iter()
            .map(|v| canonical_zero(*v).to_string())
            .collect();
        format!("{} {}", ODOMETRY_TAG, fields.join(" "))
    }

    /// Parse the first tagged line of `text`, skipping `#` comments.
    pub fn parse(text: &str) -> Result<Self, RecordParseError> {
        let line = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.starts_with('#'))
            .find_map(|l| l.strip_prefix(ODOMETRY_TAG))
            .ok_or(RecordParseError::MissingTag)?;

        let values = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>()
                    .map_err(|_| RecordParseError::InvalidNumber(tok.to_string()))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        match values[..] {
            [x, y, z, roll, pitch, yaw] => Ok(Self {
                x,
                y,
                z,
                roll,
                pitch,
                yaw,
            }),
            _ => Err(RecordParseError::WrongFieldCount(values.len())),
        }
    }
}
