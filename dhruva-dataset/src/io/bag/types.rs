//! Core data types for bag file format.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::types::{PointCloud3D, RigidTransform, Stamped};

/// Magic bytes at start of bag file.
pub const BAG_MAGIC: [u8; 4] = *b"DBAG";

/// Current bag file format version.
pub const BAG_VERSION: u16 = 2;

/// Size of the bag file header in bytes.
pub const HEADER_SIZE: usize = 64;

/// Upper bound on a single serialized message.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// Bag file header (64 bytes fixed size).
///
/// Stored at the beginning of every bag file. Contains metadata
/// about the recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BagHeader {
    /// Magic bytes: "DBAG"
    pub magic: [u8; 4],
    /// File format version
    pub version: u16,
    /// Feature flags (unused, 0)
    pub flags: u16,
    /// Timestamp of first message (microseconds since epoch)
    pub start_time_us: u64,
    /// Timestamp of last message (microseconds since epoch)
    pub end_time_us: u64,
    /// Total number of messages in the file
    pub message_count: u64,
    /// Number of pose sample messages
    pub pose_count: u64,
    /// Number of point cloud messages
    pub cloud_count: u64,
    /// Reserved for future use
    pub reserved: [u8; 4],
}

impl BagHeader {
    /// Create a new header with default values.
    pub fn new() -> Self {
        Self {
            magic: BAG_MAGIC,
            version: BAG_VERSION,
            flags: 0,
            start_time_us: 0,
            end_time_us: 0,
            message_count: 0,
            pose_count: 0,
            cloud_count: 0,
            reserved: [0; 4],
        }
    }

    /// Check if magic bytes are valid.
    pub fn is_valid(&self) -> bool {
        self.magic == BAG_MAGIC
    }

    /// Get recording duration in microseconds.
    pub fn duration_us(&self) -> u64 {
        self.end_time_us.saturating_sub(self.start_time_us)
    }

    /// Get recording duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_us() as f64 / 1_000_000.0
    }
}

impl Default for BagHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw 6-DOF pose reported by the sensor (odometry, not yet corrected).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Position [x, y, z] in meters
    pub translation: [f64; 3],
    /// Orientation quaternion [x, y, z, w]
    pub rotation: [f64; 4],
}

impl PoseSample {
    pub fn identity() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn from_transform(transform: &RigidTransform) -> Self {
        let t = transform.translation();
        let q = transform.rotation().quaternion();
        Self {
            translation: [t.x, t.y, t.z],
            rotation: [q.i, q.j, q.k, q.w],
        }
    }

    /// Convert to a rigid transform.
    ///
    /// The quaternion is normalized; a degenerate (near zero) quaternion
    /// is read as identity rotation.
    pub fn to_transform(&self) -> RigidTransform {
        let [x, y, z, w] = self.rotation;
        let rotation = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), 1e-12)
            .unwrap_or_else(UnitQuaternion::identity);
        let [tx, ty, tz] = self.translation;
        RigidTransform::new(rotation, Vector3::new(tx, ty, tz))
    }
}

/// Message types stored in bag files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BagMessage {
    /// Raw sensor pose sample
    PoseSample(Stamped<PoseSample>),
    /// Point cloud in the sensor frame
    PointCloud(Stamped<PointCloud3D>),
}

impl BagMessage {
    /// Get the timestamp of this message in microseconds.
    pub fn timestamp_us(&self) -> u64 {
        match self {
            BagMessage::PoseSample(msg) => msg.timestamp_us,
            BagMessage::PointCloud(msg) => msg.timestamp_us,
        }
    }

    /// Get the sequence number of this message.
    pub fn seq(&self) -> u64 {
        match self {
            BagMessage::PoseSample(msg) => msg.seq,
            BagMessage::PointCloud(msg) => msg.seq,
        }
    }

    pub fn is_pose_sample(&self) -> bool {
        matches!(self, BagMessage::PoseSample(_))
    }

    pub fn is_point_cloud(&self) -> bool {
        matches!(self, BagMessage::PointCloud(_))
    }

    pub fn as_pose_sample(&self) -> Option<&Stamped<PoseSample>> {
        match self {
            BagMessage::PoseSample(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_point_cloud(&self) -> Option<&Stamped<PointCloud3D>> {
        match self {
            BagMessage::PointCloud(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Information about a bag file.
///
/// Returned after recording or when inspecting a bag file.
#[derive(Debug, Clone)]
pub struct BagInfo {
    /// Path to the bag file
    pub path: PathBuf,
    /// Recording duration in microseconds
    pub duration_us: u64,
    /// Total number of messages
    pub message_count: u64,
    /// File size in bytes
    pub file_size_bytes: u64,
    /// Number of pose sample messages
    pub pose_count: u64,
    /// Number of point cloud messages
    pub cloud_count: u64,
}

impl BagInfo {
    /// Get recording duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_us as f64 / 1_000_000.0
    }

    /// Get file size in megabytes.
    pub fn file_size_mb(&self) -> f64 {
        self.file_size_bytes as f64 / 1_048_576.0
    }

    /// Get average message rate in Hz.
    pub fn message_rate_hz(&self) -> f64 {
        if self.duration_us == 0 {
            0.0
        } else {
            self.message_count as f64 / self.duration_secs()
        }
    }
}
