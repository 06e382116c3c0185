//! Test fixtures for generating synthetic bag files.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::recorder::BagRecorder;
use super::types::PoseSample;
use crate::core::types::{Point3D, PointCloud3D, RigidTransform};

/// Test fixture for bag file testing.
///
/// Creates temporary bag files with synthetic data. The temporary directory
/// is automatically cleaned up when the fixture is dropped.
pub struct BagTestFixture {
    temp_dir: TempDir,
    bag_path: PathBuf,
}

impl BagTestFixture {
    /// Robot driving along +X.
    ///
    /// Each of the `clouds` steps records `poses_per_cloud` pose samples
    /// (the last one at the cloud's position) followed by one point cloud.
    /// Cloud `i` is taken at `x = i * step_m`.
    pub fn straight_line(clouds: usize, step_m: f64, poses_per_cloud: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let bag_path = temp_dir.path().join("straight_line.bag");

        let mut recorder = BagRecorder::create(&bag_path).expect("Failed to create recorder");
        let start_time_us = 1_000_000_000u64;
        let cloud_period_us = 100_000u64; // 10 Hz
        let poses_per_cloud = poses_per_cloud.max(1);
        let sub_step = step_m / poses_per_cloud as f64;

        let mut time = start_time_us;
        for i in 0..clouds {
            for p in 0..poses_per_cloud {
                let x = if i == 0 {
                    0.0
                } else {
                    (i - 1) as f64 * step_m + sub_step * (p + 1) as f64
                };
                let pose = PoseSample::from_transform(&RigidTransform::from_translation(x, 0.0, 0.0));
                recorder
                    .record_pose(&pose, time)
                    .expect("Failed to record pose");
                time += cloud_period_us / (poses_per_cloud as u64 + 1);
            }
            recorder
                .record_cloud(&synthetic_room(), time)
                .expect("Failed to record cloud");
            time = start_time_us + (i as u64 + 1) * cloud_period_us;
        }

        recorder.finish().expect("Failed to finish recording");

        Self { temp_dir, bag_path }
    }

    /// Get the bag file path.
    pub fn path(&self) -> &Path {
        &self.bag_path
    }

    /// Directory holding the bag; usable as a scratch output directory.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Small box-shaped room, 4 × 3 × 2.5 m, sampled on its walls.
pub fn synthetic_room() -> PointCloud3D {
    let mut cloud = PointCloud3D::new();
    for i in 0..40 {
        for k in 0..5 {
            let s = i as f32 / 40.0;
            let z = k as f32 * 0.5 + s * 0.01;
            cloud.push(Point3D::new(s * 4.0, 0.001 * i as f32, z));
            cloud.push(Point3D::new(4.0 - 0.001 * i as f32, s * 3.0, z));
        }
    }
    cloud
}
