//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use dhruva_dataset::{
    BagRecorder, DatasetConfig, Point3D, PointCloud3D, PoseSample, RigidTransform,
};
use tempfile::TempDir;

/// Sample a trefoil knot (no continuous symmetry, so ICP can lock on).
pub fn trefoil(n: usize, scale: f32) -> PointCloud3D {
    let mut cloud = PointCloud3D::with_capacity(n);
    for i in 0..n {
        let t = (i as f32 / n as f32) * std::f32::consts::TAU;
        let x = t.sin() + 2.0 * (2.0 * t).sin();
        let y = t.cos() - 2.0 * (2.0 * t).cos();
        let z = -(3.0 * t).sin();
        cloud.push(Point3D::new(x * scale, y * scale, z * scale));
    }
    cloud
}

/// A single marker point, enough for engines that ignore geometry.
pub fn marker_cloud(i: usize) -> PointCloud3D {
    PointCloud3D::from_points(vec![Point3D::new(i as f32, 0.0, 0.0)])
}

/// Workspace with a bag and an output directory.
pub struct Workspace {
    pub dir: TempDir,
    pub bag: PathBuf,
}

impl Workspace {
    /// Record one pose sample followed by one cloud per entry.
    pub fn record(entries: &[(RigidTransform, PointCloud3D)]) -> Self {
        let dir = TempDir::new().unwrap();
        let bag = dir.path().join("run.bag");
        let mut recorder = BagRecorder::create(&bag).unwrap();
        for (i, (raw_pose, cloud)) in entries.iter().enumerate() {
            let ts = 1_000_000 + i as u64 * 100_000;
            recorder
                .record_pose(&PoseSample::from_transform(raw_pose), ts)
                .unwrap();
            recorder.record_cloud(cloud, ts + 10).unwrap();
        }
        recorder.finish().unwrap();
        Self { dir, bag }
    }

    /// Raw poses at `x = i * step` carrying marker clouds.
    pub fn straight_line(clouds: usize, step: f64) -> Self {
        let entries: Vec<_> = (0..clouds)
            .map(|i| {
                (
                    RigidTransform::from_translation(i as f64 * step, 0.0, 0.0),
                    marker_cloud(i),
                )
            })
            .collect();
        Self::record(&entries)
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Config writing into this workspace with the passthrough engine.
    pub fn passthrough_config(&self) -> DatasetConfig {
        let toml = format!(
            r#"
            [output]
            directory = "{}"

            [registration]
            method = "passthrough"
            "#,
            self.output().display()
        );
        DatasetConfig::from_toml(&toml).unwrap()
    }

    pub fn record_text(&self, index: usize) -> Option<String> {
        std::fs::read_to_string(info_path(&self.output(), index)).ok()
    }
}

pub fn info_path(output: &Path, index: usize) -> PathBuf {
    output.join(format!("scan_{:04}_info.dat", index))
}

pub fn cloud_path(output: &Path, index: usize) -> PathBuf {
    output.join(format!("scan_{:04}.cloud", index))
}
