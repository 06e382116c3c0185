//! 3D point cloud types.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::transform::RigidTransform;

/// A 3D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Widen to an `f64` nalgebra point.
    #[inline]
    pub fn to_point3(self) -> Point3<f64> {
        Point3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    /// Narrow from an `f64` nalgebra point.
    #[inline]
    pub fn from_point3(p: &Point3<f64>) -> Self {
        Self::new(p.x as f32, p.y as f32, p.z as f32)
    }
}

/// Unordered collection of 3D points in the sensor frame.
///
/// One [`Point3D`] per return, serialized as a single postcard blob per scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloud3D {
    pub points: Vec<Point3D>,
}

impl PointCloud3D {
    /// Create an empty point cloud.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a point cloud with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn push(&mut self, point: Point3D) {
        self.points.push(point);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point3D> {
        self.points.iter()
    }

    /// Apply `transform` to every point (`R·p + t`).
    pub fn transform(&self, transform: &RigidTransform) -> PointCloud3D {
        let points = self
            .points
            .iter()
            .map(|p| Point3D::from_point3(&transform.transform_point(&p.to_point3())))
            .collect();
        PointCloud3D { points }
    }

    /// Mean of all points, or `None` for an empty cloud.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (sx, sy, sz) = self.points.iter().fold((0.0, 0.0, 0.0), |acc, p| {
            (acc.0 + p.x as f64, acc.1 + p.y as f64, acc.2 + p.z as f64)
        });
        Some(Point3::new(sx / n, sy / n, sz / n))
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<(Point3D, Point3D)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (
                Point3D::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3D::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }
}
