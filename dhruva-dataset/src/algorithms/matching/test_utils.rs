//! Shared test clouds for registration tests.

use crate::core::types::{Point3D, PointCloud3D};

/// Sample a trefoil knot.
///
/// The curve has no continuous symmetry, so a rigid motion of it is
/// recoverable from nearest-neighbour correspondences alone. Coordinates
/// are all distinct, which keeps the k-d tree buckets splittable.
pub fn create_trefoil(n: usize, scale: f32) -> PointCloud3D {
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
