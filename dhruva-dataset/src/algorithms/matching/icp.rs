//! Point-to-Point Iterative Closest Point (ICP) in 3D.
//!
//! Classic ICP algorithm for aligning two point clouds by iteratively:
//! 1. Finding nearest neighbor correspondences
//! 2. Computing optimal rigid transform
//! 3. Applying transform and repeating until convergence
//!
//! # Algorithm
//!
//! ```text
//! Input: Reference cloud R, Target cloud T, Initial guess X₀
//! Output: Transform X* with  r ≈ X*·t  for matched pairs (r, t)
//!
//! 1. X = X₀
//! 2. For each iteration:
//!    a. For each t in T find nearest neighbour r in R to X·t
//!    b. Solve the best rigid ΔX for the pairs (Kabsch, SVD)
//!    c. X = ΔX · X
//!    d. If ΔX < threshold, converged
//! 3. Return X
//! ```
//!
//! The returned transform maps target-frame points into the reference
//! frame (`r = R·t + p`).

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

use super::{RegistrationEngine, RegistrationError};
use crate::core::types::{PointCloud3D, RigidTransform};

/// Configuration for Point-to-Point ICP.
#[derive(Debug, Clone)]
pub struct IcpConfig {
    /// Maximum number of iterations.
    pub max_iterations: u32,

    /// Convergence threshold for translation (meters).
    pub translation_epsilon: f64,

    /// Convergence threshold for rotation (radians).
    pub rotation_epsilon: f64,

    /// Maximum correspondence distance (meters).
    ///
    /// Point pairs farther than this are rejected as outliers.
    pub max_correspondence_distance: f64,

    /// Minimum number of valid correspondences required.
    pub min_correspondences: usize,

    /// Outlier rejection ratio (0.0 to 1.0).
    ///
    /// After computing correspondences, reject this fraction
    /// of the worst (largest distance) correspondences.
    pub outlier_ratio: f64,

    /// Mean squared error below which a run that hit `max_iterations`
    /// is still accepted (m²).
    pub acceptable_mse: f64,
}

impl Default for IcpConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            translation_epsilon: 0.001,       // 1mm
            rotation_epsilon: 0.001,          // ~0.06°
            max_correspondence_distance: 0.5, // 50cm
            min_correspondences: 10,
            outlier_ratio: 0.1, // Reject worst 10%
            acceptable_mse: 0.01,
        }
    }
}

/// Point-to-Point ICP registration engine.
///
/// Uses a k-d tree over the reference cloud for nearest neighbour queries.
/// Suitable for small to medium initial pose errors.
#[derive(Debug, Clone)]
pub struct PointToPointIcp {
    config: IcpConfig,
    profile: String,
}

impl PointToPointIcp {
    /// Create a new ICP engine with the given configuration.
    pub fn new(config: IcpConfig) -> Self {
        Self {
            config,
            profile: "default".to_string(),
        }
    }

    /// Attach an opaque profile identifier (reported by [`RegistrationEngine::profile`]).
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &IcpConfig {
        &self.config
    }

    fn build_kdtree(cloud: &PointCloud3D) -> KdTree<f64, 3> {
        let mut tree: KdTree<f64, 3> = KdTree::new();
        for (i, point) in cloud.points.iter().enumerate() {
            tree.add(&[point.x as f64, point.y as f64, point.z as f64], i as u64);
        }
        tree
    }

    /// Find correspondences for every target point under `estimate`.
    ///
    /// Returns `(transformed target point, reference point, squared distance)`.
    fn find_correspondences(
        &self,
        reference: &PointCloud3D,
        target: &PointCloud3D,
        reference_tree: &KdTree<f64, 3>,
        estimate: &Isometry3<f64>,
    ) -> Vec<(Point3<f64>, Point3<f64>, f64)> {
        let max_dist_sq = self.config.max_correspondence_distance.powi(2);
        let mut correspondences = Vec::with_capacity(target.len());

        for point in &target.points {
            let moved = estimate * point.to_point3();
            let nearest = reference_tree.nearest_one::<SquaredEuclidean>(&[moved.x, moved.y, moved.z]);
            if nearest.distance <= max_dist_sq {
                let matched = reference.points[nearest.item as usize].to_point3();
                correspondences.push((moved, matched, nearest.distance));
            }
        }

        if self.config.outlier_ratio > 0.0 && !correspondences.is_empty() {
            correspondences.sort_by(|a, b| a.2.total_cmp(&b.2));
            let keep_count =
                ((1.0 - self.config.outlier_ratio) * correspondences.len() as f64) as usize;
            correspondences.truncate(keep_count.max(self.config.min_correspondences));
        }

        correspondences
    }

    /// Closed-form rigid alignment of matched pairs (Kabsch).
    ///
    /// Returns `ΔX` minimizing `Σ |r - ΔX·t|²`.
    fn compute_delta(
        correspondences: &[(Point3<f64>, Point3<f64>, f64)],
    ) -> Result<Isometry3<f64>, RegistrationError> {
        let n = correspondences.len() as f64;
        let mut moved_centroid = Vector3::zeros();
        let mut reference_centroid = Vector3::zeros();
        for (moved, matched, _) in correspondences {
            moved_centroid += moved.coords;
            reference_centroid += matched.coords;
        }
        moved_centroid /= n;
        reference_centroid /= n;

        // H = Σ (t_i - c_t)(r_i - c_r)ᵀ
        let mut h = Matrix3::zeros();
        for (moved, matched, _) in correspondences {
            h += (moved.coords - moved_centroid) * (matched.coords - reference_centroid).transpose();
        }

        let svd = h.svd(true, true);
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return Err(RegistrationError::Internal(
                "SVD of cross-covariance failed".to_string(),
            ));
        };

        let mut v = v_t.transpose();
        let mut rotation = v * u.transpose();
        if rotation.determinant() < 0.0 {
            // Reflection: flip the axis of the smallest singular value.
            for row in 0..3 {
                v[(row, 2)] = -v[(row, 2)];
            }
            rotation = v * u.transpose();
        }

        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation));
        let translation = reference_centroid - rotation * moved_centroid;
        Ok(Isometry3::from_parts(Translation3::from(translation), rotation))
    }

    fn compute_mse(correspondences: &[(Point3<f64>, Point3<f64>, f64)]) -> f64 {
        if correspondences.is_empty() {
            return f64::MAX;
        }
        correspondences.iter().map(|c| c.2).sum::<f64>() / correspondences.len() as f64
    }
}

fn to_isometry(transform: &RigidTransform) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::from(*transform.translation()),
        *transform.rotation(),
    )
}

fn from_isometry(isometry: &Isometry3<f64>) -> RigidTransform {
    RigidTransform::new(isometry.rotation, isometry.translation.vector)
}

impl RegistrationEngine for PointToPointIcp {
    fn register(
        &self,
        reference: &PointCloud3D,
        target: &PointCloud3D,
        initial_guess: &RigidTransform,
    ) -> Result<RigidTransform, RegistrationError> {
        if reference.is_empty() || target.is_empty() {
            return Err(RegistrationError::EmptyCloud);
        }

        let reference_tree = Self::build_kdtree(reference);
        let mut estimate = to_isometry(initial_guess);
        let mut iterations = 0u32;
        let mut last_mse = f64::MAX;

        for iter in 0..self.config.max_iterations {
            iterations = iter + 1;

            let correspondences =
                self.find_correspondences(reference, target, &reference_tree, &estimate);
            if correspondences.len() < self.config.min_correspondences.max(3) {
                return Err(RegistrationError::InsufficientCorrespondences {
                    found: correspondences.len(),
                    required: self.config.min_correspondences.max(3),
                });
            }

            let delta = Self::compute_delta(&correspondences)?;
            estimate = delta * estimate;

            let translation_change = delta.translation.vector.norm();
            let rotation_change = delta.rotation.angle();
            if translation_change < self.config.translation_epsilon
                && rotation_change < self.config.rotation_epsilon
            {
                log::debug!("ICP converged after {} iterations", iterations);
                return Ok(from_isometry(&estimate));
            }

            // MSE is getting worse, might be diverging
            let mse = Self::compute_mse(&correspondences);
            if mse > last_mse * 1.1 {
                break;
            }
            last_mse = mse;
        }

        // Max iterations reached: accept if the final alignment is good enough.
        let correspondences =
            self.find_correspondences(reference, target, &reference_tree, &estimate);
        let final_mse = Self::compute_mse(&correspondences);
        if correspondences.len() >= self.config.min_correspondences
            && final_mse < self.config.acceptable_mse
        {
            Ok(from_isometry(&estimate))
        } else {
            Err(RegistrationError::NotConverged {
                iterations,
                mse: final_mse,
            })
        }
    }

    fn profile(&self) -> &str {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::matching::test_utils::create_trefoil;
    use crate::core::types::Point3D;
    use approx::assert_relative_eq;

    fn assert_recovers(result: &RigidTransform, expected: &RigidTransform) {
        let (t, [roll, pitch, yaw]) = result.decompose();
        let (et, [eroll, epitch, eyaw]) = expected.decompose();
        assert_relative_eq!(t.x, et.x, epsilon = 0.01);
        assert_relative_eq!(t.y, et.y, epsilon = 0.01);
        assert_relative_eq!(t.z, et.z, epsilon = 0.01);
        assert_relative_eq!(roll, eroll, epsilon = 0.01);
        assert_relative_eq!(pitch, epitch, epsilon = 0.01);
        assert_relative_eq!(yaw, eyaw, epsilon = 0.01);
    }

    #[test]
    fn test_identity_transform() {
        let cloud = create_trefoil(600, 0.5);
        let icp = PointToPointIcp::new(IcpConfig::default());

        let result = icp
            .register(&cloud, &cloud, &RigidTransform::identity())
            .unwrap();
        assert_recovers(&result, &RigidTransform::identity());
    }

    #[test]
    fn test_small_motion() {
        let target = create_trefoil(600, 0.5);
        let truth = RigidTransform::from_translation_rpy(0.04, -0.03, 0.02, 0.02, -0.01, 0.05);
        let reference = target.transform(&truth);

        let icp = PointToPointIcp::new(IcpConfig::default());
        let result = icp
            .register(&reference, &target, &RigidTransform::identity())
            .unwrap();
        assert_recovers(&result, &truth);
    }

    #[test]
    fn test_with_initial_guess() {
        let target = create_trefoil(600, 0.5);
        let truth = RigidTransform::from_translation_rpy(0.3, 0.2, 0.0, 0.0, 0.0, 0.15);
        let reference = target.transform(&truth);
        let guess = RigidTransform::from_translation_rpy(0.27, 0.18, 0.0, 0.0, 0.0, 0.12);

        let icp = PointToPointIcp::new(IcpConfig::default());
        let result = icp.register(&reference, &target, &guess).unwrap();
        assert_recovers(&result, &truth);
    }

    #[test]
    fn test_empty_clouds() {
        let cloud = create_trefoil(100, 0.5);
        let icp = PointToPointIcp::new(IcpConfig::default());
        let guess = RigidTransform::identity();

        assert_eq!(
            icp.register(&PointCloud3D::new(), &cloud, &guess),
            Err(RegistrationError::EmptyCloud)
        );
        assert_eq!(
            icp.register(&cloud, &PointCloud3D::new(), &guess),
            Err(RegistrationError::EmptyCloud)
        );
    }

    #[test]
    fn test_too_few_correspondences() {
        let reference = PointCloud3D::from_points(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.1, 0.2),
            Point3D::new(0.3, 1.0, 0.4),
        ]);
        let icp = PointToPointIcp::new(IcpConfig::default());
        let result = icp.register(&reference, &reference, &RigidTransform::identity());
        assert!(matches!(
            result,
            Err(RegistrationError::InsufficientCorrespondences { found: 3, .. })
        ));
    }

    #[test]
    fn test_profile() {
        let icp = PointToPointIcp::new(IcpConfig::default()).with_profile("indoor-fine");
        assert_eq!(icp.profile(), "indoor-fine");
        assert_eq!(icp.config().max_iterations, 50);
    }
}
