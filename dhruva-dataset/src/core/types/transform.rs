//! Rigid transforms in 3D and the pose algebra used by the trajectory.
//!
//! # Conventions
//!
//! Poses and increments live in the same global frame. Composition adds
//! translations and left-multiplies the increment's rotation onto the base:
//!
//! ```text
//! C = compose(A, B):
//!   C.t = A.t + B.t
//!   C.R = B.R · A.R
//!
//! D = difference(S, E):
//!   D.t = E.t - S.t
//!   D.R = E.R · S.Rᵀ
//!
//! compose(S, difference(S, E)) == E
//! ```
//!
//! Euler angles are roll-pitch-yaw about fixed X, Y, Z axes:
//! `R = Rz(yaw) · Ry(pitch) · Rx(roll)`. The same convention is used by the
//! odometry record files and by [`RigidTransform::from_translation_rpy`].

use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, UnitQuaternion, Vector3};

use crate::core::math::normalize_angle;

/// Tolerance used when comparing transforms for approximate equality.
pub const TRANSFORM_EPSILON: f64 = 1e-9;

/// Rotation plus translation, exposed as a homogeneous 4×4 matrix.
///
/// The rotation is stored as a unit quaternion and renormalized after every
/// algebraic operation, so the rotation block of [`RigidTransform::matrix`]
/// is orthonormal with determinant +1 wherever it is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    rotation: UnitQuaternion<f64>,
    translation: Vector3<f64>,
}

impl RigidTransform {
    /// Identity transform.
    #[inline]
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Create from a rotation and translation.
    #[inline]
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        let mut rotation = rotation;
        rotation.renormalize();
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    #[inline]
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::new(x, y, z),
        }
    }

    /// Build from translation and roll/pitch/yaw (radians).
    ///
    /// Exact inverse of [`RigidTransform::decompose`].
    pub fn from_translation_rpy(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            rotation: UnitQuaternion::from_euler_angles(roll, pitch, yaw),
            translation: Vector3::new(x, y, z),
        }
    }

    /// Build from a homogeneous matrix.
    ///
    /// The upper-left 3×3 block is projected onto the nearest rotation, so
    /// scale, shear or accumulated floating error is removed rather than
    /// rejected. The bottom row is ignored.
    pub fn from_matrix(matrix: &Matrix4<f64>) -> Self {
        let block: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let rotation = Rotation3::from_matrix(&block);
        Self {
            rotation: UnitQuaternion::from_rotation_matrix(&rotation),
            translation: matrix.fixed_view::<3, 1>(0, 3).into_owned(),
        }
    }

    /// Homogeneous 4×4 representation.
    pub fn matrix(&self) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(self.rotation.to_rotation_matrix().matrix());
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }

    /// Rotation component.
    #[inline]
    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    /// Translation component.
    #[inline]
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Apply `increment` after `self` in the global frame.
    #[inline]
    pub fn compose(&self, increment: &RigidTransform) -> RigidTransform {
        RigidTransform::new(
            increment.rotation * self.rotation,
            self.translation + increment.translation,
        )
    }

    /// Relative transform taking `self` to `end`.
    ///
    /// `self.compose(&self.difference(end)) == *end` up to floating tolerance.
    #[inline]
    pub fn difference(&self, end: &RigidTransform) -> RigidTransform {
        RigidTransform::new(
            end.rotation * self.rotation.inverse(),
            end.translation - self.translation,
        )
    }

    /// Inverse under [`RigidTransform::compose`].
    #[inline]
    pub fn inverse(&self) -> RigidTransform {
        RigidTransform::new(self.rotation.inverse(), -self.translation)
    }

    /// Translation and `[roll, pitch, yaw]`.
    ///
    /// Roll and yaw are in (-π, π], pitch in [-π/2, π/2].
    pub fn decompose(&self) -> (Vector3<f64>, [f64; 3]) {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        (
            self.translation,
            [normalize_angle(roll), pitch, normalize_angle(yaw)],
        )
    }

    /// Euclidean distance between the translation components.
    #[inline]
    pub fn positional_distance(&self, other: &RigidTransform) -> f64 {
        (self.translation - other.translation).norm()
    }

    /// Transform a point: `R·p + t`.
    #[inline]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    /// Re-express this global-frame increment in the axes of `frame`.
    ///
    /// Only `frame`'s rotation is used: `R' = Fᵀ·R·F`, `t' = Fᵀ·t`. For an
    /// increment between two poses this is the motion seen from the sensor
    /// at `frame`, the convention registration engines work in.
    pub fn in_frame_of(&self, frame: &RigidTransform) -> RigidTransform {
        let f = frame.rotation;
        RigidTransform::new(
            f.inverse() * self.rotation * f,
            f.inverse() * self.translation,
        )
    }

    /// Inverse of [`RigidTransform::in_frame_of`].
    pub fn from_frame_of(&self, frame: &RigidTransform) -> RigidTransform {
        let f = frame.rotation;
        RigidTransform::new(f * self.rotation * f.inverse(), f * self.translation)
    }

    /// Rotate by `angle` radians about the vertical (Z) axis, leaving
    /// the translation untouched.
    ///
    /// The extra rotation is left-multiplied: `R' = Rz(angle) · R`.
    pub fn rotated_about_z(&self, angle: f64) -> RigidTransform {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle);
        RigidTransform::new(yaw * self.rotation, self.translation)
    }

    /// Angle (radians) of the rotation taking `self`'s orientation to `other`'s.
    pub fn rotation_angle_to(&self, other: &RigidTransform) -> f64 {
        // atan2 form stays accurate near zero, where acos(w) does not.
        let delta = self.rotation.inverse() * other.rotation;
        2.0 * delta.imag().norm().atan2(delta.scalar().abs())
    }

    /// Approximate equality on translation and rotation angle.
    pub fn approx_eq(&self, other: &RigidTransform, epsilon: f64) -> bool {
        self.positional_distance(other) <= epsilon && self.rotation_angle_to(other) <= epsilon
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// `compose(base, increment)` as a free function.
#[inline]
pub fn compose(base: &RigidTransform, increment: &RigidTransform) -> RigidTransform {
    base.compose(increment)
}

/// `difference(start, end)` as a free function.
#[inline]
pub fn difference(start: &RigidTransform, end: &RigidTransform) -> RigidTransform {
    start.difference(end)
}

/// `decompose(transform)` as a free function.
#[inline]
pub fn decompose(transform: &RigidTransform) -> (Vector3<f64>, [f64; 3]) {
    transform.decompose()
}

/// `positional_distance(a, b)` as a free function.
#[inline]
pub fn positional_distance(a: &RigidTransform, b: &RigidTransform) -> f64 {
    a.positional_distance(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn sample_transforms() -> Vec<RigidTransform> {
        vec![
            RigidTransform::identity(),
            RigidTransform::from_translation(1.0, 0.0, 0.0),
            RigidTransform::from_translation_rpy(1.0, 2.0, 3.0, 0.1, -0.2, 0.3),
            RigidTransform::from_translation_rpy(-4.0, 0.5, 0.0, 0.0, 0.0, PI - 0.01),
            RigidTransform::from_translation_rpy(0.3, -7.0, 1.5, -1.2, 0.7, -2.9),
            RigidTransform::from_translation_rpy(10.0, 10.0, -1.0, 2.5, -1.4, 1.1),
        ]
    }

    fn assert_transform_eq(a: &RigidTransform, b: &RigidTransform) {
        assert!(
            a.approx_eq(b, TRANSFORM_EPSILON),
            "transforms differ:\n{:?}\n{:?}",
            a.matrix(),
            b.matrix()
        );
    }

    #[test]
    fn test_compose_identity_is_neutral() {
        for t in sample_transforms() {
            assert_transform_eq(&t.compose(&RigidTransform::identity()), &t);
            assert_transform_eq(&RigidTransform::identity().compose(&t), &t);
        }
    }

    #[test]
    fn test_difference_roundtrip() {
        let samples = sample_transforms();
        for a in &samples {
            for b in &samples {
                let d = difference(a, b);
                assert_transform_eq(&compose(a, &d), b);
            }
        }
    }

    #[test]
    fn test_compose_is_associative() {
        let samples = sample_transforms();
        for a in &samples {
            for b in &samples {
                for c in &samples {
                    let left = compose(&compose(a, b), c);
                    let right = compose(a, &compose(b, c));
                    assert_transform_eq(&left, &right);
                }
            }
        }
    }

    #[test]
    fn test_inverse_cancels() {
        for t in sample_transforms() {
            assert_transform_eq(&t.compose(&t.inverse()), &RigidTransform::identity());
        }
    }

    #[test]
    fn test_compose_rotation_order() {
        // Increment rotation is applied after the base rotation.
        let base = RigidTransform::from_translation_rpy(0.0, 0.0, 0.0, FRAC_PI_2, 0.0, 0.0);
        let inc = RigidTransform::from_translation_rpy(0.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2);
        let composed = base.compose(&inc);

        let expected = inc.rotation().to_rotation_matrix() * base.rotation().to_rotation_matrix();
        let actual = composed.rotation().to_rotation_matrix();
        assert_relative_eq!(*actual.matrix(), *expected.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_translation_adds() {
        let base = RigidTransform::from_translation_rpy(1.0, 2.0, 3.0, 0.0, 0.0, FRAC_PI_2);
        let inc = RigidTransform::from_translation(1.0, 0.0, 0.0);
        let composed = base.compose(&inc);
        assert_relative_eq!(composed.translation().x, 2.0);
        assert_relative_eq!(composed.translation().y, 2.0);
        assert_relative_eq!(composed.translation().z, 3.0);
    }

    #[test]
    fn test_decompose_roundtrip() {
        for t in sample_transforms() {
            let (translation, [roll, pitch, yaw]) = t.decompose();
            let rebuilt = RigidTransform::from_translation_rpy(
                translation.x,
                translation.y,
                translation.z,
                roll,
                pitch,
                yaw,
            );
            assert_transform_eq(&rebuilt, &t);
        }
    }

    #[test]
    fn test_decompose_known_angles() {
        let t = RigidTransform::from_translation_rpy(1.0, 2.0, 3.0, 0.1, -0.2, 0.3);
        let (translation, [roll, pitch, yaw]) = t.decompose();
        assert_relative_eq!(translation.x, 1.0);
        assert_relative_eq!(translation.y, 2.0);
        assert_relative_eq!(translation.z, 3.0);
        assert_relative_eq!(roll, 0.1, epsilon = 1e-12);
        assert_relative_eq!(pitch, -0.2, epsilon = 1e-12);
        assert_relative_eq!(yaw, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_yaw_matches_fixed_z_rotation() {
        let t = RigidTransform::from_translation_rpy(0.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2);
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_roundtrip() {
        for t in sample_transforms() {
            assert_transform_eq(&RigidTransform::from_matrix(&t.matrix()), &t);
        }
    }

    #[test]
    fn test_matrix_rotation_block_is_orthonormal() {
        let t = RigidTransform::from_translation_rpy(0.3, -7.0, 1.5, -1.2, 0.7, -2.9);
        let m = t.matrix();
        let r: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_matrix_renormalizes_drifted_rotation() {
        let t = RigidTransform::from_translation_rpy(1.0, 2.0, 3.0, 0.2, 0.1, -0.4);
        let mut m = t.matrix();
        // Perturb the rotation block so it is no longer orthonormal.
        m[(0, 0)] *= 1.01;
        m[(1, 2)] += 0.005;

        let fixed = RigidTransform::from_matrix(&m);
        let r: Matrix3<f64> = fixed.matrix().fixed_view::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-9);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-9);
        assert!(fixed.approx_eq(&t, 0.02));
        assert_relative_eq!(fixed.translation().z, 3.0);
    }

    #[test]
    fn test_repeated_composition_stays_orthonormal() {
        let step = RigidTransform::from_translation_rpy(0.1, 0.0, 0.0, 0.013, -0.007, 0.021);
        let mut pose = RigidTransform::identity();
        for _ in 0..10_000 {
            pose = pose.compose(&step);
        }
        assert_relative_eq!(pose.rotation().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pose.translation().x, 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_positional_distance_ignores_rotation() {
        let a = RigidTransform::from_translation_rpy(0.0, 0.0, 0.0, 1.0, 0.5, 2.0);
        let b = RigidTransform::from_translation(3.0, 4.0, 0.0);
        assert_relative_eq!(positional_distance(&a, &b), 5.0);
        assert_relative_eq!(positional_distance(&b, &a), 5.0);
    }

    #[test]
    fn test_frame_change_roundtrip() {
        let frame = RigidTransform::from_translation_rpy(5.0, 5.0, 5.0, 0.3, -0.4, 2.0);
        for t in sample_transforms() {
            assert_transform_eq(&t.in_frame_of(&frame).from_frame_of(&frame), &t);
        }
    }

    #[test]
    fn test_in_frame_of_gives_sensor_motion() {
        // Facing +y and driving forward: the sensor sees motion along its own x.
        let start = RigidTransform::from_translation_rpy(1.0, 1.0, 0.0, 0.0, 0.0, FRAC_PI_2);
        let end = RigidTransform::from_translation_rpy(1.0, 1.5, 0.0, 0.0, 0.0, FRAC_PI_2 + 0.1);
        let local = start.difference(&end).in_frame_of(&start);

        assert_relative_eq!(local.translation().x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(local.translation().y, 0.0, epsilon = 1e-12);
        let (_, [_, _, yaw]) = local.decompose();
        assert_relative_eq!(yaw, 0.1, epsilon = 1e-12);

        // Matches the body-frame relative pose start⁻¹·end.
        let body = start.matrix().try_inverse().unwrap() * end.matrix();
        assert_transform_eq(&local, &RigidTransform::from_matrix(&body));
    }

    #[test]
    fn test_rotated_about_z_keeps_translation() {
        let t = RigidTransform::from_translation_rpy(1.0, 2.0, 3.0, 0.0, 0.0, 0.5);
        let rotated = t.rotated_about_z(0.2);
        assert_eq!(rotated.translation(), t.translation());
        let (_, [_, _, yaw]) = rotated.decompose();
        assert_relative_eq!(yaw, 0.7, epsilon = 1e-12);
    }
}
