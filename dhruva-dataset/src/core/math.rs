//! Mathematical primitives for pose bookkeeping.
//!
//! Angle normalization and text-output helpers.

use std::f64::consts::PI;

/// Normalize angle to (-π, π].
///
/// # Example
/// ```
/// use dhruva_dataset::core::math::normalize_angle;
/// use std::f64::consts::PI;
///
/// assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-9);
/// assert!((normalize_angle(-PI) - PI).abs() < 1e-9);
/// ```
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Replace negative zero with positive zero.
///
/// Keeps text output free of `-0` for values that are exactly zero.
#[inline]
pub fn canonical_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle_zero() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn test_normalize_angle_boundary() {
        assert_relative_eq!(normalize_angle(PI), PI);
        assert_relative_eq!(normalize_angle(-PI), PI);
    }

    #[test]
    fn test_normalize_angle_wrap() {
        assert_relative_eq!(normalize_angle(2.0 * PI), 0.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-3.0 * PI + 0.1), -PI + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_canonical_zero() {
        assert!(canonical_zero(-0.0).is_sign_positive());
        assert_eq!(canonical_zero(-1.5), -1.5);
    }

    #[test]
    fn test_normalize_handles_nan() {
        assert!(normalize_angle(f64::NAN).is_nan());
    }
}
