//! Utility maths functions
//!
//! Angles handled by the navigation software are in degrees, clockwise from the sensor zero.
//! Every comparison between two headings goes through [`signed_delta_deg`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Length of a vector sum below which the mean direction is considered undefined.
const MEAN_VECTOR_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Normalise an angle in degrees into [0, 360).
pub fn norm_deg(angle_deg: f64) -> f64 {
    let n = rem_euclid(angle_deg, 360.0);

    // Round-off can produce exactly 360 for tiny negative inputs
    if n >= 360.0 {
        0.0
    } else {
        n
    }
}

/// Shortest signed rotation (degrees) taking `current_deg` onto `target_deg`.
///
/// The result is in (-180, 180]. An exact half turn resolves to +180. Positive values are
/// clockwise.
pub fn signed_delta_deg(target_deg: f64, current_deg: f64) -> f64 {
    let d = norm_deg(target_deg - current_deg);

    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Circular (vector) mean of a set of angles in degrees, expressed in [0, 360).
///
/// Returns `None` for an empty input, or when the unit vectors cancel out so that no mean
/// direction exists (for example `[0, 180]`).
pub fn circular_mean_deg(angles_deg: &[f64]) -> Option<f64> {
    if angles_deg.is_empty() {
        return None;
    }

    let sum: Vector2<f64> = angles_deg
        .iter()
        .map(|a| {
            let r = a.to_radians();
            Vector2::new(r.cos(), r.sin())
        })
        .sum();

    if sum.norm() < MEAN_VECTOR_EPSILON * angles_deg.len() as f64 {
        return None;
    }

    Some(norm_deg(sum.y.atan2(sum.x).to_degrees()))
}

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-9;

    /// Angular distance ignoring sign, for comparing headings near the wrap.
    fn ang_err(a: f64, b: f64) -> f64 {
        signed_delta_deg(a, b).abs()
    }

    #[test]
    fn test_norm_deg() {
        assert_eq!(norm_deg(0.0), 0.0);
        assert_eq!(norm_deg(360.0), 0.0);
        assert_eq!(norm_deg(-90.0), 270.0);
        assert_eq!(norm_deg(725.0), 5.0);
        assert!(norm_deg(-1e-20) < 360.0);
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta_deg(90.0, 0.0), 90.0);
        assert_eq!(signed_delta_deg(0.0, 90.0), -90.0);
        assert_eq!(signed_delta_deg(10.0, 350.0), 20.0);
        assert_eq!(signed_delta_deg(350.0, 10.0), -20.0);
        assert_eq!(signed_delta_deg(45.0, 45.0), 0.0);
    }

    #[test]
    fn test_signed_delta_half_turn() {
        assert_eq!(signed_delta_deg(180.0, 0.0), 180.0);
        assert_eq!(signed_delta_deg(0.0, 180.0), 180.0);
        assert_eq!(signed_delta_deg(270.0, 90.0), 180.0);
    }

    #[test]
    fn test_signed_delta_range_and_antisymmetry() {
        let mut t = 0.0;
        while t < 360.0 {
            let mut c = 0.0;
            while c < 360.0 {
                let d = signed_delta_deg(t, c);
                assert!(d > -180.0 && d <= 180.0, "delta({}, {}) = {}", t, c, d);

                if d != 180.0 {
                    assert!((d + signed_delta_deg(c, t)).abs() < EPS);
                }
                c += 7.5;
            }
            t += 12.5;
        }
    }

    #[test]
    fn test_circular_mean() {
        assert!(ang_err(circular_mean_deg(&[0.0, 90.0]).unwrap(), 45.0) < EPS);
        assert!(ang_err(circular_mean_deg(&[350.0, 10.0]).unwrap(), 0.0) < EPS);
        assert!(ang_err(circular_mean_deg(&[10.0, 350.0]).unwrap(), 0.0) < EPS);
        assert!(ang_err(circular_mean_deg(&[200.0]).unwrap(), 200.0) < EPS);
        assert!(ang_err(circular_mean_deg(&[170.0, 190.0, 180.0]).unwrap(), 180.0) < 1e-6);
    }

    #[test]
    fn test_circular_mean_undefined() {
        assert_eq!(circular_mean_deg(&[]), None);
        assert_eq!(circular_mean_deg(&[0.0, 180.0]), None);
    }

    #[test]
    fn test_lin_map_and_clamp() {
        assert!((lin_map((0.0, 180.0), (0.0, 0.2), 90.0) - 0.1).abs() < EPS);
        assert_eq!(clamp(&5.0, &0.0, &1.0), 1.0);
        assert_eq!(clamp(&-5.0, &0.0, &1.0), 0.0);
    }
}
