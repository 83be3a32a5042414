//! Engine reference frames.
//!
//! The ullage envelope is expressed in an engine frame whose `+y` axis points
//! along the engine's thrust, i.e. the direction the engine pushes the
//! vehicle. Vehicle-frame vectors are brought into it with a fixed rotation.

use nalgebra::{UnitQuaternion, Vector3};

const DEGENERATE_AXIS: f64 = 1e-9;

/// Rotation taking `from` onto `to`, including the antiparallel case.
///
/// Returns `None` if either vector is (near) zero.
pub fn from_to_rotation(from: &Vector3<f64>, to: &Vector3<f64>) -> Option<UnitQuaternion<f64>> {
    let a = from.try_normalize(DEGENERATE_AXIS)?;
    let b = to.try_normalize(DEGENERATE_AXIS)?;
    if let Some(rotation) = UnitQuaternion::rotation_between(&a, &b) {
        return Some(rotation);
    }
    // Antiparallel: half turn about any axis perpendicular to `a`.
    let helper = if a.x.abs() < 0.9 { Vector3::x() } else { Vector3::z() };
    let axis = nalgebra::Unit::new_normalize(a.cross(&helper));
    Some(UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI))
}

/// Rotation from the vehicle frame into an engine frame whose `+y` is
/// `thrust_axis`. A degenerate axis yields the identity.
pub fn engine_frame(thrust_axis: &Vector3<f64>) -> UnitQuaternion<f64> {
    from_to_rotation(thrust_axis, &Vector3::y()).unwrap_or_else(UnitQuaternion::identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn test_aligned_axis_is_identity() {
        let r = engine_frame(&Vector3::new(0.0, 2.0, 0.0));
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert!(close(&(r * v), &v));
    }

    #[test]
    fn test_sideways_axis_maps_to_up() {
        let r = engine_frame(&Vector3::x());
        assert!(close(&(r * Vector3::x()), &Vector3::y()));
    }

    #[test]
    fn test_antiparallel_axis() {
        let r = engine_frame(&Vector3::new(0.0, -1.0, 0.0));
        assert!(close(&(r * Vector3::new(0.0, -1.0, 0.0)), &Vector3::y()));
        assert!(close(&(r * Vector3::y()), &Vector3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn test_degenerate_axis_is_identity() {
        assert_eq!(engine_frame(&Vector3::zeros()), UnitQuaternion::identity());
        assert!(from_to_rotation(&Vector3::zeros(), &Vector3::y()).is_none());
    }
}
