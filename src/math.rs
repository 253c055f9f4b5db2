//! Rotation math kernel shared by the tilt estimator, the gyroscope
//! integrator and both fusion strategies
//!
//! Matrix product and sum are nalgebra's `Matrix3` operators. Indexing
//! `m[(row, col)]` corresponds to element `R[3 * row + col]` of the row-major
//! layout used by mobile sensor APIs.

use crate::types::Orientation;
use core::f32::consts::{PI, TAU};
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

/// Angular speed below which the gyroscope axis is left unnormalized
pub const EPSILON: f32 = 1e-9;

/// Nanosecond to second conversion
pub const NANOS_TO_SECONDS: f64 = 1e-9;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Normalize the vector, returning zero vector if magnitude is zero
    fn safe_normalize(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn safe_normalize(&self) -> Vector3<f32> {
        let mag = self.magnitude();
        if mag > 0.0 {
            *self / mag
        } else {
            Vector3::zeros()
        }
    }
}

/// Build the rotation matrix for an orientation
///
/// The composite rotation is `Rz(azimuth) * (Rx(pitch) * Ry(roll))`, using
/// the transposed basic rotations of the platform convention. This is the
/// exact inverse of [`orientation_from_rotation_matrix`] away from gimbal
/// lock.
pub fn rotation_matrix_from_orientation(orientation: &Orientation) -> Matrix3<f32> {
    let (sin_x, cos_x) = orientation.pitch.sin_cos();
    let (sin_y, cos_y) = orientation.roll.sin_cos();
    let (sin_z, cos_z) = orientation.azimuth.sin_cos();

    // rotation about x-axis (pitch)
    let x_matrix = Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, cos_x, sin_x, //
        0.0, -sin_x, cos_x,
    );

    // rotation about y-axis (roll)
    let y_matrix = Matrix3::new(
        cos_y, 0.0, sin_y, //
        0.0, 1.0, 0.0, //
        -sin_y, 0.0, cos_y,
    );

    // rotation about z-axis (azimuth)
    let z_matrix = Matrix3::new(
        cos_z, sin_z, 0.0, //
        -sin_z, cos_z, 0.0, //
        0.0, 0.0, 1.0,
    );

    z_matrix * (x_matrix * y_matrix)
}

/// Decompose a rotation matrix into azimuth, pitch and roll
///
/// Uses the platform-standard decomposition:
/// `azimuth = atan2(R01, R11)`, `pitch = asin(-R21)`, `roll = atan2(-R20, R22)`.
/// The `asin` argument is clamped so a slightly non-orthonormal matrix still
/// yields finite angles.
pub fn orientation_from_rotation_matrix(matrix: &Matrix3<f32>) -> Orientation {
    Orientation {
        azimuth: matrix[(0, 1)].atan2(matrix[(1, 1)]),
        pitch: (-matrix[(2, 1)]).clamp(-1.0, 1.0).asin(),
        roll: (-matrix[(2, 0)]).atan2(matrix[(2, 2)]),
    }
}

/// Unit quaternion for the rotation accumulated over one gyroscope interval
///
/// The rotation angle is `|ω| * delta_time` about the axis `ω / |ω|`. When
/// `|ω|` does not exceed [`EPSILON`] the axis is left unnormalized, which
/// keeps the vector part negligible instead of dividing by zero.
pub fn delta_quaternion(angular_velocity: Vector3<f32>, delta_time: f32) -> UnitQuaternion<f32> {
    let omega_magnitude = angular_velocity.magnitude();

    let axis = if omega_magnitude > EPSILON {
        angular_velocity / omega_magnitude
    } else {
        angular_velocity
    };

    let theta_over_two = omega_magnitude * delta_time / 2.0;
    let (sin_theta_over_two, cos_theta_over_two) = theta_over_two.sin_cos();

    let vector = axis * sin_theta_over_two;
    UnitQuaternion::new_unchecked(Quaternion::new(
        cos_theta_over_two,
        vector.x,
        vector.y,
        vector.z,
    ))
}

/// Incremental rotation matrix for one gyroscope interval
pub fn delta_rotation(angular_velocity: Vector3<f32>, delta_time: f32) -> Matrix3<f32> {
    delta_quaternion(angular_velocity, delta_time)
        .to_rotation_matrix()
        .into_inner()
}

/// Complementary blend of two rotation matrices: `alpha * gyro + (1 - alpha) * tilt`
///
/// The result is not re-orthonormalized, so it is only approximately a
/// rotation. See [`orthonormality_error`].
pub fn blend_matrices(gyro: &Matrix3<f32>, tilt: &Matrix3<f32>, alpha: f32) -> Matrix3<f32> {
    gyro * alpha + tilt * (1.0 - alpha)
}

/// Normalize an angle into (-π, π]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Frobenius norm of `Rᵀ R - I`; zero for a proper rotation matrix
pub fn orthonormality_error(matrix: &Matrix3<f32>) -> f32 {
    (matrix.transpose() * matrix - Matrix3::identity()).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    const TOLERANCE: f32 = 1e-5;

    fn assert_orientation_eq(actual: Orientation, expected: Orientation) {
        let error = (actual.to_vector() - expected.to_vector()).abs().max();
        assert!(
            error < 1e-4,
            "expected {:?}, got {:?} (error {})",
            expected,
            actual,
            error
        );
    }

    #[test]
    fn test_vector_extensions() {
        let v = Vector3::new(3.0f32, 4.0, 0.0);
        let normalized = v.safe_normalize();
        assert!((normalized.magnitude() - 1.0).abs() < 1e-6);

        assert_eq!(Vector3::<f32>::zeros().safe_normalize(), Vector3::zeros());
    }

    #[test]
    fn test_identity_orientation() {
        let matrix = rotation_matrix_from_orientation(&Orientation::default());
        assert!((matrix - Matrix3::identity()).norm() < TOLERANCE);

        let orientation = orientation_from_rotation_matrix(&Matrix3::identity());
        assert_eq!(orientation, Orientation::default());
    }

    #[test]
    fn test_orientation_round_trip() {
        let cases = [
            Orientation::new(0.5, 0.2, -0.3),
            Orientation::new(-2.9, -1.2, 2.5),
            Orientation::new(3.0, 0.0, PI - 0.01),
            Orientation::new(-PI + 0.01, 1.3, -2.0),
        ];

        for orientation in cases {
            let matrix = rotation_matrix_from_orientation(&orientation);
            assert!(orthonormality_error(&matrix) < TOLERANCE);
            assert_orientation_eq(orientation_from_rotation_matrix(&matrix), orientation);
        }
    }

    #[test]
    fn test_composition_order() {
        // Rz * (Rx * Ry), not (Rz * Rx) * Ry with swapped factors
        let orientation = Orientation::new(0.4, 0.3, 0.2);
        let matrix = rotation_matrix_from_orientation(&orientation);

        let (sx, cx) = orientation.pitch.sin_cos();
        let (sy, cy) = orientation.roll.sin_cos();
        let (sz, cz) = orientation.azimuth.sin_cos();

        assert!((matrix[(0, 1)] - sz * cx).abs() < TOLERANCE);
        assert!((matrix[(1, 1)] - cz * cx).abs() < TOLERANCE);
        assert!((matrix[(2, 0)] + cx * sy).abs() < TOLERANCE);
        assert!((matrix[(2, 1)] + sx).abs() < TOLERANCE);
        assert!((matrix[(2, 2)] - cx * cy).abs() < TOLERANCE);
        assert!((matrix[(0, 0)] - (cz * cy - sz * sx * sy)).abs() < TOLERANCE);
    }

    #[test]
    fn test_pitch_clamped_for_drifted_matrix() {
        let mut matrix = rotation_matrix_from_orientation(&Orientation::new(0.0, -FRAC_PI_2, 0.0));
        matrix[(2, 1)] = 1.0001;

        let orientation = orientation_from_rotation_matrix(&matrix);
        assert!(orientation.pitch.is_finite());
        assert!((orientation.pitch + FRAC_PI_2).abs() < TOLERANCE);
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let q = delta_quaternion(Vector3::zeros(), 0.5);
        assert_eq!(q.w, 1.0);
        assert_eq!(q.i, 0.0);
        assert_eq!(q.j, 0.0);
        assert_eq!(q.k, 0.0);

        let matrix = delta_rotation(Vector3::zeros(), 10.0);
        assert_eq!(matrix, Matrix3::identity());
    }

    #[test]
    fn test_tiny_rate_does_not_divide_by_zero() {
        let q = delta_quaternion(Vector3::new(1e-12, 0.0, 0.0), 0.01);
        assert!(q.w.is_finite() && q.i.is_finite());
        assert!((q.w - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_delta_quaternion_angle() {
        // 2 rad/s about Z for 0.25 s -> 0.5 rad
        let q = delta_quaternion(Vector3::new(0.0, 0.0, 2.0), 0.25);
        assert!((q.angle() - 0.5).abs() < TOLERANCE);
        assert!((q.w - 0.25f32.cos()).abs() < TOLERANCE);
        assert!((q.k - 0.25f32.sin()).abs() < TOLERANCE);

        // Axis does not depend on the rate magnitude
        let axis = q.axis().map(|a| a.into_inner()).unwrap_or_else(Vector3::zeros);
        assert!((axis - Vector3::z()).norm() < TOLERANCE);
    }

    #[test]
    fn test_delta_rotation_about_z() {
        let matrix = delta_rotation(Vector3::new(0.0, 0.0, 1.0), 0.1);
        let (s, c) = 0.1f32.sin_cos();
        let expected = Matrix3::new(
            c, -s, 0.0, //
            s, c, 0.0, //
            0.0, 0.0, 1.0,
        );
        assert!((matrix - expected).norm() < TOLERANCE);

        // Positive rotation about Z turns the compass azimuth the other way
        let orientation = orientation_from_rotation_matrix(&matrix);
        assert!((orientation.azimuth + 0.1).abs() < TOLERANCE);
    }

    #[test]
    fn test_blend_matrices() {
        let gyro = rotation_matrix_from_orientation(&Orientation::new(0.2, 0.0, 0.0));
        let tilt = Matrix3::identity();

        assert_eq!(blend_matrices(&gyro, &tilt, 1.0), gyro);
        assert_eq!(blend_matrices(&gyro, &tilt, 0.0), tilt);

        let blended = blend_matrices(&gyro, &tilt, 0.5);
        assert!((blended - (gyro + tilt) * 0.5).norm() < TOLERANCE);

        // Averaging two distinct rotations shrinks the basis vectors
        assert!(orthonormality_error(&blended) > 1e-4);
        let azimuth = orientation_from_rotation_matrix(&blended).azimuth;
        assert!((azimuth - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(0.5), 0.5);
        assert_eq!(wrap_angle(PI), PI);
        assert!((wrap_angle(3.2) - (3.2 - TAU)).abs() < TOLERANCE);
        assert!((wrap_angle(-3.2) - (TAU - 3.2)).abs() < TOLERANCE);
        assert!((wrap_angle(7.0 * TAU + 0.25) - 0.25).abs() < 1e-4);
        assert!(wrap_angle(-PI) > 0.0);
    }
}
