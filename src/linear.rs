//! Gravity projection and linear acceleration

use crate::types::Orientation;
use nalgebra::Vector3;

/// Gravity as measured by the accelerometer of a device at `orientation`
///
/// `gravity * [-cos(pitch) * sin(roll), -sin(pitch), cos(pitch) * cos(roll)]`.
/// Azimuth does not affect the projection.
pub fn gravity_in_device_frame(orientation: &Orientation, gravity: f32) -> Vector3<f32> {
    let (sin_pitch, cos_pitch) = orientation.pitch.sin_cos();
    let (sin_roll, cos_roll) = orientation.roll.sin_cos();

    Vector3::new(
        -cos_pitch * sin_roll,
        -sin_pitch,
        cos_pitch * cos_roll,
    ) * gravity
}

/// Acceleration with the gravity component removed
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use orientation_fusion::{Orientation, linear::linear_acceleration};
///
/// let level = Orientation::default();
/// let linear = linear_acceleration(&level, Vector3::new(0.5, 0.0, 9.81), 9.81);
/// assert!((linear - Vector3::new(0.5, 0.0, 0.0)).norm() < 1e-6);
/// ```
pub fn linear_acceleration(
    orientation: &Orientation,
    acceleration: Vector3<f32>,
    gravity: f32,
) -> Vector3<f32> {
    acceleration - gravity_in_device_frame(orientation, gravity)
}
