//! Tilt/heading estimation from accelerometer and magnetometer readings
//!
//! Builds the device-to-Earth rotation matrix from gravity and the magnetic
//! field using cross products, the same way mobile sensor platforms derive
//! their rotation matrix:
//!
//! ```text
//! H = m × a          (points East)
//! M = a × H          (points magnetic North)
//! R = [ H/|H| ; M ; a/|a| ]   (rows)
//! ```

use crate::error::{FusionError, Result};
use crate::math::{Vector3Ext, orientation_from_rotation_matrix};
use crate::types::{FusionSettings, Orientation};
use nalgebra::{Matrix3, Vector3};

/// Orientation derived from a single accelerometer/magnetometer pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltEstimate {
    /// Device-to-Earth rotation matrix
    pub rotation_matrix: Matrix3<f32>,
    /// Euler decomposition of `rotation_matrix`
    pub orientation: Orientation,
}

impl TiltEstimate {
    /// Tilt-compensated compass heading in degrees, 0° = magnetic north,
    /// 90° = east (range: -180° to +180°)
    pub fn heading_degrees(&self) -> f32 {
        self.orientation.azimuth.to_degrees()
    }
}

/// Estimate orientation from gravity and the magnetic field
///
/// # Arguments
/// * `acceleration` - Accelerometer reading in m/s² (ideally smoothed upstream)
/// * `magnetic` - Magnetometer reading in µT
/// * `settings` - Gravity and degeneracy thresholds
///
/// # Errors
/// * [`FusionError::FreeFall`] when the acceleration magnitude is below
///   `free_fall_gravity_ratio * gravity`
/// * [`FusionError::CollinearField`] when gravity and the magnetic field are
///   (nearly) parallel, or the magnetic field is missing
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use orientation_fusion::{FusionSettings, tilt::estimate_tilt};
///
/// let acceleration = Vector3::new(0.0, 0.0, 9.81); // lying flat
/// let magnetic = Vector3::new(0.0, 30.0, -40.0);   // top edge pointing north
///
/// let tilt = estimate_tilt(acceleration, magnetic, &FusionSettings::default()).unwrap();
/// assert!(tilt.orientation.azimuth.abs() < 1e-6);
/// ```
pub fn estimate_tilt(
    acceleration: Vector3<f32>,
    magnetic: Vector3<f32>,
    settings: &FusionSettings,
) -> Result<TiltEstimate> {
    let norm_squared = acceleration.magnitude_squared();
    if norm_squared < settings.free_fall_threshold_squared() {
        return Err(FusionError::FreeFall {
            magnitude: norm_squared.sqrt(),
        });
    }

    let east = magnetic.cross(&acceleration);
    if east.magnitude() < settings.min_horizontal_field {
        return Err(FusionError::CollinearField);
    }

    let east = east.safe_normalize();
    let up = acceleration.safe_normalize();
    let north = up.cross(&east);

    let rotation_matrix = Matrix3::from_rows(&[east.transpose(), north.transpose(), up.transpose()]);

    Ok(TiltEstimate {
        rotation_matrix,
        orientation: orientation_from_rotation_matrix(&rotation_matrix),
    })
}
