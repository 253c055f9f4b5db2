//! Euler-angle domain complementary filter
//!
//! Gyroscope and tilt orientations are blended axis by axis. The fused angles
//! overwrite the gyroscope orientation and the gyroscope matrix is rebuilt
//! from them, so each integration step starts from the drift-corrected pose.

use super::{ImuFusion, SensorState};
use crate::error::Result;
use crate::gyro::{GyroIntegrator, Step};
use crate::math::{orientation_from_rotation_matrix, rotation_matrix_from_orientation, wrap_angle};
use crate::tilt::TiltEstimate;
use crate::types::{FusionSettings, Orientation, Phase};
use core::f32::consts::{FRAC_PI_2, TAU};
use log::warn;
use nalgebra::{Matrix3, Vector3};

/// Blend one gyroscope angle with one tilt angle
///
/// When the two angles straddle the ±π boundary, the negative one is shifted
/// by 2π before blending and the result is shifted back if it exceeds π.
/// Without this a 179° / -179° pair would average to 0°.
///
/// # Example
/// ```
/// use orientation_fusion::fusion::orientation::fuse_angle;
///
/// let fused = fuse_angle(-3.0, 3.0, 0.5);
/// assert!(fused.abs() > 3.1); // near ±π, not near 0
/// ```
pub fn fuse_angle(gyro: f32, tilt: f32, alpha: f32) -> f32 {
    let one_minus_alpha = 1.0 - alpha;

    if gyro < -FRAC_PI_2 && tilt > 0.0 {
        wrap_angle(alpha * (gyro + TAU) + one_minus_alpha * tilt)
    } else if tilt < -FRAC_PI_2 && gyro > 0.0 {
        wrap_angle(alpha * gyro + one_minus_alpha * (tilt + TAU))
    } else {
        alpha * gyro + one_minus_alpha * tilt
    }
}

/// Blend two orientations axis by axis with [`fuse_angle`]
pub fn fuse_orientation(gyro: &Orientation, tilt: &Orientation, alpha: f32) -> Orientation {
    Orientation {
        azimuth: fuse_angle(gyro.azimuth, tilt.azimuth, alpha),
        pitch: fuse_angle(gyro.pitch, tilt.pitch, alpha),
        roll: fuse_angle(gyro.roll, tilt.roll, alpha),
    }
}

/// Euler-angle domain complementary filter
///
/// Compact and intuitive, but subject to gimbal lock at pitch = ±90°.
#[derive(Debug, Clone, Copy)]
pub struct OrientationFusion {
    settings: FusionSettings,
    sensors: SensorState,
    integrator: GyroIntegrator,
    /// Rotation matrix the next gyroscope increment is applied to
    gyro_matrix: Matrix3<f32>,
    /// Fused orientation after the last fusion step
    gyro_orientation: Orientation,
}

impl OrientationFusion {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::from_valid_settings(FusionSettings::default())
    }

    /// Create an engine with the given settings
    ///
    /// `settings.strategy` is ignored; the strategy is this type.
    pub fn with_settings(settings: FusionSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_valid_settings(settings))
    }

    fn from_valid_settings(settings: FusionSettings) -> Self {
        Self {
            settings,
            sensors: SensorState::new(),
            integrator: GyroIntegrator::new(),
            gyro_matrix: Matrix3::identity(),
            gyro_orientation: Orientation::default(),
        }
    }

    fn fuse(&mut self, tilt: &TiltEstimate) {
        let fused = fuse_orientation(
            &self.gyro_orientation,
            &tilt.orientation,
            self.settings.filter_coefficient,
        );

        self.gyro_matrix = rotation_matrix_from_orientation(&fused);
        self.gyro_orientation = fused;
    }
}

impl Default for OrientationFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl ImuFusion for OrientationFusion {
    fn set_acceleration(&mut self, acceleration: Vector3<f32>) {
        self.sensors.set_acceleration(acceleration, &self.settings);
    }

    fn set_magnetic(&mut self, magnetic: Vector3<f32>) {
        self.sensors.set_magnetic(magnetic);
    }

    fn set_gyroscope(&mut self, angular_velocity: Vector3<f32>, timestamp: u64) {
        let Some(tilt) = self.sensors.tilt_for_gyroscope(timestamp) else {
            return;
        };

        match self.integrator.update(angular_velocity, timestamp) {
            Step::Seeded => {
                self.gyro_matrix = tilt.rotation_matrix;
                self.gyro_orientation = tilt.orientation;
            }
            Step::Rotated(delta) => {
                self.gyro_matrix *= delta;
                self.gyro_orientation = orientation_from_rotation_matrix(&self.gyro_matrix);
            }
            Step::OutOfOrder => return,
        }

        self.fuse(&tilt);
    }

    fn orientation(&self) -> Orientation {
        self.gyro_orientation
    }

    fn rotation_matrix(&self) -> Matrix3<f32> {
        self.gyro_matrix
    }

    fn tilt(&self) -> Option<TiltEstimate> {
        self.sensors.tilt()
    }

    fn phase(&self) -> Phase {
        self.integrator.phase()
    }

    fn acceleration(&self) -> Vector3<f32> {
        self.sensors.acceleration()
    }

    fn settings(&self) -> &FusionSettings {
        &self.settings
    }

    fn set_settings(&mut self, settings: FusionSettings) -> Result<()> {
        settings.validate().inspect_err(|error| {
            warn!("settings rejected: {}", error);
        })?;
        self.settings = settings;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::from_valid_settings(self.settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FusionError;
    use core::f32::consts::PI;

    const GRAVITY: f32 = 9.81;
    const TOLERANCE: f32 = 1e-4;

    fn level_magnetic(azimuth: f32) -> Vector3<f32> {
        Vector3::new(-30.0 * azimuth.sin(), 30.0 * azimuth.cos(), -40.0)
    }

    fn fusion_facing(azimuth: f32, alpha: f32) -> OrientationFusion {
        let mut fusion = OrientationFusion::with_settings(FusionSettings {
            filter_coefficient: alpha,
            ..Default::default()
        })
        .unwrap();
        fusion.set_magnetic(level_magnetic(azimuth));
        fusion.set_acceleration(Vector3::new(0.0, 0.0, GRAVITY));
        fusion
    }

    #[test]
    fn test_fuse_angle_plain_average() {
        assert!((fuse_angle(0.2, 0.4, 0.5) - 0.3).abs() < 1e-6);
        assert!((fuse_angle(0.2, 0.4, 1.0) - 0.2).abs() < 1e-6);
        assert!((fuse_angle(-1.0, -2.0, 0.25) + 1.75).abs() < 1e-6);
    }

    #[test]
    fn test_fuse_angle_wraps_gyro_side() {
        let fused = fuse_angle(-3.0, 3.0, 0.5);
        assert!(fused.abs() > PI - 1e-3, "fused {} should be near ±π", fused);

        // Result stays on the positive side when it does not cross π
        let fused = fuse_angle(-3.1, 3.0, 0.25);
        let expected = 0.25 * (-3.1 + TAU) + 0.75 * 3.0;
        assert!((fused - expected).abs() < 1e-5);
    }

    #[test]
    fn test_fuse_angle_wraps_tilt_side() {
        // Blend lands above π and is shifted back to the negative side
        let fused = fuse_angle(3.0, -3.0, 0.25);
        let expected = 0.25 * 3.0 + 0.75 * (-3.0 + TAU) - TAU;
        assert!((fused - expected).abs() < 1e-5);
        assert!(fused < -3.0);
    }

    #[test]
    fn test_gyroscope_ignored_before_tilt() {
        let mut fusion = OrientationFusion::new();
        fusion.set_gyroscope(Vector3::new(0.0, 0.0, 1.0), 1_000);
        fusion.set_gyroscope(Vector3::new(0.0, 0.0, 1.0), 2_000);

        assert!(!fusion.has_orientation());
        assert_eq!(fusion.phase(), Phase::Uninitialized);
        assert_eq!(fusion.orientation(), Orientation::default());
    }

    #[test]
    fn test_first_gyroscope_seeds_from_tilt() {
        let mut fusion = fusion_facing(1.0, 0.5);
        assert_eq!(fusion.phase(), Phase::Uninitialized);

        fusion.set_gyroscope(Vector3::new(0.0, 0.0, 5.0), 42);
        assert_eq!(fusion.phase(), Phase::Seeded { last_timestamp: 42 });
        assert!((fusion.orientation().azimuth - 1.0).abs() < TOLERANCE);

        fusion.set_gyroscope(Vector3::zeros(), 84);
        assert_eq!(fusion.phase(), Phase::Running { last_timestamp: 84 });
    }

    #[test]
    fn test_seeding_happens_once() {
        let mut fusion = fusion_facing(0.0, 1.0);
        fusion.set_gyroscope(Vector3::zeros(), 0);

        // Tilt moves, pure gyroscope keeps its own estimate
        fusion.set_magnetic(level_magnetic(0.8));
        fusion.set_acceleration(Vector3::new(0.0, 0.0, GRAVITY));
        fusion.set_gyroscope(Vector3::zeros(), 10_000_000);

        assert!(fusion.orientation().azimuth.abs() < TOLERANCE);
    }

    #[test]
    fn test_fused_matrix_tracks_fused_angles() {
        let mut fusion = fusion_facing(0.3, 0.5);
        fusion.set_gyroscope(Vector3::zeros(), 0);
        fusion.set_gyroscope(Vector3::new(0.2, -0.1, 0.4), 50_000_000);

        let from_matrix = orientation_from_rotation_matrix(&fusion.rotation_matrix());
        assert!((from_matrix.to_vector() - fusion.orientation().to_vector()).abs().max() < TOLERANCE);
    }

    #[test]
    fn test_wrap_around_through_engine() {
        // Tilt heading 3.0 rad, gyroscope turning past +π
        let mut fusion = fusion_facing(3.0, 0.5);
        fusion.set_gyroscope(Vector3::zeros(), 0);

        // -2 rad/s about Z for 100 ms raises the azimuth by 0.2 rad to 3.2 (wraps to -3.08)
        fusion.set_gyroscope(Vector3::new(0.0, 0.0, -2.0), 100_000_000);

        let azimuth = fusion.orientation().azimuth;
        assert!((azimuth - 3.1).abs() < 1e-3, "azimuth {} should be near 3.1", azimuth);
    }

    #[test]
    fn test_invalid_filter_coefficient_rejected() {
        let mut fusion = OrientationFusion::new();
        assert_eq!(
            fusion.set_filter_coefficient(0.0),
            Err(FusionError::InvalidFilterCoefficient(0.0))
        );
        assert_eq!(fusion.filter_coefficient(), 0.5);

        fusion.set_filter_coefficient(0.9).unwrap();
        assert_eq!(fusion.filter_coefficient(), 0.9);

        assert!(
            OrientationFusion::with_settings(FusionSettings {
                filter_coefficient: 1.5,
                ..Default::default()
            })
            .is_err()
        );
    }

    #[test]
    fn test_settings_that_hide_degenerate_input_rejected() {
        let negative_field = FusionSettings {
            min_horizontal_field: -1.0,
            ..Default::default()
        };
        assert_eq!(
            OrientationFusion::with_settings(negative_field).err(),
            Some(FusionError::InvalidSettings {
                field: "min_horizontal_field",
                value: -1.0
            })
        );

        let mut fusion = OrientationFusion::new();
        assert!(fusion.set_settings(negative_field).is_err());
        assert!(
            fusion
                .set_settings(FusionSettings {
                    gravity: f32::NAN,
                    ..Default::default()
                })
                .is_err()
        );
        assert_eq!(*fusion.settings(), FusionSettings::default());

        // No magnetometer sample: no heading can be invented
        fusion.set_acceleration(Vector3::new(0.0, 0.0, GRAVITY));
        assert!(!fusion.has_orientation());
        assert!(fusion.tilt().is_none());
    }

    #[test]
    fn test_reset_keeps_settings() {
        let mut fusion = fusion_facing(0.5, 0.8);
        fusion.set_gyroscope(Vector3::zeros(), 0);
        fusion.set_gyroscope(Vector3::zeros(), 1_000);

        fusion.reset();
        assert!(!fusion.has_orientation());
        assert_eq!(fusion.phase(), Phase::Uninitialized);
        assert_eq!(fusion.rotation_matrix(), Matrix3::identity());
        assert_eq!(fusion.filter_coefficient(), 0.8);
    }
}
