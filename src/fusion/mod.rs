//! Complementary-filter fusion strategies
//!
//! Both strategies share one interface, [`ImuFusion`], and the same
//! lifecycle:
//!
//! 1. `set_magnetic` buffers the latest magnetic field sample.
//! 2. `set_acceleration` stores the acceleration and re-estimates tilt. A
//!    degenerate pair is skipped and the previous estimate is kept.
//! 3. `set_gyroscope` is ignored until a tilt estimate exists. The first
//!    accepted sample seeds the gyroscope estimate from tilt; every later one
//!    integrates and fuses.
//!
//! [`OrientationFusion`] blends Euler angles, [`RotationMatrixFusion`] blends
//! rotation matrices, and [`FusionEngine`] picks one at runtime from
//! [`FusionSettings::strategy`].

mod engine;
pub mod orientation;
pub mod rotation_matrix;

pub use engine::FusionEngine;
pub use orientation::OrientationFusion;
pub use rotation_matrix::RotationMatrixFusion;

use crate::error::{Result, check_filter_coefficient};
use crate::linear;
use crate::tilt::{TiltEstimate, estimate_tilt};
use crate::types::{FusionSettings, Orientation, Phase};
use log::{debug, trace};
use nalgebra::{Matrix3, Vector3};

/// Common interface of the fusion strategies
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use orientation_fusion::{ImuFusion, OrientationFusion};
///
/// let mut fusion = OrientationFusion::new();
///
/// fusion.set_magnetic(Vector3::new(0.0, 30.0, -40.0));     // µT
/// fusion.set_acceleration(Vector3::new(0.0, 0.0, 9.80665)); // m/s²
/// fusion.set_gyroscope(Vector3::zeros(), 0);               // rad/s, ns
/// fusion.set_gyroscope(Vector3::zeros(), 10_000_000);
///
/// assert!(fusion.has_orientation());
/// assert!(fusion.linear_acceleration().norm() < 1e-3);
/// ```
pub trait ImuFusion {
    /// Store an accelerometer sample (m/s²) and re-estimate tilt
    fn set_acceleration(&mut self, acceleration: Vector3<f32>);

    /// Buffer a magnetometer sample (µT) for the next tilt estimate
    fn set_magnetic(&mut self, magnetic: Vector3<f32>);

    /// Integrate a gyroscope sample (rad/s) taken at `timestamp` nanoseconds
    /// and fuse it with the latest tilt estimate
    fn set_gyroscope(&mut self, angular_velocity: Vector3<f32>, timestamp: u64);

    /// Fused orientation
    fn orientation(&self) -> Orientation;

    /// Fused device-to-Earth rotation matrix
    fn rotation_matrix(&self) -> Matrix3<f32>;

    /// Latest successful accelerometer/magnetometer estimate
    fn tilt(&self) -> Option<TiltEstimate>;

    /// Gyroscope integration phase
    fn phase(&self) -> Phase;

    /// Last accelerometer sample
    fn acceleration(&self) -> Vector3<f32>;

    fn settings(&self) -> &FusionSettings;

    /// Replace the settings; rejected settings leave the current ones in place
    fn set_settings(&mut self, settings: FusionSettings) -> Result<()>;

    /// Return to the freshly-constructed state, keeping the settings
    fn reset(&mut self);

    /// Whether a tilt estimate has been acquired
    fn has_orientation(&self) -> bool {
        self.tilt().is_some()
    }

    fn filter_coefficient(&self) -> f32 {
        self.settings().filter_coefficient
    }

    /// Set the weight of the gyroscope estimate, in (0, 1]
    ///
    /// Takes effect on the next fusion step.
    fn set_filter_coefficient(&mut self, filter_coefficient: f32) -> Result<()> {
        check_filter_coefficient(filter_coefficient)?;
        let settings = FusionSettings {
            filter_coefficient,
            ..*self.settings()
        };
        self.set_settings(settings)
    }

    /// Gravity in the device frame for the fused orientation
    fn gravity(&self) -> Vector3<f32> {
        linear::gravity_in_device_frame(&self.orientation(), self.settings().gravity)
    }

    /// Last accelerometer sample minus gravity for the fused orientation
    ///
    /// Only meaningful after at least one fusion step.
    fn linear_acceleration(&self) -> Vector3<f32> {
        linear::linear_acceleration(
            &self.orientation(),
            self.acceleration(),
            self.settings().gravity,
        )
    }
}

/// Accelerometer/magnetometer buffers and the latest tilt estimate
#[derive(Debug, Clone, Copy)]
pub(crate) struct SensorState {
    acceleration: Vector3<f32>,
    magnetic: Vector3<f32>,
    tilt: Option<TiltEstimate>,
}

impl SensorState {
    pub(crate) fn new() -> Self {
        Self {
            acceleration: Vector3::zeros(),
            magnetic: Vector3::zeros(),
            tilt: None,
        }
    }

    pub(crate) fn set_acceleration(&mut self, acceleration: Vector3<f32>, settings: &FusionSettings) {
        self.acceleration = acceleration;

        match estimate_tilt(acceleration, self.magnetic, settings) {
            Ok(tilt) => {
                if self.tilt.is_none() {
                    debug!("first tilt estimate acquired: {:?}", tilt.orientation);
                }
                self.tilt = Some(tilt);
            }
            Err(error) => debug!("tilt estimate skipped: {}", error),
        }
    }

    pub(crate) fn set_magnetic(&mut self, magnetic: Vector3<f32>) {
        self.magnetic = magnetic;
    }

    pub(crate) fn acceleration(&self) -> Vector3<f32> {
        self.acceleration
    }

    /// Tilt estimate, or `None` (logged) while gyroscope samples must wait
    pub(crate) fn tilt_for_gyroscope(&self, timestamp: u64) -> Option<TiltEstimate> {
        if self.tilt.is_none() {
            trace!("gyroscope sample at {} ns before first tilt estimate, ignored", timestamp);
        }
        self.tilt
    }

    pub(crate) fn tilt(&self) -> Option<TiltEstimate> {
        self.tilt
    }
}
