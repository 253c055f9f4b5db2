//! Core types and settings for the orientation fusion engines

use crate::error::{Result, check_filter_coefficient, check_non_negative, check_positive};
use nalgebra::Vector3;

/// Standard gravity in m/s², as reported by mobile sensor platforms.
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Device orientation as three Euler angles in radians.
///
/// The angles describe the rotation from the device frame to the Earth frame
/// using the mobile platform convention:
/// - **azimuth**: rotation about the vertical (Z) axis, 0 = magnetic north,
///   increasing clockwise when viewed from above
/// - **pitch**: rotation about the lateral (X) axis
/// - **roll**: rotation about the longitudinal (Y) axis
///
/// # Example
/// ```
/// use orientation_fusion::Orientation;
///
/// let level = Orientation::default();
/// assert_eq!(level.azimuth, 0.0);
///
/// let east = Orientation::new(core::f32::consts::FRAC_PI_2, 0.0, 0.0);
/// assert!((east.to_degrees().x - 90.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orientation {
    /// Rotation about the Z axis in radians
    pub azimuth: f32,
    /// Rotation about the X axis in radians
    pub pitch: f32,
    /// Rotation about the Y axis in radians
    pub roll: f32,
}

impl Orientation {
    pub const fn new(azimuth: f32, pitch: f32, roll: f32) -> Self {
        Self {
            azimuth,
            pitch,
            roll,
        }
    }

    /// Angles packed as `(azimuth, pitch, roll)`
    pub fn to_vector(self) -> Vector3<f32> {
        Vector3::new(self.azimuth, self.pitch, self.roll)
    }

    pub fn from_vector(angles: Vector3<f32>) -> Self {
        Self::new(angles.x, angles.y, angles.z)
    }

    /// Angles packed as `(azimuth, pitch, roll)` in degrees
    pub fn to_degrees(self) -> Vector3<f32> {
        Vector3::new(
            self.azimuth.to_degrees(),
            self.pitch.to_degrees(),
            self.roll.to_degrees(),
        )
    }
}

/// Fusion strategy selecting where the complementary filter blends the two
/// orientation estimates.
///
/// # Strategies
/// - **Orientation**: blends Euler angles axis by axis, with explicit handling
///   of the ±π wrap-around. Subject to gimbal lock at pitch = ±90°.
/// - **RotationMatrix**: blends whole rotation matrices by scalar weighting.
///   Free of wrap-around and gimbal lock, but the blended matrix is only
///   approximately orthonormal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Euler-angle domain complementary filter
    #[default]
    Orientation,
    /// Rotation-matrix domain complementary filter
    RotationMatrix,
}

/// Fusion engine settings
///
/// # Example
/// ```
/// use orientation_fusion::{FusionSettings, Strategy};
///
/// let settings = FusionSettings {
///     strategy: Strategy::RotationMatrix,
///     filter_coefficient: 0.98, // trust the gyroscope for short-term changes
///     ..Default::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FusionSettings {
    /// Which complementary filter the runtime-selected engine uses
    pub strategy: Strategy,
    /// Weight given to the gyroscope estimate, in (0, 1]
    ///
    /// 1.0 uses the gyroscope only (no drift correction). Values close to 0
    /// follow the accelerometer/magnetometer estimate almost exclusively.
    pub filter_coefficient: f32,
    /// Gravity magnitude in m/s² used for the linear acceleration projection
    pub gravity: f32,
    /// Fraction of `gravity` below which the accelerometer is treated as in
    /// free fall and the tilt estimate is skipped
    pub free_fall_gravity_ratio: f32,
    /// Minimum magnitude of `magnetic × acceleration` for a usable heading
    ///
    /// Smaller values mean gravity and the magnetic field are (nearly)
    /// collinear and no heading can be derived.
    pub min_horizontal_field: f32,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            filter_coefficient: 0.5,
            gravity: STANDARD_GRAVITY,
            free_fall_gravity_ratio: 0.1,
            min_horizontal_field: 0.1,
        }
    }
}

impl FusionSettings {
    /// Check the settings for values the engines cannot work with
    ///
    /// `gravity` and `min_horizontal_field` must be finite and positive,
    /// `free_fall_gravity_ratio` finite and not negative. Anything else lets
    /// degenerate tilt input through.
    pub fn validate(&self) -> Result<()> {
        check_filter_coefficient(self.filter_coefficient)?;
        check_positive("gravity", self.gravity)?;
        check_non_negative("free_fall_gravity_ratio", self.free_fall_gravity_ratio)?;
        check_positive("min_horizontal_field", self.min_horizontal_field)
    }

    /// Squared accelerometer magnitude below which the device is in free fall
    pub(crate) fn free_fall_threshold_squared(&self) -> f32 {
        let threshold = self.free_fall_gravity_ratio * self.gravity;
        threshold * threshold
    }
}

/// Lifecycle phase of the gyroscope integration
///
/// ```text
/// Uninitialized --(first gyro sample with tilt available)--> Seeded
/// Seeded --(next gyro sample)--> Running
/// ```
///
/// The gyroscope estimate is seeded from the tilt estimate exactly once, on
/// the `Uninitialized -> Seeded` transition. Integration needs two
/// timestamps, so it starts in `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No gyroscope sample accepted yet
    #[default]
    Uninitialized,
    /// Gyroscope estimate seeded from tilt, first timestamp recorded
    Seeded {
        /// Timestamp of the seeding sample in nanoseconds
        last_timestamp: u64,
    },
    /// Integrating every gyroscope sample
    Running {
        /// Timestamp of the last integrated sample in nanoseconds
        last_timestamp: u64,
    },
}

impl Phase {
    /// Timestamp of the last accepted gyroscope sample, if any
    pub fn last_timestamp(&self) -> Option<u64> {
        match *self {
            Phase::Uninitialized => None,
            Phase::Seeded { last_timestamp } | Phase::Running { last_timestamp } => {
                Some(last_timestamp)
            }
        }
    }

    pub fn is_seeded(&self) -> bool {
        !matches!(self, Phase::Uninitialized)
    }
}
