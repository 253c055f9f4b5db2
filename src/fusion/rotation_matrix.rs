//! Rotation-matrix domain complementary filter
//!
//! The gyroscope matrix is the canonical state. Each fusion step replaces it
//! with `alpha * gyro + (1 - alpha) * tilt`. Euler angles are only derived
//! when queried, so there is no wrap-around handling and no gimbal lock in
//! the stored state.
//!
//! The weighted sum of two rotation matrices is not a rotation matrix. No
//! re-orthonormalization is done; [`RotationMatrixFusion::orthonormality_error`]
//! measures the drift and [`RotationMatrixFusion::reseed`] discards it.

use super::{ImuFusion, SensorState};
use crate::error::Result;
use crate::gyro::{GyroIntegrator, Step};
use crate::math::{blend_matrices, orientation_from_rotation_matrix, orthonormality_error};
use crate::tilt::TiltEstimate;
use crate::types::{FusionSettings, Orientation, Phase};
use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};

/// Rotation-matrix domain complementary filter
#[derive(Debug, Clone, Copy)]
pub struct RotationMatrixFusion {
    settings: FusionSettings,
    sensors: SensorState,
    integrator: GyroIntegrator,
    gyro_matrix: Matrix3<f32>,
}

impl RotationMatrixFusion {
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
        }
    }

    /// How far the fused matrix is from a proper rotation
    ///
    /// Frobenius norm of `RᵀR - I`; grows with the disagreement between the
    /// gyroscope and tilt estimates.
    pub fn orthonormality_error(&self) -> f32 {
        orthonormality_error(&self.gyro_matrix)
    }

    /// Replace the fused matrix with the latest tilt matrix
    ///
    /// Returns `false` when no tilt estimate is available yet.
    pub fn reseed(&mut self) -> bool {
        match self.sensors.tilt() {
            Some(tilt) => {
                debug!(
                    "gyroscope matrix reseeded from tilt, orthonormality error was {}",
                    self.orthonormality_error()
                );
                self.gyro_matrix = tilt.rotation_matrix;
                true
            }
            None => false,
        }
    }
}

impl Default for RotationMatrixFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl ImuFusion for RotationMatrixFusion {
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
            Step::Seeded => self.gyro_matrix = tilt.rotation_matrix,
            Step::Rotated(delta) => self.gyro_matrix *= delta,
            Step::OutOfOrder => return,
        }

        self.gyro_matrix = blend_matrices(
            &self.gyro_matrix,
            &tilt.rotation_matrix,
            self.settings.filter_coefficient,
        );
    }

    fn orientation(&self) -> Orientation {
        orientation_from_rotation_matrix(&self.gyro_matrix)
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
