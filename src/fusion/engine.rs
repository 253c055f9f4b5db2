//! Runtime-selected fusion strategy

use super::{ImuFusion, OrientationFusion, RotationMatrixFusion};
use crate::error::Result;
use crate::tilt::TiltEstimate;
use crate::types::{FusionSettings, Orientation, Phase, Strategy};
use log::debug;
use nalgebra::{Matrix3, Vector3};

/// Fusion engine whose strategy is chosen from [`FusionSettings::strategy`]
///
/// # Example
/// ```
/// use orientation_fusion::{FusionEngine, FusionSettings, ImuFusion, Strategy};
///
/// let settings = FusionSettings {
///     strategy: Strategy::RotationMatrix,
///     filter_coefficient: 0.98,
///     ..Default::default()
/// };
/// let engine = FusionEngine::with_settings(settings).unwrap();
/// assert_eq!(engine.strategy(), Strategy::RotationMatrix);
/// assert!(!engine.has_orientation());
/// ```
#[derive(Debug, Clone, Copy)]
pub enum FusionEngine {
    /// Euler-angle domain complementary filter
    Orientation(OrientationFusion),
    /// Rotation-matrix domain complementary filter
    RotationMatrix(RotationMatrixFusion),
}

impl FusionEngine {
    /// Create an engine with default settings (Euler-angle strategy)
    pub fn new() -> Self {
        FusionEngine::Orientation(OrientationFusion::new())
    }

    pub fn with_settings(settings: FusionSettings) -> Result<Self> {
        Ok(match settings.strategy {
            Strategy::Orientation => {
                FusionEngine::Orientation(OrientationFusion::with_settings(settings)?)
            }
            Strategy::RotationMatrix => {
                FusionEngine::RotationMatrix(RotationMatrixFusion::with_settings(settings)?)
            }
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            FusionEngine::Orientation(_) => Strategy::Orientation,
            FusionEngine::RotationMatrix(_) => Strategy::RotationMatrix,
        }
    }

    fn inner(&self) -> &dyn ImuFusion {
        match self {
            FusionEngine::Orientation(engine) => engine,
            FusionEngine::RotationMatrix(engine) => engine,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ImuFusion {
        match self {
            FusionEngine::Orientation(engine) => engine,
            FusionEngine::RotationMatrix(engine) => engine,
        }
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ImuFusion for FusionEngine {
    fn set_acceleration(&mut self, acceleration: Vector3<f32>) {
        self.inner_mut().set_acceleration(acceleration);
    }

    fn set_magnetic(&mut self, magnetic: Vector3<f32>) {
        self.inner_mut().set_magnetic(magnetic);
    }

    fn set_gyroscope(&mut self, angular_velocity: Vector3<f32>, timestamp: u64) {
        self.inner_mut().set_gyroscope(angular_velocity, timestamp);
    }

    fn orientation(&self) -> Orientation {
        self.inner().orientation()
    }

    fn rotation_matrix(&self) -> Matrix3<f32> {
        self.inner().rotation_matrix()
    }

    fn tilt(&self) -> Option<TiltEstimate> {
        self.inner().tilt()
    }

    fn phase(&self) -> Phase {
        self.inner().phase()
    }

    fn acceleration(&self) -> Vector3<f32> {
        self.inner().acceleration()
    }

    fn settings(&self) -> &FusionSettings {
        self.inner().settings()
    }

    /// Replace the settings
    ///
    /// A different `strategy` swaps the engine for a fresh one of the new
    /// strategy; the running estimate does not carry over.
    fn set_settings(&mut self, settings: FusionSettings) -> Result<()> {
        if settings.strategy == self.strategy() {
            return self.inner_mut().set_settings(settings);
        }

        let engine = Self::with_settings(settings)?;
        debug!("fusion strategy switched from {:?} to {:?}", self.strategy(), settings.strategy);
        *self = engine;
        Ok(())
    }

    fn reset(&mut self) {
        self.inner_mut().reset();
    }
}
