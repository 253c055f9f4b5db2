//! Gyroscope integration for the orientation fusion engines

use crate::math::{NANOS_TO_SECONDS, delta_rotation};
use crate::types::Phase;
use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};

/// Outcome of feeding one gyroscope sample to the integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// First sample: timestamp recorded, no elapsed time to integrate over.
    /// The caller seeds its gyroscope estimate from tilt.
    Seeded,
    /// Incremental rotation accumulated since the previous sample, to be
    /// right-multiplied onto the running gyroscope matrix
    Rotated(Matrix3<f32>),
    /// Timestamp older than the previous sample; dropped, state unchanged
    OutOfOrder,
}

/// Gyroscope integrator
///
/// Turns angular velocity samples and their timestamps into incremental
/// rotation matrices. Drift correction is left to the fusion step.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use orientation_fusion::gyro::{GyroIntegrator, Step};
///
/// let mut integrator = GyroIntegrator::new();
/// let rate = Vector3::new(0.0, 0.0, 1.0); // rad/s
///
/// assert_eq!(integrator.update(rate, 1_000_000_000), Step::Seeded);
/// assert!(matches!(integrator.update(rate, 1_010_000_000), Step::Rotated(_)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GyroIntegrator {
    phase: Phase,
}

impl GyroIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate one angular velocity sample
    ///
    /// # Arguments
    /// * `angular_velocity` - Gyroscope reading in rad/s
    /// * `timestamp` - Monotonic sample time in nanoseconds
    pub fn update(&mut self, angular_velocity: Vector3<f32>, timestamp: u64) -> Step {
        let last_timestamp = match self.phase {
            Phase::Uninitialized => {
                debug!("gyroscope seeded at {} ns", timestamp);
                self.phase = Phase::Seeded {
                    last_timestamp: timestamp,
                };
                return Step::Seeded;
            }
            Phase::Seeded { last_timestamp } | Phase::Running { last_timestamp } => last_timestamp,
        };

        let Some(elapsed) = timestamp.checked_sub(last_timestamp) else {
            warn!(
                "gyroscope timestamp {} ns precedes previous sample at {} ns, dropped",
                timestamp, last_timestamp
            );
            return Step::OutOfOrder;
        };

        if matches!(self.phase, Phase::Seeded { .. }) {
            debug!("gyroscope integration running");
        }
        self.phase = Phase::Running {
            last_timestamp: timestamp,
        };

        let delta_time = (elapsed as f64 * NANOS_TO_SECONDS) as f32;
        Step::Rotated(delta_rotation(angular_velocity, delta_time))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Forget the last timestamp; the next sample seeds again
    pub fn reset(&mut self) {
        self.phase = Phase::Uninitialized;
    }
}
