//! Thread-shared fusion engine
//!
//! Sensor callbacks often arrive on different threads. [`SharedFusion`] wraps
//! an engine in a mutex so every update and query is serialized.

extern crate std;

use crate::error::Result;
use crate::fusion::ImuFusion;
use crate::types::Orientation;
use nalgebra::Vector3;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a mutex-guarded fusion engine
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use orientation_fusion::{ImuFusion, OrientationFusion, sync::SharedFusion};
///
/// let fusion = SharedFusion::new(OrientationFusion::new());
/// let gyroscope = fusion.clone();
///
/// fusion.set_magnetic(Vector3::new(0.0, 30.0, -40.0));
/// fusion.set_acceleration(Vector3::new(0.0, 0.0, 9.81));
/// gyroscope.set_gyroscope(Vector3::zeros(), 0);
///
/// assert!(fusion.with(|engine| engine.has_orientation()));
/// ```
#[derive(Debug, Default)]
pub struct SharedFusion<F> {
    inner: Arc<Mutex<F>>,
}

impl<F> Clone for SharedFusion<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ImuFusion> SharedFusion<F> {
    pub fn new(engine: F) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn set_acceleration(&self, acceleration: Vector3<f32>) {
        self.inner.lock().set_acceleration(acceleration);
    }

    pub fn set_magnetic(&self, magnetic: Vector3<f32>) {
        self.inner.lock().set_magnetic(magnetic);
    }

    pub fn set_gyroscope(&self, angular_velocity: Vector3<f32>, timestamp: u64) {
        self.inner.lock().set_gyroscope(angular_velocity, timestamp);
    }

    pub fn set_filter_coefficient(&self, filter_coefficient: f32) -> Result<()> {
        self.inner.lock().set_filter_coefficient(filter_coefficient)
    }

    pub fn orientation(&self) -> Orientation {
        self.inner.lock().orientation()
    }

    pub fn linear_acceleration(&self) -> Vector3<f32> {
        self.inner.lock().linear_acceleration()
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut F) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
