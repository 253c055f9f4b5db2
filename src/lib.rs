#![no_std]

//! Orientation fusion - complementary filtering of inertial sensor data
//!
//! Estimates device orientation (azimuth, pitch, roll) by fusing two sources:
//!
//! - an accelerometer/magnetometer tilt estimate, noisy but drift-free
//! - integrated gyroscope rotation, smooth but drifting
//!
//! The fused orientation also yields the gravity vector in the device frame,
//! so gravity can be removed from the accelerometer to get linear
//! acceleration.
//!
//! # Features
//!
//! - Euler-angle domain filter with ±π wrap-around handling ([`OrientationFusion`])
//! - Rotation-matrix domain filter without wrap-around ([`RotationMatrixFusion`])
//! - Runtime strategy selection ([`FusionEngine`])
//! - Tilt-compensated compass heading ([`tilt::estimate_tilt`])
//! - Linear acceleration extraction
//! - `#![no_std]` compatible for embedded systems
//! - Optional `serde` support for settings and orientations
//! - Optional `sync` feature with a thread-shared engine handle
//!
//! # Conventions
//!
//! Device axes: X to the right, Y toward the top edge, Z out of the screen.
//! Earth frame: X east, Y magnetic north, Z up. A device lying flat, top
//! edge pointing north, has orientation (0, 0, 0). Angles are in radians,
//! accelerations in m/s², magnetic field in µT, angular velocity in rad/s and
//! timestamps in nanoseconds.
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use orientation_fusion::{FusionSettings, ImuFusion, OrientationFusion};
//!
//! let mut fusion = OrientationFusion::with_settings(FusionSettings {
//!     filter_coefficient: 0.98,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! for i in 0..10u64 {
//!     // Feed samples as they arrive from the sensor callbacks
//!     fusion.set_magnetic(Vector3::new(0.0, 30.0, -40.0));
//!     fusion.set_acceleration(Vector3::new(0.0, 0.0, 9.81));
//!     fusion.set_gyroscope(Vector3::new(0.0, 0.0, 0.01), i * 10_000_000);
//! }
//!
//! let orientation = fusion.orientation();
//! let degrees = orientation.to_degrees();
//! let linear = fusion.linear_acceleration();
//! # assert!(degrees.x.abs() < 1.0);
//! # assert!(linear.norm() < 0.1);
//! ```

pub mod error;
pub mod fusion;
pub mod gyro;
pub mod linear;
pub mod math;
#[cfg(feature = "sync")]
pub mod sync;
pub mod tilt;
mod types;

pub use error::{FusionError, Result};
pub use fusion::{FusionEngine, ImuFusion, OrientationFusion, RotationMatrixFusion};
pub use gyro::{GyroIntegrator, Step};
pub use math::{orientation_from_rotation_matrix, rotation_matrix_from_orientation};
pub use tilt::{TiltEstimate, estimate_tilt};
pub use types::*;
