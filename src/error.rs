//! Error types for the orientation fusion engines
//!
//! Update paths never surface these to the caller: a degenerate tilt input is
//! logged and skipped, keeping the last good estimate. They are returned by
//! the stand-alone estimator functions and by configuration setters.

/// Result type for fusion operations
pub type Result<T> = core::result::Result<T, FusionError>;

/// Fusion errors
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum FusionError {
    /// Accelerometer magnitude too small to carry a gravity direction
    #[error("acceleration magnitude {magnitude} m/s² is too far below gravity")]
    FreeFall { magnitude: f32 },

    /// Gravity and magnetic field are (nearly) parallel, heading undefined
    #[error("acceleration and magnetic field are collinear")]
    CollinearField,

    /// Filter coefficient outside (0, 1]
    #[error("filter coefficient {0} is outside (0, 1]")]
    InvalidFilterCoefficient(f32),

    /// Setting outside its valid range (non-finite, or negative)
    #[error("setting `{field}` has invalid value {value}")]
    InvalidSettings { field: &'static str, value: f32 },
}

impl FusionError {
    /// Whether the error comes from unusable accelerometer/magnetometer input
    pub fn is_degenerate_tilt(&self) -> bool {
        matches!(self, FusionError::FreeFall { .. } | FusionError::CollinearField)
    }
}

pub(crate) fn check_filter_coefficient(coefficient: f32) -> Result<()> {
    // NaN fails both comparisons
    if coefficient > 0.0 && coefficient <= 1.0 {
        Ok(())
    } else {
        Err(FusionError::InvalidFilterCoefficient(coefficient))
    }
}

/// Finite and strictly positive
pub(crate) fn check_positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FusionError::InvalidSettings { field, value })
    }
}

/// Finite and zero or positive
pub(crate) fn check_non_negative(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FusionError::InvalidSettings { field, value })
    }
}
