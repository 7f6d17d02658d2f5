//! Error types for the simulation core
//!
//! Only construction and configuration can fail. Numerical edge cases during a
//! step are masked locally and never surface here.

use thiserror::Error;

/// Main error type for simulation setup and configuration.
#[derive(Error, Debug)]
pub enum SimError {
    /// Toroidal world with a non-positive or non-finite side length
    #[error("world size must be positive and finite, got {0}")]
    InvalidWorldSize(f32),

    /// Toroidal boundary requested without a world size
    #[error("toroidal boundary conditions require a world size")]
    MissingWorldSize,

    /// Bodies need strictly positive mass
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f32),

    /// Directional wavelets need a facing direction
    #[error("direction vector has zero length")]
    ZeroDirection,

    /// Field grid with no cells or no extent
    #[error("invalid field grid: {0}")]
    InvalidGrid(String),

    /// Any other out-of-range shape or tuning parameter
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    /// A configuration path that has not been implemented
    #[error("unsupported configuration: {0}")]
    Unsupported(&'static str),

    /// Settings file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for simulation setup.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Creates an invalid-grid error.
    #[must_use]
    pub fn grid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Checks that `value` is positive and finite.
    pub fn require_positive(name: &'static str, value: f32) -> Result<f32> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Self::InvalidParameter { name, value })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InvalidMass(-1.0);
        assert_eq!(err.to_string(), "mass must be positive and finite, got -1");
    }

    #[test]
    fn test_require_positive() {
        assert!(SimError::require_positive("v", 0.5).is_ok());
        assert!(SimError::require_positive("v", 0.0).is_err());
        assert!(SimError::require_positive("v", f32::NAN).is_err());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SimError = json_err.into();
        assert!(matches!(err, SimError::Json(_)));
    }
}
