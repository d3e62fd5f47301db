//! Error types for CitySim
//!
//! Stepping a metric or evaluating an actuator cannot fail. Errors only
//! arise when parameters are validated at construction time, or when the
//! display store is read with the wrong type.

use thiserror::Error;

/// Result type alias for CitySim operations
pub type Result<T> = std::result::Result<T, CitySimError>;

/// Main error type for CitySim operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CitySimError {
    /// Lower bound above upper bound, or a non-finite bound
    #[error("Invalid bounds: min {min} must be finite and not above max {max}")]
    InvalidBounds { min: f64, max: f64 },

    /// Initial value outside the metric bounds
    #[error("Value {value} outside bounds [{min}, {max}]")]
    ValueOutOfBounds { value: f64, min: f64, max: f64 },

    /// A numeric parameter outside its accepted range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A duration that must be non-zero, or a min/max duration pair out of order
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Display store key read with a type other than the one it holds
    #[error("Key {key} holds a {actual}, not a {expected}")]
    KeyTypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl CitySimError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
