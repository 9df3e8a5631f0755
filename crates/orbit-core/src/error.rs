//! Parameter registration error types

use thiserror::Error;

/// Errors raised while defining parameters or transforms
///
/// Runtime writes never fail with these; unknown names and lost arbitration
/// are reported through [`crate::WriteOutcome`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// Range is empty, inverted or not finite
    #[error("Invalid range for parameter '{name}': [{min}, {max}]")]
    InvalidRange { name: String, min: f64, max: f64 },

    /// Piecewise curve built without control points
    #[error("Piecewise curve needs at least one control point")]
    EmptyCurve,

    /// Decibel curve with an empty or non-finite dB span
    #[error("Invalid decibel range: [{min_db}, {max_db}] dB")]
    InvalidDecibelRange { min_db: f64, max_db: f64 },

    /// Control point contains NaN or infinity
    #[error("Piecewise control point is not finite: ({x}, {y})")]
    NonFinitePoint { x: f64, y: f64 },
}

/// Result type for parameter definition
pub type ParameterResult<T> = Result<T, ParameterError>;
