//! Error types and validation functions for permutation testing.
//!
//! Every failure aborts the running test procedure. Estimator errors are kept
//! intact as the error source so callers can inspect what the estimator
//! reported.

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Error type returned by [`DependencyEstimator`](crate::realisations::DependencyEstimator)
/// implementations.
pub type EstimatorError = Box<dyn StdError + Send + Sync + 'static>;

/// Error types for surrogate construction and significance testing.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum SignificanceError {
    /// Configuration that leaves nothing meaningful to compute.
    #[error("Invalid configuration: {parameter}: {reason}")]
    InvalidConfiguration {
        /// Offending setting
        parameter: String,
        /// Why the setting was rejected
        reason: String,
    },

    /// Argument violating a documented precondition.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Violated precondition
        reason: String,
    },

    /// Numeric parameter outside its valid range.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// The external estimator failed. The original error is kept as source.
    #[error("Estimator failed during {context}")]
    EstimatorFailure {
        /// Where in the procedure the estimator was called
        context: String,
        /// Error reported by the estimator
        #[source]
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    /// The realisation source could not provide the requested data.
    #[error("Realisation source failed: {reason}")]
    SourceFailure {
        /// Reason reported by the source
        reason: String,
    },

    /// Array dimensions disagree.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Operation that detected the mismatch
        context: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Non-finite value where a finite one is required.
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for the failure
        reason: String,
    },
}

impl SignificanceError {
    /// Wrap an estimator error without altering it.
    pub fn estimator(context: impl Into<String>, source: EstimatorError) -> Self {
        SignificanceError::EstimatorFailure {
            context: context.into(),
            source: Arc::from(source),
        }
    }
}

/// Result type for significance testing operations.
pub type SignificanceResult<T> = Result<T, SignificanceError>;

/// Validates that a parameter is within expected bounds.
///
/// # Arguments
/// * `value` - Parameter value to validate
/// * `min` - Minimum acceptable value (inclusive)
/// * `max` - Maximum acceptable value (inclusive)
/// * `name` - Parameter name for error reporting
///
/// # Example
/// ```rust
/// use surrogate_significance::errors::validate_parameter;
///
/// assert!(validate_parameter(0.05, 0.0, 1.0, "alpha").is_ok());
/// assert!(validate_parameter(1.5, 0.0, 1.0, "alpha").is_err());
/// ```
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> SignificanceResult<()> {
    if value.is_nan() {
        return Err(SignificanceError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if value < min || value > max {
        Err(SignificanceError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validates that a value is finite and not NaN.
///
/// A surrogate value that is NaN or infinite cannot be ordered against the
/// observed statistic, so it is rejected instead of being dropped.
///
/// # Example
/// ```rust
/// use surrogate_significance::errors::validate_finite;
///
/// assert!(validate_finite(1.0, "te").is_ok());
/// assert!(validate_finite(f64::NAN, "te").is_err());
/// ```
pub fn validate_finite(value: f64, name: &str) -> SignificanceResult<()> {
    if !value.is_finite() {
        Err(SignificanceError::NumericalError {
            reason: format!("{} is not finite: {}", name, value),
        })
    } else {
        Ok(())
    }
}
