//! Error taxonomy for correspondence registration.

use thiserror::Error;

/// Errors raised while validating inputs, estimating hypotheses, or
/// querying nearest neighbors.
///
/// Only [`InvalidParameters`](RegistrationError::InvalidParameters) and
/// [`EmptyCloud`](RegistrationError::EmptyCloud) ever reach the caller of a
/// RANSAC run. [`DegenerateSample`](RegistrationError::DegenerateSample) is
/// produced by estimators and absorbed by the sampling loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// Parameters or inputs that make the run meaningless.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The minimal sample does not determine a unique transform.
    #[error("degenerate sample: {0}")]
    DegenerateSample(String),

    /// A nearest-neighbor query was issued against a cloud with no points.
    #[error("point cloud is empty")]
    EmptyCloud,
}

impl RegistrationError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateSample(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RegistrationError>;
