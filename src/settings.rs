//! RANSAC configuration.

use std::time::Duration;

use crate::error::{RegistrationError, Result};

/// Parameters for one RANSAC registration run.
#[derive(Debug, Clone, PartialEq)]
pub struct RansacParams {
    /// Number of correspondences drawn per hypothesis (3 for a 3D
    /// similarity or rigid transform).
    pub sample_size: usize,
    /// Upper bound on iterations, and the initial iteration budget.
    pub max_iterations: usize,
    /// Desired probability that the reported result came from an
    /// outlier-free sample, strictly inside (0, 1).
    pub confidence: f64,
    /// Optional maximum nearest-neighbor distance for a correspondence to
    /// count as support. `None` uses the index-equality test alone.
    pub inlier_threshold: Option<f64>,
    /// Wall-clock limit checked once per iteration. When hit, the run
    /// returns the best result found so far.
    pub time_limit: Option<Duration>,
    /// Refit the best model on all of its inliers once the loop ends.
    pub refine: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            sample_size: 3,
            max_iterations: 1000,
            confidence: 0.99,
            inlier_threshold: None,
            time_limit: None,
            refine: true,
        }
    }
}

impl RansacParams {
    /// Validate against the number of available correspondences.
    pub fn validate(&self, n_correspondences: usize) -> Result<()> {
        if self.sample_size == 0 {
            return Err(RegistrationError::invalid("sample size must be positive"));
        }
        if self.sample_size > n_correspondences {
            return Err(RegistrationError::invalid(format!(
                "sample size {} exceeds the {} available correspondences",
                self.sample_size, n_correspondences
            )));
        }
        if self.max_iterations == 0 {
            return Err(RegistrationError::invalid(
                "maximum number of iterations must be positive",
            ));
        }
        // Written so that NaN fails too.
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(RegistrationError::invalid(format!(
                "confidence must lie strictly between 0 and 1, got {}",
                self.confidence
            )));
        }
        if let Some(threshold) = self.inlier_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(RegistrationError::invalid(format!(
                    "inlier threshold must be a finite non-negative distance, got {threshold}"
                )));
            }
        }
        Ok(())
    }
}
