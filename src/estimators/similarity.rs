//! Point-to-point similarity estimator (Umeyama's closed form).

use nalgebra::{Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};

use crate::core::TransformEstimator;
use crate::error::{RegistrationError, Result};
use crate::models::SimilarityTransform;
use crate::types::Point;

/// Variance below which a point set is considered collapsed to a single point.
const MIN_VARIANCE: f64 = 1e-12;
/// Ratio of the second to the largest singular value of the cross-covariance
/// below which the sample is treated as collinear.
const RANK_TOLERANCE: f64 = 1e-8;
/// Smallest scale accepted for a similarity hypothesis.
const MIN_SCALE: f64 = 1e-8;

/// Estimates the similarity (or rigid) transform minimising the squared
/// distance between `s * R * source + t` and `target`.
///
/// Works for any number of correspondences >= 3, so the same estimator serves
/// both minimal samples and the final refit on all inliers.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityEstimator {
    with_scaling: bool,
}

impl Default for SimilarityEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityEstimator {
    /// Similarity estimator (uniform scale is estimated).
    pub fn new() -> Self {
        Self { with_scaling: true }
    }

    /// Rigid estimator: the scale is fixed to 1.
    pub fn rigid() -> Self {
        Self {
            with_scaling: false,
        }
    }

    pub fn with_scaling(&self) -> bool {
        self.with_scaling
    }
}

impl TransformEstimator for SimilarityEstimator {
    type Model = SimilarityTransform;

    fn sample_size(&self) -> usize {
        3
    }

    fn estimate(&self, source: &[Point], target: &[Point]) -> Result<Self::Model> {
        let n = source.len();
        if n != target.len() {
            return Err(RegistrationError::invalid(format!(
                "source sample has {} points but target sample has {}",
                n,
                target.len()
            )));
        }
        if n < self.sample_size() {
            return Err(RegistrationError::degenerate(format!(
                "need at least {} correspondences, got {n}",
                self.sample_size()
            )));
        }

        let inv_n = 1.0 / n as f64;
        let c0 = source
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            * inv_n;
        let c1 = target
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            * inv_n;

        // Cross-covariance target x source and the source variance.
        let mut cov = Matrix3::<f64>::zeros();
        let mut var0 = 0.0;
        for (p, q) in source.iter().zip(target) {
            let d0 = p.coords - c0;
            let d1 = q.coords - c1;
            cov += d1 * d0.transpose();
            var0 += d0.norm_squared();
        }
        cov *= inv_n;
        var0 *= inv_n;

        if !var0.is_finite() || cov.iter().any(|x| !x.is_finite()) {
            return Err(RegistrationError::degenerate("non-finite coordinates"));
        }
        if var0 < MIN_VARIANCE {
            return Err(RegistrationError::degenerate("source points coincide"));
        }

        let svd = cov.svd(true, true);
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return Err(RegistrationError::degenerate("SVD did not converge"));
        };
        let sv = svd.singular_values;

        let mut sorted = [sv[0], sv[1], sv[2]];
        sorted.sort_by(|a, b| b.total_cmp(a));
        if sorted[0] <= MIN_VARIANCE || sorted[1] <= RANK_TOLERANCE * sorted[0] {
            return Err(RegistrationError::degenerate("points are collinear"));
        }

        // Reflection correction on the weakest direction.
        let mut s = Vector3::new(1.0, 1.0, 1.0);
        if u.determinant() * v_t.determinant() < 0.0 {
            s[sv.imin()] = -1.0;
        }

        let r = u * Matrix3::from_diagonal(&s) * v_t;

        let scale = if self.with_scaling {
            sv.component_mul(&s).sum() / var0
        } else {
            1.0
        };
        if !scale.is_finite() || scale < MIN_SCALE {
            return Err(RegistrationError::degenerate(format!(
                "vanishing scale {scale}"
            )));
        }

        let t = c1 - scale * (r * c0);

        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
        Ok(SimilarityTransform::new(
            rotation,
            Translation3::from(t),
            scale,
        ))
    }
}
