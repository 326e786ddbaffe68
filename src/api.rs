//! High-level API for correspondence filtering.
//!
//! These functions wire the default pipeline: Umeyama similarity estimation,
//! kd-tree nearest-neighbor consistency scoring, uniform sampling and
//! adaptive termination.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{RegistrationRansac, StopReason};
use crate::error::Result;
use crate::estimators::SimilarityEstimator;
use crate::models::SimilarityTransform;
use crate::neighborhood::KdTreeNeighborQuery;
use crate::scoring::NeighborConsistencyScoring;
use crate::settings::RansacParams;
use crate::types::{CorrespondenceSet, PointCloud};

/// Result of a registration run.
#[derive(Debug, Clone)]
pub struct RegistrationResult {
    /// Best transform found, refit on its inliers when `params.refine` is set.
    pub transform: Option<SimilarityTransform>,
    /// Positions of inlier correspondences.
    pub inliers: Vec<usize>,
    /// Number of inliers.
    pub support: usize,
    /// Number of iterations performed.
    pub iterations: usize,
    pub stop_reason: StopReason,
}

/// Filter `correspondences` between `source` and `target` with RANSAC.
///
/// # Arguments
/// * `source` - Cloud to be moved onto `target`
/// * `target` - Reference cloud
/// * `correspondences` - Candidate `(source, target)` index pairs
/// * `params` - RANSAC parameters
/// * `rng` - Random generator driving the sampler; seed it for reproducible runs
pub fn register_correspondences<R: Rng + ?Sized>(
    source: &PointCloud,
    target: &PointCloud,
    correspondences: &CorrespondenceSet,
    params: &RansacParams,
    rng: &mut R,
) -> Result<RegistrationResult> {
    let scoring =
        NeighborConsistencyScoring::new(KdTreeNeighborQuery::new(), params.inlier_threshold);
    let mut ransac =
        RegistrationRansac::with_defaults(params.clone(), SimilarityEstimator::new(), scoring);

    let output = ransac.run(correspondences, source, target, rng)?;

    Ok(RegistrationResult {
        transform: output.model,
        inliers: output.inliers,
        support: output.support,
        iterations: output.iterations,
        stop_reason: output.stop_reason,
    })
}

/// Find the inlier correspondences between two clouds given as `N x 3`
/// matrices and two parallel index arrays (e.g. the matched rows and columns
/// of a descriptor cost matrix).
///
/// Returns the inlier positions and their count. With `seed == None` the
/// sampler is seeded from entropy.
pub fn find_inliers(
    source_points: &DMatrix<f64>,
    target_points: &DMatrix<f64>,
    source_indices: &[usize],
    target_indices: &[usize],
    params: &RansacParams,
    seed: Option<u64>,
) -> Result<(Vec<usize>, usize)> {
    let source = PointCloud::from_matrix(source_points)?;
    let target = PointCloud::from_matrix(target_points)?;
    let correspondences = CorrespondenceSet::from_index_arrays(source_indices, target_indices)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let result = register_correspondences(&source, &target, &correspondences, params, &mut rng)?;
    Ok((result.inliers, result.support))
}
