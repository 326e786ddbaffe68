//! Support evaluation for registration hypotheses.
//!
//! A correspondence supports a hypothesis when, after moving the whole source
//! cloud with the hypothesis, the nearest transformed source point to the
//! correspondence's target point is the correspondence's own source point.
//! In other words, the hypothesis recovers the claimed match.

use crate::core::Scoring;
use crate::error::{RegistrationError, Result};
use crate::models::Transform;
use crate::neighborhood::NeighborQuery;
use crate::types::{CorrespondenceSet, PointCloud};

/// Support score of a hypothesis: the number of consistent correspondences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    pub inlier_count: usize,
}

impl Score {
    pub fn new(inlier_count: usize) -> Self {
        Self { inlier_count }
    }
}

/// Nearest-neighbor consistency scoring.
///
/// With a `max_distance`, a correspondence must additionally have its
/// recovered neighbor within that distance of the target point, which helps
/// on noisy clouds where a wrong hypothesis can still recover isolated
/// matches by accident.
pub struct NeighborConsistencyScoring<Q: NeighborQuery> {
    neighbors: Q,
    max_distance: Option<f64>,
}

impl<Q: NeighborQuery> NeighborConsistencyScoring<Q> {
    pub fn new(neighbors: Q, max_distance: Option<f64>) -> Self {
        Self {
            neighbors,
            max_distance,
        }
    }

    pub fn max_distance(&self) -> Option<f64> {
        self.max_distance
    }
}

impl<M, Q> Scoring<M> for NeighborConsistencyScoring<Q>
where
    M: Transform,
    Q: NeighborQuery,
{
    fn score(
        &mut self,
        model: &M,
        source: &PointCloud,
        target: &PointCloud,
        correspondences: &CorrespondenceSet,
        inliers_out: &mut Vec<usize>,
    ) -> Result<Score> {
        inliers_out.clear();
        if correspondences.is_empty() {
            return Ok(Score::default());
        }

        let moved = source.transformed(model);
        self.neighbors.initialize(&moved)?;

        for (position, c) in correspondences.iter().enumerate() {
            let Some(target_point) = target.point(c.target) else {
                return Err(RegistrationError::invalid(format!(
                    "correspondence {position}: target point {} out of range for {} points",
                    c.target,
                    target.len()
                )));
            };
            let neighbor = self.neighbors.nearest(target_point)?;
            let within = self.max_distance.map_or(true, |d| neighbor.distance <= d);
            if neighbor.index == c.source && within {
                inliers_out.push(position);
            }
        }

        Ok(Score::new(inliers_out.len()))
    }
}
