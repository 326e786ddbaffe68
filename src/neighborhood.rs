//! Nearest-neighbor queries used by support evaluation.

use kiddo::{ImmutableKdTree, SquaredEuclidean};

use crate::error::{RegistrationError, Result};
use crate::types::{Point, PointCloud};

/// Result of a nearest-neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the closest point in the candidate cloud.
    pub index: usize,
    /// Euclidean distance to that point.
    pub distance: f64,
}

/// Nearest-neighbor search over a candidate cloud.
///
/// The structure is (re)built once per hypothesis with
/// [`initialize`](NeighborQuery::initialize) and then queried once per
/// correspondence.
pub trait NeighborQuery {
    /// Build the search structure for `cloud`.
    ///
    /// Fails with [`RegistrationError::EmptyCloud`] if the cloud has no points.
    fn initialize(&mut self, cloud: &PointCloud) -> Result<()>;

    /// Closest point of the initialized cloud to `query`.
    ///
    /// Fails with [`RegistrationError::EmptyCloud`] if no non-empty cloud has
    /// been indexed.
    fn nearest(&self, query: &Point) -> Result<Neighbor>;
}

/// Exact kd-tree backed neighbor query.
///
/// The tree is built in one pass over the cloud with `kiddo`'s immutable
/// kd-tree, which accepts any number of points sharing a coordinate value
/// (flat scans, planar hypotheses).
#[derive(Default)]
pub struct KdTreeNeighborQuery {
    tree: Option<ImmutableKdTree<f64, 3>>,
}

impl KdTreeNeighborQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NeighborQuery for KdTreeNeighborQuery {
    fn initialize(&mut self, cloud: &PointCloud) -> Result<()> {
        self.tree = None;
        if cloud.is_empty() {
            return Err(RegistrationError::EmptyCloud);
        }
        let entries: Vec<[f64; 3]> = cloud.points().iter().map(|p| [p.x, p.y, p.z]).collect();
        self.tree = Some(ImmutableKdTree::new_from_slice(&entries));
        Ok(())
    }

    fn nearest(&self, query: &Point) -> Result<Neighbor> {
        let tree = self.tree.as_ref().ok_or(RegistrationError::EmptyCloud)?;
        let nearest = tree.nearest_one::<SquaredEuclidean>(&[query.x, query.y, query.z]);
        Ok(Neighbor {
            index: nearest.item as usize,
            distance: nearest.distance.sqrt(),
        })
    }
}

/// Linear-scan neighbor query. Ties resolve to the lowest index.
#[derive(Debug, Default, Clone)]
pub struct BruteForceNeighborQuery {
    points: Vec<Point>,
}

impl BruteForceNeighborQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NeighborQuery for BruteForceNeighborQuery {
    fn initialize(&mut self, cloud: &PointCloud) -> Result<()> {
        self.points.clear();
        if cloud.is_empty() {
            return Err(RegistrationError::EmptyCloud);
        }
        self.points.extend_from_slice(cloud.points());
        Ok(())
    }

    fn nearest(&self, query: &Point) -> Result<Neighbor> {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in self.points.iter().enumerate() {
            let d = (p - query).norm_squared();
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.map(|(index, d)| Neighbor {
            index,
            distance: d.sqrt(),
        })
        .ok_or(RegistrationError::EmptyCloud)
    }
}
