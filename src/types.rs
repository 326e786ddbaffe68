//! Core shared types: point clouds and correspondence lists.
//!
//! Points are stored as `nalgebra::Point3<f64>`. Clouds and correspondence
//! sets are read-only for the whole duration of a RANSAC run; the only
//! "mutating" operations produce new values.

use nalgebra::{DMatrix, Point3};

use crate::error::{RegistrationError, Result};
use crate::models::Transform;

/// 3D point type used throughout the crate.
pub type Point = Point3<f64>;

/// Simple owned 3D point cloud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build a cloud from an `N x 3` matrix, one point per row.
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Result<Self> {
        if matrix.ncols() != 3 {
            return Err(RegistrationError::invalid(format!(
                "points must be Nx3 matrices, got {} columns",
                matrix.ncols()
            )));
        }
        let points = (0..matrix.nrows())
            .map(|i| Point::new(matrix[(i, 0)], matrix[(i, 1)], matrix[(i, 2)]))
            .collect();
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Apply `transform` to every point, returning a new cloud with the same
    /// indexing.
    pub fn transformed<T: Transform + ?Sized>(&self, transform: &T) -> PointCloud {
        PointCloud {
            points: self
                .points
                .iter()
                .map(|p| transform.transform_point(p))
                .collect(),
        }
    }

    /// Select a sub-cloud by index list, preserving the order of `indices`.
    pub fn select(&self, indices: &[usize]) -> Result<PointCloud> {
        let points = indices
            .iter()
            .map(|&i| {
                self.points.get(i).copied().ok_or_else(|| {
                    RegistrationError::invalid(format!(
                        "index {i} out of range for cloud of {} points",
                        self.points.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PointCloud { points })
    }
}

impl From<Vec<Point>> for PointCloud {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

/// A claimed pairing between one source point and one target point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Correspondence {
    /// Index into the source cloud.
    pub source: usize,
    /// Index into the target cloud.
    pub target: usize,
}

impl Correspondence {
    pub fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }
}

/// Immutable, ordered list of correspondences.
///
/// Positions in this list (not point indices) are what samples draw from and
/// what inlier sets report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorrespondenceSet {
    pairs: Vec<Correspondence>,
}

impl CorrespondenceSet {
    pub fn new(pairs: Vec<Correspondence>) -> Self {
        Self { pairs }
    }

    /// Zip two parallel index arrays (e.g. the row/column indices taken from
    /// a matching cost matrix) into a correspondence set.
    pub fn from_index_arrays(source: &[usize], target: &[usize]) -> Result<Self> {
        if source.len() != target.len() {
            return Err(RegistrationError::invalid(format!(
                "source indices ({}) and target indices ({}) differ in length",
                source.len(),
                target.len()
            )));
        }
        Ok(Self {
            pairs: source
                .iter()
                .zip(target)
                .map(|(&s, &t)| Correspondence::new(s, t))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Correspondence> {
        self.pairs.get(position)
    }

    pub fn as_slice(&self) -> &[Correspondence] {
        &self.pairs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Correspondence> {
        self.pairs.iter()
    }

    /// Check that every correspondence refers to an existing point in both
    /// clouds.
    pub fn check_bounds(&self, source_len: usize, target_len: usize) -> Result<()> {
        for (position, c) in self.pairs.iter().enumerate() {
            if c.source >= source_len {
                return Err(RegistrationError::invalid(format!(
                    "correspondence {position}: source point {} exceeds {source_len} points",
                    c.source
                )));
            }
            if c.target >= target_len {
                return Err(RegistrationError::invalid(format!(
                    "correspondence {position}: target point {} exceeds {target_len} points",
                    c.target
                )));
            }
        }
        Ok(())
    }

    /// Gather the source and target points of the correspondences at
    /// `positions`. Bounds must already have been checked.
    pub(crate) fn gather(
        &self,
        positions: &[usize],
        source: &PointCloud,
        target: &PointCloud,
        source_out: &mut Vec<Point>,
        target_out: &mut Vec<Point>,
    ) {
        source_out.clear();
        target_out.clear();
        for &p in positions {
            let c = self.pairs[p];
            source_out.push(source.points[c.source]);
            target_out.push(target.points[c.target]);
        }
    }
}

impl<'a> IntoIterator for &'a CorrespondenceSet {
    type Item = &'a Correspondence;
    type IntoIter = std::slice::Iter<'a, Correspondence>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SimilarityTransform;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    #[test]
    fn from_matrix_requires_three_columns() {
        let m = DMatrix::<f64>::zeros(4, 2);
        assert!(matches!(
            PointCloud::from_matrix(&m),
            Err(RegistrationError::InvalidParameters(_))
        ));

        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let cloud = PointCloud::from_matrix(&m).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.point(1), Some(&Point::new(4.0, 5.0, 6.0)));
    }

    #[test]
    fn select_preserves_order_and_rejects_bad_indices() {
        let cloud = PointCloud::new(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
        ]);
        let sub = cloud.select(&[2, 0]).unwrap();
        assert_eq!(sub.points(), &[cloud.points()[2], cloud.points()[0]]);
        assert!(cloud.select(&[3]).is_err());
    }

    #[test]
    fn transformed_keeps_indexing() {
        let cloud = PointCloud::new(vec![Point::new(1.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0)]);
        let shift = SimilarityTransform::new(
            UnitQuaternion::identity(),
            Translation3::new(1.0, 2.0, 3.0),
            2.0,
        );
        let moved = cloud.transformed(&shift);
        assert_eq!(moved.len(), 2);
        assert!((moved.points()[0].coords - Vector3::new(3.0, 2.0, 3.0)).norm() < 1e-12);
        assert!((moved.points()[1].coords - Vector3::new(1.0, 4.0, 3.0)).norm() < 1e-12);
    }

    #[test]
    fn index_arrays_must_match_in_length() {
        let set = CorrespondenceSet::from_index_arrays(&[0, 1, 2], &[2, 1, 0]).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(0), Some(&Correspondence::new(0, 2)));
        assert!(CorrespondenceSet::from_index_arrays(&[0, 1], &[0]).is_err());
    }

    #[test]
    fn check_bounds_reports_offending_side() {
        let set =
            CorrespondenceSet::new(vec![Correspondence::new(0, 0), Correspondence::new(5, 1)]);
        let err = set.check_bounds(3, 3).unwrap_err();
        assert!(err.to_string().contains("source point 5"));

        let set = CorrespondenceSet::new(vec![Correspondence::new(0, 7)]);
        let err = set.check_bounds(3, 3).unwrap_err();
        assert!(err.to_string().contains("target point 7"));

        assert!(set.check_bounds(1, 8).is_ok());
    }
}
