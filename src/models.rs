//! Transformation models produced by estimators.
//!
//! The RANSAC loop only needs to push points through a hypothesis, which is
//! what the [`Transform`] trait captures. [`SimilarityTransform`] is the
//! model produced by the bundled point-to-point estimator.

use nalgebra::{Matrix4, Point3, Translation3, UnitQuaternion};

/// Anything that maps a 3D point to a 3D point.
pub trait Transform {
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64>;
}

/// 3D similarity transform: `p' = scale * R * p + t`.
///
/// A rigid transform is the special case `scale == 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityTransform {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Translation3<f64>,
    pub scale: f64,
}

impl SimilarityTransform {
    pub fn new(rotation: UnitQuaternion<f64>, translation: Translation3<f64>, scale: f64) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    pub fn rigid(rotation: UnitQuaternion<f64>, translation: Translation3<f64>) -> Self {
        Self::new(rotation, translation, 1.0)
    }

    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Translation3::identity(), 1.0)
    }

    /// Homogeneous 4x4 matrix of the transform.
    pub fn to_matrix4(&self) -> Matrix4<f64> {
        let mut m = self.rotation.to_homogeneous();
        let mut linear = m.fixed_view_mut::<3, 3>(0, 0);
        linear *= self.scale;
        m.fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&self.translation.vector);
        m
    }
}

impl Transform for SimilarityTransform {
    fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let rotated = self.rotation * point.coords;
        Point3::from(rotated * self.scale + self.translation.vector)
    }
}
