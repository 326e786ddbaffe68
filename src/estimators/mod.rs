//! Transform estimators.
//!
//! Estimators turn a handful of paired points into a transform hypothesis.
//! The RANSAC loop reaches them through
//! [`TransformEstimator`](crate::core::TransformEstimator), so any closed-form
//! or iterative solver can be plugged in.

pub mod similarity;

pub use similarity::SimilarityEstimator;
